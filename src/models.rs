use serde::{Serialize, Deserialize};

/// How an artifact first became known to the pipeline.
///
/// Carried for logging only; the worker treats all sources identically.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    /// Filesystem watcher saw the file appear
    Watch,
    /// Reconciliation poller matched an inventory record to a local file
    Reconcile,
    /// Startup scan of the backup directory
    StartupScan,
}

impl std::fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoverySource::Watch => write!(f, "watch"),
            DiscoverySource::Reconcile => write!(f, "reconcile"),
            DiscoverySource::StartupScan => write!(f, "startup-scan"),
        }
    }
}

/// Account credentials for the remote drive.
#[derive(Clone)]
pub struct Credentials {
    pub account: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("secret", &"<redacted>")
            .finish()
    }
}
