//! Upload worker: the single consumer of the upload queue.
//!
//! Drives each dequeued artifact through the full pipeline — dedup gate,
//! stability wait, connect, authenticate, folder provisioning, remote
//! existence check, transfer, cleanup — short-circuiting on the first
//! failure. Recoverable failures requeue the artifact; the loop itself
//! never terminates except when the account turns out to use the legacy
//! two-step scheme, which has no recovery path.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use tokio::time::sleep;

use crate::constants::{
    FILE_SETTLE_DELAY_SECS, FOLDER_CREATION_DELAY_SECS, MAX_FOLDER_RETRIES, RETRY_DELAY_SECS,
    STABILITY_WINDOW_SECS, TWO_FACTOR_POLL_SECS, TWO_FACTOR_TIMEOUT_SECS,
};
use crate::models::Credentials;
use crate::queue::{QueueReceiver, UploadQueue};
use crate::remote::drive::DriveClient;
use crate::remote::session::{self, AuthOutcome, RemoteSession};
use crate::status::AuthStatus;
use crate::store::BackupStore;

/// Delay and retry knobs for the pipeline.
///
/// First-class configuration rather than buried constants so that tests
/// can run the whole state machine with millisecond values.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Sleep before the stability check of a freshly dequeued artifact
    pub settle_delay: Duration,
    /// Window between the two size probes of the stability check
    pub stability_window: Duration,
    /// Backoff applied to connect/authenticate/folder failures
    pub retry_delay: Duration,
    /// Delay after folder creation and between visibility polls
    pub folder_creation_delay: Duration,
    /// Visibility polls after folder creation before giving up
    pub max_folder_retries: usize,
    /// Hard limit on waiting for a 2FA code
    pub two_factor_timeout: Duration,
    /// Cadence of 2FA code slot polls
    pub two_factor_poll: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(FILE_SETTLE_DELAY_SECS),
            stability_window: Duration::from_secs(STABILITY_WINDOW_SECS),
            retry_delay: Duration::from_secs(RETRY_DELAY_SECS),
            folder_creation_delay: Duration::from_secs(FOLDER_CREATION_DELAY_SECS),
            max_folder_retries: MAX_FOLDER_RETRIES,
            two_factor_timeout: Duration::from_secs(TWO_FACTOR_TIMEOUT_SECS),
            two_factor_poll: Duration::from_secs(TWO_FACTOR_POLL_SECS),
        }
    }
}

/// What one pipeline pass decided about an artifact.
enum StepOutcome {
    /// Terminal for this pass: uploaded, deduplicated, or dropped
    Done,
    /// Put the artifact back on the queue after the given delay
    Requeue(Duration),
    /// Unrecoverable configuration error; the process must exit
    Fatal(String),
}

/// The single long-lived upload worker.
///
/// Holds the one live [`RemoteSession`] across artifacts so each file does
/// not pay for a fresh connect/authenticate round trip.
pub struct UploadWorker {
    client: Arc<dyn DriveClient>,
    store: BackupStore,
    credentials: Credentials,
    folder_name: String,
    delete_after_upload: bool,
    status: Arc<AuthStatus>,
    policy: RetryPolicy,
    queue: UploadQueue,
    rx: QueueReceiver,
    session: Option<RemoteSession>,
    processed: HashSet<String>,
}

impl UploadWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<dyn DriveClient>,
        store: BackupStore,
        credentials: Credentials,
        folder_name: String,
        delete_after_upload: bool,
        status: Arc<AuthStatus>,
        policy: RetryPolicy,
        queue: UploadQueue,
        rx: QueueReceiver,
    ) -> Self {
        Self {
            client,
            store,
            credentials,
            folder_name,
            delete_after_upload,
            status,
            policy,
            queue,
            rx,
            session: None,
            processed: HashSet::new(),
        }
    }

    /// Consume the queue until shutdown.
    ///
    /// Returns `Err` only for the fatal legacy-two-step path; every other
    /// failure is absorbed, logged, and retried. `Ok` means all queue
    /// senders were dropped, which only happens at shutdown.
    pub async fn run(mut self) -> Result<()> {
        info!("Upload worker started");

        while let Some(filename) = self.rx.recv().await {
            match self.process_artifact(&filename).await {
                Ok(StepOutcome::Done) => {}
                Ok(StepOutcome::Requeue(delay)) => {
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    self.queue.requeue(filename);
                }
                Ok(StepOutcome::Fatal(reason)) => {
                    error!("{}", reason);
                    return Err(anyhow!(reason));
                }
                Err(e) => {
                    warn!("Upload worker error for {}: {:#}", filename, e);
                    sleep(self.policy.retry_delay).await;
                    self.queue.requeue(filename);
                }
            }
        }

        info!("Upload worker stopping: queue closed");
        Ok(())
    }

    /// One pipeline pass over a single artifact.
    async fn process_artifact(&mut self, filename: &str) -> Result<StepOutcome> {
        // Dedup gate
        if self.processed.contains(filename) {
            debug!("Skipping already-processed artifact: {}", filename);
            return Ok(StepOutcome::Done);
        }

        // Stability wait: the file may still be mid-write
        sleep(self.policy.settle_delay).await;
        if !self
            .store
            .verify_stable(filename, self.policy.stability_window)
            .await
        {
            info!("File incomplete or missing: {}, re-queuing", filename);
            return Ok(StepOutcome::Requeue(Duration::ZERO));
        }

        info!("Processing: {}", filename);

        // Connect gate
        let session = match self.session.take() {
            Some(session) => session,
            None => match session::connect(self.client.as_ref(), &self.credentials).await {
                Ok(session) => session,
                Err(e) => {
                    warn!("Remote connection failed, retrying: {:#}", e);
                    return Ok(StepOutcome::Requeue(self.policy.retry_delay));
                }
            },
        };

        // Authenticate gate
        match session
            .authenticate(
                &self.status,
                self.policy.two_factor_timeout,
                self.policy.two_factor_poll,
            )
            .await
        {
            AuthOutcome::Authenticated => {}
            AuthOutcome::RetryLater => {
                self.session = Some(session);
                warn!("Authentication failed, retrying...");
                return Ok(StepOutcome::Requeue(self.policy.retry_delay));
            }
            AuthOutcome::LegacyTwoStep => {
                return Ok(StepOutcome::Fatal(
                    "Legacy two-step authentication is not supported; enable device-code \
                     two-factor authentication for this account"
                        .to_string(),
                ));
            }
        }

        // Folder gate; adopt whatever handle comes back
        let (folder_ok, session) = session
            .ensure_folder(
                self.client.as_ref(),
                &self.credentials,
                &self.folder_name,
                self.policy.folder_creation_delay,
                self.policy.max_folder_retries,
            )
            .await;
        self.session = session;
        if !folder_ok {
            warn!("Folder check failed, retrying...");
            return Ok(StepOutcome::Requeue(self.policy.retry_delay));
        }
        let session = match self.session.as_ref() {
            Some(session) => session,
            None => {
                warn!("Session lost during folder provisioning, retrying...");
                return Ok(StepOutcome::Requeue(self.policy.retry_delay));
            }
        };

        // Existence gate: the remote listing is the dedup source of truth
        if session.file_exists(&self.folder_name, filename).await {
            info!("Skipping upload - file already exists remotely: {}", filename);
            self.processed.insert(filename.to_string());
            return Ok(StepOutcome::Done);
        }

        // Transfer + cleanup
        let local_path = self.store.path_for(filename);
        if session
            .upload_backup(&self.folder_name, filename, &local_path)
            .await
        {
            self.processed.insert(filename.to_string());
            if self.delete_after_upload {
                self.store.delete(filename).await;
            }
            info!("Completed: {}", filename);
        } else {
            // Terminal for this process lifetime; the local file remains
            // for the reconciliation poller to rediscover.
            warn!("Upload failed: {}", filename);
        }

        Ok(StepOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retry_delay, Duration::from_secs(RETRY_DELAY_SECS));
        assert_eq!(
            policy.settle_delay,
            Duration::from_secs(FILE_SETTLE_DELAY_SECS)
        );
        assert_eq!(policy.max_folder_retries, MAX_FOLDER_RETRIES);
        assert_eq!(
            policy.two_factor_timeout,
            Duration::from_secs(TWO_FACTOR_TIMEOUT_SECS)
        );
    }
}
