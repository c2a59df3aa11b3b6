//! Local artifact store accessor.
//!
//! Lists backup artifacts in the watched directory, verifies that a file
//! has finished being written (size stable over a short window), and
//! performs best-effort cleanup after a confirmed upload. Listing and
//! deletion fail soft: the pipeline's correctness never depends on them
//! raising.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

/// Accessor for the directory holding local backup artifacts.
#[derive(Clone, Debug)]
pub struct BackupStore {
    root: PathBuf,
    extension: String,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a path carries the recognized backup extension.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.eq_ignore_ascii_case(self.extension.as_str()))
            .unwrap_or(false)
    }

    /// Absolute path for an artifact filename.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// List artifact filenames currently present, sorted for determinism.
    ///
    /// A directory read error is logged and yields an empty list.
    pub fn list_backups(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Error listing backups in {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| self.matches_extension(path))
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }

    /// Verify that an artifact has finished being written.
    ///
    /// Probes the file size, waits `window`, probes again; true only if the
    /// file still exists with an unchanged size. Disappearance or any I/O
    /// error counts as unstable.
    pub async fn verify_stable(&self, filename: &str, window: Duration) -> bool {
        let path = self.path_for(filename);

        let initial_size = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return false,
            Err(e) => {
                warn!("Error probing {}: {}", filename, e);
                return false;
            }
        };

        sleep(window).await;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                let stable = meta.len() == initial_size;
                if !stable {
                    debug!(
                        "{} grew from {} to {} bytes during stability window",
                        filename,
                        initial_size,
                        meta.len()
                    );
                }
                stable
            }
            Ok(_) => false,
            Err(e) => {
                warn!("Error re-probing {}: {}", filename, e);
                false
            }
        }
    }

    /// Delete an artifact after a confirmed upload. Best-effort; failure is
    /// logged, never raised.
    pub async fn delete(&self, filename: &str) {
        let path = self.path_for(filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!("Deleted local file: {}", filename),
            Err(e) => warn!("Failed to delete {}: {}", filename, e),
        }
    }
}
