//! Filesystem watcher producing upload events.
//!
//! Watches the backup directory (non-recursive) and enqueues the basename
//! of every newly created file carrying the backup extension. The notify
//! callback fires on the watcher's own native thread; the queue's sender
//! is the thread-safe bridge into the async runtime.

use anyhow::{Context, Result};
use log::{info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::models::DiscoverySource;
use crate::queue::UploadQueue;
use crate::store::BackupStore;

/// Start watching the store's directory for new backup artifacts.
///
/// The returned watcher must be kept alive for the lifetime of the
/// daemon; dropping it stops event delivery.
pub fn spawn_watcher(store: &BackupStore, queue: UploadQueue) -> Result<RecommendedWatcher> {
    let matcher = store.clone();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        match result {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_)) {
                    return;
                }
                for path in &event.paths {
                    if !matcher.matches_extension(path) {
                        continue;
                    }
                    if let Some(name) = path.file_name() {
                        let filename = name.to_string_lossy().into_owned();
                        info!("Backup file detected: {}", filename);
                        queue.enqueue(filename, DiscoverySource::Watch);
                    }
                }
            }
            Err(e) => warn!("Filesystem watch error: {}", e),
        }
    })
    .context("Failed to create filesystem watcher")?;

    watcher
        .watch(store.root(), RecursiveMode::NonRecursive)
        .context(format!(
            "Failed to watch backup directory {}",
            store.root().display()
        ))?;

    info!("Filesystem monitoring active on {}", store.root().display());
    Ok(watcher)
}
