//! Upload queue connecting the event producers to the single worker.
//!
//! An unbounded FIFO channel of artifact filenames. Producers (filesystem
//! watcher, reconciliation poller, startup scan) hold cloned senders; the
//! worker holds the only receiver plus a sender of its own for
//! requeue-on-failure, which appends to the tail so a stuck artifact does
//! not block the rest of the queue.

use log::{debug, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::models::DiscoverySource;

/// Multi-producer handle onto the upload queue.
#[derive(Clone)]
pub struct UploadQueue {
    tx: UnboundedSender<String>,
}

/// The single consumer end, owned by the upload worker.
pub struct QueueReceiver {
    rx: UnboundedReceiver<String>,
}

/// Create a connected queue handle/receiver pair.
pub fn upload_queue() -> (UploadQueue, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UploadQueue { tx }, QueueReceiver { rx })
}

impl UploadQueue {
    /// Enqueue an artifact filename.
    ///
    /// Safe to call from any thread, including the watcher's native
    /// notification thread. A send error means the worker is gone, which
    /// only happens during shutdown, so it is logged and swallowed.
    pub fn enqueue(&self, filename: String, source: DiscoverySource) {
        debug!("Enqueuing {} (source: {})", filename, source);
        if self.tx.send(filename).is_err() {
            warn!("Upload queue receiver dropped; discarding enqueue");
        }
    }

    /// Requeue an artifact after a recoverable failure (tail append).
    pub fn requeue(&self, filename: String) {
        if self.tx.send(filename).is_err() {
            warn!("Upload queue receiver dropped; discarding requeue");
        }
    }
}

impl QueueReceiver {
    /// Wait for the next artifact. Returns `None` only once every sender
    /// has been dropped.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
