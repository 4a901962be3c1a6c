use pinhole_core::UrlStore;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug)]
struct Batch {
    user_id: String,
    short_ids: Vec<String>,
}

/// Asynchronous, best-effort deletion of user URLs.
///
/// `submit` returns immediately; the transport has already answered the
/// caller by the time the tombstones land. A single background worker
/// consumes batches and issues one `delete_for_user` per batch — the
/// store serializes writes anyway, so splitting a batch across workers
/// would change nothing observable. Store errors are logged and dropped:
/// deletion is at-most-once, with no retry queue and no way to notify a
/// caller that is long gone.
pub struct DeletionQueue {
    tx: parking_lot::Mutex<Option<mpsc::UnboundedSender<Batch>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DeletionQueue {
    /// Spawns the worker against the given store.
    pub fn new(store: Arc<dyn UrlStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(rx, store));

        Self {
            tx: parking_lot::Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueues a deletion batch and returns without waiting for it to
    /// be applied. Batches submitted after shutdown are dropped with a
    /// warning.
    pub fn submit(&self, user_id: impl Into<String>, short_ids: Vec<String>) {
        let batch = Batch {
            user_id: user_id.into(),
            short_ids,
        };

        let sent = self
            .tx
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(batch).is_ok());

        if !sent {
            warn!("deletion queue is shut down; batch dropped");
        }
    }

    /// Stops accepting batches and waits for the worker to drain what is
    /// already queued. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.tx.lock().take();

        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(err) = worker.await {
                error!(%err, "deletion worker panicked");
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<Batch>, store: Arc<dyn UrlStore>) {
    while let Some(batch) = rx.recv().await {
        match store
            .delete_for_user(&batch.user_id, &batch.short_ids)
            .await
        {
            Ok(()) => info!(
                user_id = %batch.user_id,
                count = batch.short_ids.len(),
                "user urls tombstoned"
            ),
            // Best effort by design: the caller was answered long ago.
            Err(err) => error!(
                user_id = %batch.user_id,
                count = batch.short_ids.len(),
                %err,
                "failed to delete user urls"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinhole_storage::MemoryStore;

    #[tokio::test]
    async fn submitted_batch_is_applied_after_drain() {
        let store: Arc<dyn UrlStore> = Arc::new(MemoryStore::new());
        store
            .add_for_user("abc12345", "https://example.com", "user-1")
            .await
            .unwrap();

        let queue = DeletionQueue::new(Arc::clone(&store));
        queue.submit("user-1", vec!["abc12345".to_owned()]);
        queue.shutdown().await;

        assert!(store.get("abc12345").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn batches_for_other_owners_leave_records_alone() {
        let store: Arc<dyn UrlStore> = Arc::new(MemoryStore::new());
        store
            .add_for_user("abc12345", "https://example.com", "user-b")
            .await
            .unwrap();

        let queue = DeletionQueue::new(Arc::clone(&store));
        queue.submit("user-a", vec!["abc12345".to_owned()]);
        queue.shutdown().await;

        assert!(store.get("abc12345").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_dropped() {
        let store: Arc<dyn UrlStore> = Arc::new(MemoryStore::new());
        store
            .add_for_user("abc12345", "https://example.com", "user-1")
            .await
            .unwrap();

        let queue = DeletionQueue::new(Arc::clone(&store));
        queue.shutdown().await;
        queue.submit("user-1", vec!["abc12345".to_owned()]);

        assert!(store.get("abc12345").await.unwrap().is_some());
    }
}
