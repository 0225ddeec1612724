use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::model::{COLLECTIONS, CollectionView};
use super::repository::GalleryRepository;

/// Latest known state of one user's gallery.
#[derive(Debug, Clone, PartialEq)]
pub enum GallerySnapshot {
    Loading,
    Ready(Vec<CollectionView>),
    /// The subscription stopped after a read error.
    Failed(String),
}

/// Live view of a user's collection tree.
///
/// Every change under `collections` triggers a full reload of the tree.
/// Dropping the watch stops the background task.
pub struct GalleryWatch {
    receiver: watch::Receiver<GallerySnapshot>,
    task: JoinHandle<()>,
}

impl GalleryWatch {
    pub fn current(&self) -> GallerySnapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot. `None` once the watch has stopped and
    /// every snapshot has been seen.
    pub async fn changed(&mut self) -> Option<GallerySnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl Drop for GalleryWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl GalleryRepository {
    pub fn watch(&self, owner_name: &str) -> GalleryWatch {
        let (tx, receiver) = watch::channel(GallerySnapshot::Loading);
        // Subscribe before the first read so no write falls in between.
        let mut changes = self.documents().subscribe();
        let repo = self.clone();
        let owner = owner_name.to_string();

        let task = tokio::spawn(async move {
            loop {
                match repo.load_tree(&owner).await {
                    Ok(tree) => {
                        if tx.send(GallerySnapshot::Ready(tree)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(owner = %owner, error = %e, "Gallery subscription failed");
                        let _ = tx.send(GallerySnapshot::Failed(e.to_string()));
                        return;
                    }
                }

                loop {
                    match changes.recv().await {
                        Ok(event) if event.path.collection().root_name() == COLLECTIONS => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Change feed lagged, reloading");
                            break;
                        }
                        Err(RecvError::Closed) => return,
                    }
                }
                // Coalesce a burst of writes into one reload.
                while changes.try_recv().is_ok() {}
            }
        });

        GalleryWatch { receiver, task }
    }
}
