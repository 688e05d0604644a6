use crate::algebras::{CollectionStore, StoreError};
use crate::model::Collection;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Keeps the snapshot in process memory. Nothing survives a restart;
/// used for ephemeral sessions and tests.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<Collection>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `collection` already stored.
    pub fn with_snapshot(collection: Collection) -> Self {
        Self {
            snapshot: Mutex::new(Some(collection).filter(|c| !c.is_empty())),
            saves: Mutex::new(0),
        }
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load(&self) -> Result<Option<Collection>, StoreError> {
        Ok(self.snapshot.lock().clone())
    }

    async fn save(&self, collection: &Collection) -> Result<(), StoreError> {
        *self.saves.lock() += 1;
        *self.snapshot.lock() = Some(collection.clone()).filter(|c| !c.is_empty());
        Ok(())
    }
}
