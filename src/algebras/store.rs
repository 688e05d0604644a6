//! The persistence capability: one whole-collection snapshot.

use super::error::StoreError;
use crate::model::Collection;
use async_trait::async_trait;

/// Durable storage for the collection.
///
/// # Laws
///
/// - **L1 (Read-your-writes)**: after `save(c)` with a non-empty `c`,
///   `load()` returns `Some(c)`.
/// - **L2 (Empty clears)**: after `save(empty)`, `load()` returns `None`.
/// - **L3 (Absence is not failure)**: a store that never saw a snapshot
///   returns `Ok(None)`.
/// - **L4 (Unreadable is kept)**: after `load()` fails, `set_aside()` moves
///   the unreadable snapshot out of the way so later saves cannot
///   overwrite it.
///
/// This trait is **object-safe** and can be used as `dyn CollectionStore`.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Collection>, StoreError>;

    async fn save(&self, collection: &Collection) -> Result<(), StoreError>;

    /// Preserves a snapshot that failed to load. Stores with nothing on
    /// disk have nothing to keep.
    async fn set_aside(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Group;
    use crate::store::MemoryStore;
    use crate::types::{GroupName, ParentLabel, PostalCode};

    fn one_group() -> Collection {
        let group = Group::new(
            ParentLabel::new("Maharashtra").unwrap(),
            GroupName::new("Pune").unwrap(),
            vec![PostalCode::parse("411001").unwrap()],
            100,
        );
        crate::collection::merge(&Collection::new(), vec![group]).collection
    }

    #[tokio::test]
    async fn law_l1_read_your_writes() {
        let store = MemoryStore::new();
        let collection = one_group();
        store.save(&collection).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(collection));
    }

    #[tokio::test]
    async fn law_l2_empty_clears() {
        let store = MemoryStore::new();
        store.save(&one_group()).await.unwrap();
        store.save(&Collection::new()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn law_l3_absence_is_not_failure() {
        let store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
