//! The live collection and its persistence.

use super::merge::{merge, MergeReport};
use crate::algebras::CollectionStore;
use crate::discovery::{stop_discovery, DiscoverySession};
use crate::error::{AppError, Result};
use crate::model::{Collection, Group, GroupStatus};
use crate::store::MemoryStore;
use crate::types::{GroupName, ParentLabel};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns the current collection snapshot and saves it after every change.
///
/// Every change replaces the whole snapshot under the lock and is then
/// written to the store while the lock is still held, so saves land in the
/// same order as changes. A failed save is logged and the collection keeps
/// going in memory.
pub struct CollectionManager {
    current: Mutex<Collection>,
    store: Arc<dyn CollectionStore>,
    /// False when an unreadable snapshot could not be moved aside; saving
    /// would overwrite it.
    saving: bool,
}

impl CollectionManager {
    /// Loads the stored snapshot, or starts empty when there is none or it
    /// cannot be read. An unreadable snapshot is moved aside first; if that
    /// fails, nothing is saved for the rest of the session. Groups that were
    /// running when the snapshot was taken come back stopped with their
    /// in-flight items pending again.
    pub async fn open(store: Arc<dyn CollectionStore>) -> Self {
        let mut saving = true;
        let loaded = match store.load().await {
            Ok(Some(collection)) => collection,
            Ok(None) => Collection::new(),
            Err(e) => {
                log::error!("Could not load saved collection, starting empty: {}", e);
                if let Err(e) = store.set_aside().await {
                    log::error!(
                        "Could not move the unreadable snapshot aside, changes will not be saved: {}",
                        e
                    );
                    saving = false;
                }
                Collection::new()
            }
        };

        let recovered = loaded.map_groups(recover_group);
        let manager = Self {
            current: Mutex::new(recovered.clone()),
            store,
            saving,
        };
        if recovered != loaded {
            log::info!("Recovered interrupted groups from the last run");
            manager.persist(&recovered).await;
        }
        log::debug!(
            "Collection opened with {} groups",
            recovered.group_count()
        );
        manager
    }

    /// A manager backed by process memory only.
    pub async fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStore::new())).await
    }

    pub async fn snapshot(&self) -> Collection {
        self.current.lock().await.clone()
    }

    /// Every group, labels in order.
    pub async fn groups(&self) -> Vec<Group> {
        self.current.lock().await.iter_groups().cloned().collect()
    }

    pub async fn group(&self, label: &ParentLabel, name: &GroupName) -> Result<Group> {
        self.current
            .lock()
            .await
            .group(label, name)
            .cloned()
            .ok_or_else(|| unknown_group(label, name))
    }

    /// Groups under `label`, sorted by name.
    pub async fn groups_under(&self, label: &ParentLabel) -> Result<Vec<Group>> {
        self.current
            .lock()
            .await
            .groups(label)
            .map(|groups| groups.iter().cloned().collect())
            .ok_or_else(|| AppError::UnknownLabel(label.to_string()))
    }

    /// Merges freshly ingested groups in and saves when anything changed.
    pub async fn import(&self, groups: Vec<Group>) -> MergeReport {
        let mut current = self.current.lock().await;
        let outcome = merge(&current, groups);
        if !outcome.report.is_unchanged() {
            *current = outcome.collection;
            self.persist(&current).await;
        }
        log::info!("Import: {}", outcome.report);
        outcome.report
    }

    /// Replaces the stored snapshot of an existing group.
    pub async fn commit(&self, group: Group) -> Result<()> {
        let mut current = self.current.lock().await;
        let next = current
            .with_group_replaced(group.clone())
            .ok_or_else(|| unknown_group(group.parent_label(), group.name()))?;
        if next != *current {
            *current = next;
            self.persist(&current).await;
        }
        Ok(())
    }

    /// Applies `f` to one group atomically and saves the result.
    pub async fn update_group(
        &self,
        label: &ParentLabel,
        name: &GroupName,
        f: impl FnOnce(Group) -> Group,
    ) -> Result<Group> {
        let mut current = self.current.lock().await;
        let group = current
            .group(label, name)
            .cloned()
            .ok_or_else(|| unknown_group(label, name))?;
        let updated = f(group);
        if let Some(next) = current.with_group_replaced(updated.clone()) {
            if next != *current {
                *current = next;
                self.persist(&current).await;
            }
        }
        Ok(updated)
    }

    /// Commits every snapshot a discovery session publishes, then its final
    /// group, and returns that final group. `on_update` sees each snapshot
    /// after it is committed.
    pub async fn track(
        &self,
        mut session: DiscoverySession,
        mut on_update: impl FnMut(&Group),
    ) -> Result<Group> {
        while let Some(snapshot) = session.next_update().await {
            self.commit(snapshot.clone()).await?;
            on_update(&snapshot);
        }
        let group = session.finish().await?;
        self.commit(group.clone()).await?;
        Ok(group)
    }

    /// Drops every group and clears the stored snapshot.
    pub async fn reset(&self) {
        let mut current = self.current.lock().await;
        *current = Collection::new();
        self.persist(&current).await;
        log::info!("Collection reset");
    }

    async fn persist(&self, collection: &Collection) {
        if !self.saving {
            log::debug!("Saving disabled, keeping changes in memory");
            return;
        }
        if let Err(e) = self.store.save(collection).await {
            log::error!("Failed to save collection, continuing in memory: {}", e);
        }
    }
}

fn recover_group(group: Group) -> Group {
    let group = group.normalized();
    if group.status() == GroupStatus::Running {
        log::warn!(
            "{} / {} was running when last saved; marking it stopped",
            group.parent_label(),
            group.name()
        );
        return stop_discovery(group);
    }
    group
}

fn unknown_group(label: &ParentLabel, name: &GroupName) -> AppError {
    AppError::UnknownGroup {
        label: label.to_string(),
        name: name.to_string(),
    }
}
