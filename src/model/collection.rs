//! All groups of a session, filed by parent label.

use super::group::Group;
use crate::types::{GroupName, ParentLabel};
use serde::{Deserialize, Serialize};

/// Parent label → groups under that label.
///
/// Labels are kept sorted by the `OrdMap`. Group order within a label is
/// whatever the last merge left (sorted by name). Replacing one group
/// shares every other label and group with the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    labels: im::OrdMap<ParentLabel, im::Vector<Group>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &ParentLabel> {
        self.labels.keys()
    }

    pub fn groups(&self, label: &ParentLabel) -> Option<&im::Vector<Group>> {
        self.labels.get(label)
    }

    pub fn group(&self, label: &ParentLabel, name: &GroupName) -> Option<&Group> {
        self.labels
            .get(label)
            .and_then(|groups| groups.iter().find(|g| g.name() == name))
    }

    /// Every group, labels in order.
    pub fn iter_groups(&self) -> impl Iterator<Item = &Group> {
        self.labels.values().flat_map(|groups| groups.iter())
    }

    pub fn group_count(&self) -> usize {
        self.labels.values().map(|groups| groups.len()).sum()
    }

    /// Swaps in a new snapshot of an existing group, keeping its position.
    /// Returns `None` when no group with that label and name exists.
    pub fn with_group_replaced(&self, group: Group) -> Option<Self> {
        let groups = self.labels.get(group.parent_label())?;
        let index = groups.iter().position(|g| g.name() == group.name())?;
        let mut groups = groups.clone();
        let label = group.parent_label().clone();
        groups.set(index, group);
        Some(Self {
            labels: self.labels.update(label, groups),
        })
    }

    /// Inserts or replaces the group list of a label.
    pub(crate) fn with_label(&self, label: ParentLabel, groups: im::Vector<Group>) -> Self {
        Self {
            labels: self.labels.update(label, groups),
        }
    }

    /// Applies `f` to every group, e.g. when recovering a loaded snapshot.
    pub(crate) fn map_groups(&self, f: impl Fn(Group) -> Group) -> Self {
        let labels = self
            .labels
            .iter()
            .map(|(label, groups)| {
                let groups: im::Vector<Group> = groups.iter().cloned().map(&f).collect();
                (label.clone(), groups)
            })
            .collect();
        Self { labels }
    }
}
