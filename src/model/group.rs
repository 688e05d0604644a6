//! A named group of postal codes and its accumulated discovery results.
//!
//! `Group` is a persistent value: every change returns a new group and
//! leaves the original untouched. Items and results live in `im::Vector`,
//! so a new snapshot shares all unchanged structure with the previous one
//! and cloning a group to hand it to a reader is cheap.

use super::item::{ItemEvent, ItemStatus, WorkItem};
use super::record::ExtractedRecord;
use crate::types::{GroupName, ParentLabel, PostalCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Aggregate discovery state of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Idle,
    Running,
    Stopped,
    Completed,
    Error,
}

impl GroupStatus {
    pub fn label(self) -> &'static str {
        match self {
            GroupStatus::Idle => "idle",
            GroupStatus::Running => "running",
            GroupStatus::Stopped => "stopped",
            GroupStatus::Completed => "completed",
            GroupStatus::Error => "error",
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    name: GroupName,
    parent_label: ParentLabel,
    items: im::Vector<WorkItem>,
    status: GroupStatus,
    results: im::Vector<ExtractedRecord>,
    result_count: usize,
    weight: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

impl Group {
    /// Creates an idle group with every code pending. Duplicate codes are
    /// dropped, keeping the first occurrence.
    pub fn new(
        parent_label: ParentLabel,
        name: GroupName,
        codes: impl IntoIterator<Item = PostalCode>,
        weight: u64,
    ) -> Self {
        let mut seen = HashSet::new();
        let items = codes
            .into_iter()
            .filter(|code| seen.insert(code.clone()))
            .map(WorkItem::pending)
            .collect();

        Self {
            name,
            parent_label,
            items,
            status: GroupStatus::Idle,
            results: im::Vector::new(),
            result_count: 0,
            weight,
            last_error: None,
        }
    }

    // --- Read access ---

    pub fn name(&self) -> &GroupName {
        &self.name
    }

    pub fn parent_label(&self) -> &ParentLabel {
        &self.parent_label
    }

    pub fn items(&self) -> &im::Vector<WorkItem> {
        &self.items
    }

    pub fn status(&self) -> GroupStatus {
        self.status
    }

    pub fn results(&self) -> &im::Vector<ExtractedRecord> {
        &self.results
    }

    pub fn result_count(&self) -> usize {
        self.result_count
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn item(&self, code: &PostalCode) -> Option<&WorkItem> {
        self.items.iter().find(|item| &item.code == code)
    }

    pub fn contains(&self, code: &PostalCode) -> bool {
        self.item(code).is_some()
    }

    /// Items with an attempt (or backoff) outstanding.
    pub fn active_count(&self) -> usize {
        self.items.iter().filter(|i| i.status.is_active()).count()
    }

    pub fn scanned_count(&self) -> usize {
        self.items.iter().filter(|i| i.status.is_scanned()).count()
    }

    pub fn count_with(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    pub fn all_scanned(&self) -> bool {
        self.items.iter().all(|i| i.status.is_scanned())
    }

    pub fn has_scanned_any(&self) -> bool {
        self.items.iter().any(|i| i.status.is_scanned())
    }

    // --- Transitions (each returns a new snapshot) ---

    pub(crate) fn with_status(self, status: GroupStatus) -> Self {
        Self { status, ..self }
    }

    pub(crate) fn with_last_error(self, last_error: Option<String>) -> Self {
        Self { last_error, ..self }
    }

    pub(crate) fn with_weight(self, weight: u64) -> Self {
        Self { weight, ..self }
    }

    /// Applies `event` to the item with `code`. Unknown codes and invalid
    /// transitions leave the group unchanged and are reported as `false`.
    pub(crate) fn with_item_event(self, code: &PostalCode, event: ItemEvent) -> (Self, bool) {
        let Some(index) = self.items.iter().position(|item| &item.code == code) else {
            return (self, false);
        };
        let current = self.items[index].status;
        match current.apply(event) {
            Some(next) => {
                let mut items = self.items.clone();
                items.set(
                    index,
                    WorkItem {
                        code: code.clone(),
                        status: next,
                    },
                );
                (Self { items, ..self }, true)
            }
            None => (self, false),
        }
    }

    /// Requeues every item that is not scanned.
    pub(crate) fn with_unscanned_requeued(self) -> Self {
        let items = self
            .items
            .iter()
            .map(|item| match item.status.apply(ItemEvent::Requeue) {
                Some(status) if status != item.status => WorkItem {
                    code: item.code.clone(),
                    status,
                },
                _ => item.clone(),
            })
            .collect();
        Self { items, ..self }
    }

    /// Requeues only items that look in flight.
    pub(crate) fn with_active_requeued(self) -> Self {
        if self.active_count() == 0 {
            return self;
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.status.is_active() {
                    WorkItem::pending(item.code.clone())
                } else {
                    item.clone()
                }
            })
            .collect();
        Self { items, ..self }
    }

    /// Every item pending, results cleared. Used for a fresh run.
    pub(crate) fn restarted(self) -> Self {
        let items = self
            .items
            .iter()
            .map(|item| WorkItem::pending(item.code.clone()))
            .collect();
        Self {
            items,
            results: im::Vector::new(),
            result_count: 0,
            last_error: None,
            ..self
        }
    }

    /// Appends records, keeping `result_count` in step with `results`.
    pub(crate) fn with_results_appended(self, records: Vec<ExtractedRecord>) -> Self {
        if records.is_empty() {
            return self;
        }
        let mut results = self.results;
        results.extend(records);
        let result_count = results.len();
        Self {
            results,
            result_count,
            ..self
        }
    }

    /// Appends codes not yet present, as pending items. Returns how many
    /// were added.
    pub(crate) fn with_codes_added(
        self,
        codes: impl IntoIterator<Item = PostalCode>,
    ) -> (Self, usize) {
        let mut seen: HashSet<PostalCode> = self.items.iter().map(|i| i.code.clone()).collect();
        let mut items = self.items.clone();
        let mut added = 0;
        for code in codes {
            if seen.insert(code.clone()) {
                items.push_back(WorkItem::pending(code));
                added += 1;
            }
        }
        (Self { items, ..self }, added)
    }

    /// Restores the derived invariants of a snapshot read from storage.
    pub(crate) fn normalized(self) -> Self {
        let result_count = self.results.len();
        Self {
            result_count,
            ..self
        }
    }
}
