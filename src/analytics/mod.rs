// src/analytics/mod.rs
//! Progress measurement for groups.

use crate::model::{ExtractedRecord, Group, GroupStatus, ItemStatus};
use crate::types::PostalCode;
use serde::Serialize;

/// One item as shown to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemBadge {
    pub code: PostalCode,
    pub status: ItemStatus,
    pub label: &'static str,
}

/// Derived progress of a group.
///
/// Use this for status lines and listings; it never feeds back into
/// scheduling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProgress {
    pub scanned: usize,
    pub failed: usize,
    pub active: usize,
    pub total: usize,
    pub results: usize,
    pub status: GroupStatus,
    pub status_label: &'static str,
    pub badges: Vec<ItemBadge>,
}

impl GroupProgress {
    /// Scanned share of all items, 0.0 for an empty group.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.scanned as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round() as u8
    }
}

/// Measures a group snapshot.
pub fn measure_group(group: &Group) -> GroupProgress {
    let badges = group
        .items()
        .iter()
        .map(|item| ItemBadge {
            code: item.code.clone(),
            status: item.status,
            label: item.status.label(),
        })
        .collect();

    GroupProgress {
        scanned: group.scanned_count(),
        failed: group.count_with(ItemStatus::Error),
        active: group.active_count(),
        total: group.items().len(),
        results: group.result_count(),
        status: group.status(),
        status_label: group.status().label(),
        badges,
    }
}

/// One-line summary for terminal output, e.g.
/// `Maharashtra / Pune  [#####-----]  50% 2/4 scanned, 1 failed, 7 records (running)`.
pub fn progress_line(group: &Group) -> String {
    const WIDTH: usize = 10;
    let progress = measure_group(group);
    let filled = ((progress.fraction() * WIDTH as f64).round() as usize).min(WIDTH);

    let mut line = format!(
        "{} / {}  [{}{}] {:>3}% {}/{} scanned",
        group.parent_label(),
        group.name(),
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        progress.percent(),
        progress.scanned,
        progress.total
    );
    if progress.failed > 0 {
        line.push_str(&format!(", {} failed", progress.failed));
    }
    line.push_str(&format!(
        ", {} records ({})",
        progress.results, progress.status_label
    ));
    line
}

/// The records of a group in discovery order, ready to serialize.
pub fn export_records(group: &Group) -> Vec<ExtractedRecord> {
    group.results().iter().cloned().collect()
}
