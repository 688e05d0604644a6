//! Pure group transitions.
//!
//! These are the only functions that change discovery state. Each takes a
//! group snapshot by value and returns the next one; none of them perform
//! I/O. The event loop in `orchestrator` and the CLI both go through here.

use crate::dedup::filter_new;
use crate::model::{ExtractedRecord, Group, GroupStatus, ItemEvent, ItemStatus};
use crate::types::PostalCode;

/// Starts or resumes discovery.
///
/// A group that never scanned anything, or whose items are all scanned,
/// starts over: every item pending and results cleared. Otherwise progress is
/// kept and only unscanned items are put back in line.
pub fn start_discovery(group: Group) -> Group {
    let finished = !group.items().is_empty() && group.all_scanned();

    let group = if finished || !group.has_scanned_any() {
        log::debug!("{}: starting fresh", group.name());
        group.restarted()
    } else {
        log::debug!(
            "{}: resuming with {} of {} scanned",
            group.name(),
            group.scanned_count(),
            group.items().len()
        );
        group.with_unscanned_requeued()
    };
    group.with_status(GroupStatus::Running)
}

/// Stops discovery. Items that look in flight go back to pending so a
/// later resume retries them cleanly. Calling it twice changes nothing.
pub fn stop_discovery(group: Group) -> Group {
    let group = group.with_active_requeued();
    if !group.items().is_empty() && group.all_scanned() {
        return group.with_status(GroupStatus::Completed);
    }
    group.with_status(GroupStatus::Stopped)
}

/// Puts a failed item back in line and marks the group running. Items in
/// any other status are left alone.
pub fn retry_item(group: Group, code: &PostalCode) -> Group {
    match group.item(code).map(|item| item.status) {
        Some(ItemStatus::Error) => {
            let (group, _) = group.with_item_event(code, ItemEvent::Requeue);
            group.with_status(GroupStatus::Running)
        }
        Some(status) => {
            log::debug!("{}: not retrying {} ({})", group.name(), code, status);
            group
        }
        None => {
            log::warn!("{}: no item {}", group.name(), code);
            group
        }
    }
}

/// Marks attempt `attempt` of `code` as started. Returns `false` when the
/// item cannot start that attempt in its current status.
pub(crate) fn begin_attempt(group: Group, code: &PostalCode, attempt: u32) -> (Group, bool) {
    group.with_item_event(code, ItemEvent::AttemptStarted { attempt })
}

/// Folds a successful attempt into the group. Returns the new group and
/// how many records survived deduplication. A result for an item that is
/// no longer in flight is discarded.
pub(crate) fn record_success(
    group: Group,
    code: &PostalCode,
    records: Vec<ExtractedRecord>,
) -> (Group, usize) {
    let (group, applied) = group.with_item_event(code, ItemEvent::Succeeded);
    if !applied {
        return (group, 0);
    }
    let survivors = filter_new(records, group.results());
    let kept = survivors.len();
    let group = group.with_results_appended(survivors).with_last_error(None);
    (group, kept)
}

/// Marks an item failed after its final attempt.
pub(crate) fn record_exhausted(group: Group, code: &PostalCode, error: &str) -> Group {
    let (group, applied) = group.with_item_event(code, ItemEvent::Exhausted);
    if !applied {
        return group;
    }
    group.with_last_error(Some(format!("Failed to scan {}: {}", code, error)))
}
