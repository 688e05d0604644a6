//! Decides what a running group does next.

use crate::model::{Group, GroupStatus};
use crate::types::PostalCode;
use std::collections::HashSet;

/// The scheduler's answer for one evaluation of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// Begin the first attempt for this code.
    Start(PostalCode),
    /// At capacity, or nothing eligible while attempts are outstanding.
    Wait,
    /// Every item is scanned.
    Complete,
    /// Nothing eligible, nothing outstanding, and some items failed.
    Stalled,
    /// The group is not running.
    Halt,
}

/// Picks the next step for `group`.
///
/// Eligible items are pending or failed ones, in list order. `skip` holds
/// codes that already used up their attempts in this run; they stay failed
/// until the next start or a manual retry instead of looping forever.
pub fn next_step(group: &Group, concurrency: usize, skip: &HashSet<PostalCode>) -> NextStep {
    if group.status() != GroupStatus::Running {
        return NextStep::Halt;
    }

    let active = group.active_count();
    if active >= concurrency {
        return NextStep::Wait;
    }

    let eligible = group
        .items()
        .iter()
        .find(|item| item.status.is_eligible() && !skip.contains(&item.code));

    match eligible {
        Some(item) => NextStep::Start(item.code.clone()),
        None if active > 0 => NextStep::Wait,
        None if group.all_scanned() => NextStep::Complete,
        None => NextStep::Stalled,
    }
}
