//! A single postal code and its discovery lifecycle.

use crate::types::PostalCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one work item.
///
/// ```text
/// Pending ──attempt 1──▶ Scanning ──attempt 2..n──▶ Retrying
///    ▲                      │  │                      │  │
///    │                      │  └──────success─────────┼──┴──▶ Scanned
///    └──requeue── Error ◀───┴──────exhausted──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Scanning,
    Retrying,
    Scanned,
    Error,
}

/// Something that happened to a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEvent {
    /// The scheduler started attempt number `attempt` (1-based).
    AttemptStarted { attempt: u32 },
    /// An attempt returned records.
    Succeeded,
    /// The final permitted attempt failed.
    Exhausted,
    /// Put the item back in line: manual retry, stop, or resume.
    Requeue,
}

impl ItemStatus {
    /// Applies an event, returning the next status or `None` when the
    /// event is not valid in the current status.
    pub fn apply(self, event: ItemEvent) -> Option<ItemStatus> {
        use ItemEvent::*;
        use ItemStatus::*;

        match (self, event) {
            (Pending | Error, AttemptStarted { attempt: 1 }) => Some(Scanning),
            (Scanning | Retrying, AttemptStarted { attempt }) if attempt > 1 => Some(Retrying),
            (Scanning | Retrying, Succeeded) => Some(Scanned),
            (Scanning | Retrying, Exhausted) => Some(Error),
            (Scanned, Requeue) => None,
            (_, Requeue) => Some(Pending),
            _ => None,
        }
    }

    /// An attempt (or the backoff before the next one) is outstanding.
    pub fn is_active(self) -> bool {
        matches!(self, ItemStatus::Scanning | ItemStatus::Retrying)
    }

    /// The scheduler may pick this item up.
    pub fn is_eligible(self) -> bool {
        matches!(self, ItemStatus::Pending | ItemStatus::Error)
    }

    pub fn is_scanned(self) -> bool {
        self == ItemStatus::Scanned
    }

    /// Badge text for the presentation layer.
    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Scanning => "scanning",
            ItemStatus::Retrying => "retrying",
            ItemStatus::Scanned => "scanned",
            ItemStatus::Error => "error",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unit of scheduled work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub code: PostalCode,
    pub status: ItemStatus,
}

impl WorkItem {
    pub fn pending(code: PostalCode) -> Self {
        Self {
            code,
            status: ItemStatus::Pending,
        }
    }
}
