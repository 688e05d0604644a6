//! Attempt telemetry, injected into the orchestrator.

use crate::types::{GroupName, PostalCode, SessionId};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// What happened on one extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Started,
    Succeeded { returned: usize, kept: usize },
    Failed {
        error: String,
        /// Delay before the next attempt, `None` when attempts are exhausted.
        retry_in: Option<Duration>,
    },
    /// The group was stopped; whatever the call produced was thrown away.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptReport {
    pub session: SessionId,
    pub group: GroupName,
    pub code: PostalCode,
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    pub at: DateTime<Utc>,
}

/// Receives a report for every attempt the orchestrator makes.
///
/// Called from the orchestrator's event loop; implementations must not
/// block.
pub trait AttemptObserver: Send + Sync {
    fn on_attempt(&self, report: &AttemptReport);
}

/// Writes attempt reports to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl AttemptObserver for LoggingObserver {
    fn on_attempt(&self, report: &AttemptReport) {
        let prefix = format!(
            "[{}] {} / {} attempt {}",
            report.session.short(),
            report.group,
            report.code,
            report.attempt
        );
        match &report.outcome {
            AttemptOutcome::Started => log::debug!("{}: started", prefix),
            AttemptOutcome::Succeeded { returned, kept } => {
                log::info!("{}: {} records, {} new", prefix, returned, kept)
            }
            AttemptOutcome::Failed {
                error,
                retry_in: Some(delay),
            } => log::warn!("{}: {} (retrying in {:?})", prefix, error, delay),
            AttemptOutcome::Failed {
                error,
                retry_in: None,
            } => log::error!("{}: {} (giving up)", prefix, error),
            AttemptOutcome::Discarded => log::debug!("{}: result discarded after stop", prefix),
        }
    }
}
