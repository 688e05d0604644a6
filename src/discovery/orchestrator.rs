//! Event-driven discovery loop for one group.
//!
//! Each running group gets one task that owns the group snapshot. The task
//! waits on three kinds of events: an extraction attempt settled, a backoff
//! timer elapsed, or a stop was requested. After every event it applies the
//! matching transition, publishes the new snapshot, and asks the scheduler
//! whether more work may start. Nothing polls.

use super::scheduler::{next_step, NextStep};
use super::session::DiscoverySession;
use super::transitions::{begin_attempt, record_exhausted, record_success, stop_discovery};
use crate::algebras::{
    AttemptObserver, AttemptOutcome, AttemptReport, ExtractionError, Extractor, LoggingObserver,
};
use crate::error_recovery::RetryPolicy;
use crate::model::{ExtractedRecord, Group, GroupStatus};
use crate::types::{PostalCode, SessionId};
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

/// Runs discovery sessions against an extractor.
///
/// Cheap to clone; sessions for different groups are independent and may
/// run concurrently.
#[derive(Clone)]
pub struct Orchestrator {
    extractor: Arc<dyn Extractor>,
    observer: Arc<dyn AttemptObserver>,
    policy: RetryPolicy,
}

impl Orchestrator {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self {
            extractor,
            observer: Arc::new(LoggingObserver),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_observer(self, observer: Arc<dyn AttemptObserver>) -> Self {
        Self { observer, ..self }
    }

    pub fn with_policy(self, policy: RetryPolicy) -> Self {
        Self { policy, ..self }
    }

    /// Drives `group` on a new task. The group should already be running
    /// (see `start_discovery` and `retry_item`); any other status makes
    /// the session finish immediately with the group unchanged.
    pub fn spawn(&self, group: Group) -> DiscoverySession {
        let id = SessionId::new_v4();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let run = GroupRun {
            session: id,
            extractor: Arc::clone(&self.extractor),
            observer: Arc::clone(&self.observer),
            policy: self.policy,
            updates: update_tx,
            exhausted: HashSet::new(),
        };
        log::info!(
            "[{}] Discovery for {} / {} ({} items)",
            id.short(),
            group.parent_label(),
            group.name(),
            group.items().len()
        );
        let handle = tokio::spawn(run.drive(group, stop_rx));

        DiscoverySession::new(id, stop_tx, update_rx, handle)
    }
}

enum Event {
    AttemptSettled {
        code: PostalCode,
        attempt: u32,
        result: Result<Vec<ExtractedRecord>, ExtractionError>,
    },
    BackoffElapsed {
        code: PostalCode,
        next_attempt: u32,
    },
}

/// State owned by the task driving one group.
struct GroupRun {
    session: SessionId,
    extractor: Arc<dyn Extractor>,
    observer: Arc<dyn AttemptObserver>,
    policy: RetryPolicy,
    updates: mpsc::UnboundedSender<Group>,
    /// Codes that used up their attempts during this run.
    exhausted: HashSet<PostalCode>,
}

impl GroupRun {
    async fn drive(mut self, group: Group, mut stop: watch::Receiver<bool>) -> Group {
        let mut calls: JoinSet<Event> = JoinSet::new();
        let mut timers: JoinSet<Event> = JoinSet::new();
        let mut stop_open = true;

        let mut group = self.schedule(group, &mut calls);

        while group.status() == GroupStatus::Running {
            if *stop.borrow() {
                return self.halt(group, &mut calls, &mut timers);
            }

            let joined = tokio::select! {
                biased;
                changed = stop.changed(), if stop_open => {
                    if changed.is_err() {
                        // Session handle dropped: nobody can stop us any more.
                        stop_open = false;
                    }
                    continue;
                }
                Some(joined) = calls.join_next() => joined,
                Some(joined) = timers.join_next() => joined,
                else => {
                    log::error!(
                        "[{}] {} is running with no outstanding work",
                        self.session.short(),
                        group.name()
                    );
                    group = stop_discovery(group);
                    self.publish(&group);
                    break;
                }
            };

            let event = match joined {
                Ok(event) => event,
                Err(e) => {
                    log::error!("[{}] Discovery task failed: {}", self.session.short(), e);
                    continue;
                }
            };

            if *stop.borrow() {
                return self.halt(group, &mut calls, &mut timers);
            }

            group = self.handle(group, event, &mut calls, &mut timers);
            group = self.schedule(group, &mut calls);
        }

        log::info!(
            "[{}] {} / {} finished: {} ({}/{} scanned, {} records)",
            self.session.short(),
            group.parent_label(),
            group.name(),
            group.status(),
            group.scanned_count(),
            group.items().len(),
            group.result_count()
        );
        group
    }

    fn handle(
        &mut self,
        group: Group,
        event: Event,
        calls: &mut JoinSet<Event>,
        timers: &mut JoinSet<Event>,
    ) -> Group {
        match event {
            Event::AttemptSettled {
                code,
                attempt,
                result: Ok(records),
            } => {
                let returned = records.len();
                let (group, kept) = record_success(group, &code, records);
                self.report(&group, &code, attempt, AttemptOutcome::Succeeded { returned, kept });
                self.publish(&group);
                group
            }
            Event::AttemptSettled {
                code,
                attempt,
                result: Err(error),
            } => match self.policy.delay_after(attempt) {
                Some(delay) => {
                    self.report(
                        &group,
                        &code,
                        attempt,
                        AttemptOutcome::Failed {
                            error: error.to_string(),
                            retry_in: Some(delay),
                        },
                    );
                    let next_attempt = attempt + 1;
                    timers.spawn(async move {
                        tokio::time::sleep(delay).await;
                        Event::BackoffElapsed { code, next_attempt }
                    });
                    group
                }
                None => {
                    let group = record_exhausted(group, &code, &error.to_string());
                    self.exhausted.insert(code.clone());
                    self.report(
                        &group,
                        &code,
                        attempt,
                        AttemptOutcome::Failed {
                            error: error.to_string(),
                            retry_in: None,
                        },
                    );
                    self.publish(&group);
                    group
                }
            },
            Event::BackoffElapsed { code, next_attempt } => {
                self.launch(group, code, next_attempt, calls)
            }
        }
    }

    /// Starts work until the scheduler says wait, then settles the group
    /// if nothing is left to do.
    fn schedule(&mut self, mut group: Group, calls: &mut JoinSet<Event>) -> Group {
        loop {
            match next_step(&group, self.policy.concurrency, &self.exhausted) {
                NextStep::Start(code) => {
                    let before = group.active_count();
                    group = self.launch(group, code, 1, calls);
                    if group.active_count() == before {
                        // Could not start; avoid spinning on the same item.
                        return group;
                    }
                }
                NextStep::Wait | NextStep::Halt => return group,
                NextStep::Complete => {
                    let group = group.with_status(GroupStatus::Completed);
                    self.publish(&group);
                    return group;
                }
                NextStep::Stalled => {
                    let group = group.with_status(GroupStatus::Error);
                    self.publish(&group);
                    return group;
                }
            }
        }
    }

    /// Marks the attempt started and sends the extraction call.
    fn launch(
        &self,
        group: Group,
        code: PostalCode,
        attempt: u32,
        calls: &mut JoinSet<Event>,
    ) -> Group {
        let (group, started) = begin_attempt(group, &code, attempt);
        if !started {
            log::warn!(
                "[{}] {} cannot start attempt {} from its current status",
                self.session.short(),
                code,
                attempt
            );
            return group;
        }
        self.report(&group, &code, attempt, AttemptOutcome::Started);
        self.publish(&group);

        let known: Vec<ExtractedRecord> = group.results().iter().cloned().collect();
        let extractor = Arc::clone(&self.extractor);
        calls.spawn(async move {
            let result = AssertUnwindSafe(extractor.extract(&code, &known))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(ExtractionError::Transport {
                        message: "extractor panicked".to_string(),
                    })
                });
            Event::AttemptSettled {
                code,
                attempt,
                result,
            }
        });
        group
    }

    /// Applies a stop: pending timers are dropped, in-flight calls keep
    /// running detached and their results are never applied.
    fn halt(&self, group: Group, calls: &mut JoinSet<Event>, timers: &mut JoinSet<Event>) -> Group {
        timers.abort_all();
        calls.detach_all();

        for item in group.items().iter().filter(|i| i.status.is_active()) {
            self.report(&group, &item.code, 0, AttemptOutcome::Discarded);
        }

        let group = stop_discovery(group);
        self.publish(&group);
        log::info!(
            "[{}] {} / {} stopped with {}/{} scanned",
            self.session.short(),
            group.parent_label(),
            group.name(),
            group.scanned_count(),
            group.items().len()
        );
        group
    }

    fn publish(&self, group: &Group) {
        // A dropped receiver only means nobody is watching.
        let _ = self.updates.send(group.clone());
    }

    fn report(&self, group: &Group, code: &PostalCode, attempt: u32, outcome: AttemptOutcome) {
        self.observer.on_attempt(&AttemptReport {
            session: self.session,
            group: group.name().clone(),
            code: code.clone(),
            attempt,
            outcome,
            at: chrono::Utc::now(),
        });
    }
}
