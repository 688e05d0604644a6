// tests/common/mod.rs
//! Scripted extractors and helpers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use pinscan::{
    AttemptObserver, AttemptOutcome, AttemptReport, ExtractedRecord, ExtractionError, Extractor,
    Group, GroupName, ParentLabel, PostalCode,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn code(s: &str) -> PostalCode {
    PostalCode::parse(s).unwrap()
}

pub fn group(label: &str, name: &str, codes: &[&str]) -> Group {
    Group::new(
        ParentLabel::new(label).unwrap(),
        GroupName::new(name).unwrap(),
        codes.iter().map(|c| code(c)),
        100,
    )
}

pub fn record(name: &str, address: &str) -> ExtractedRecord {
    ExtractedRecord::new(name, address)
}

type Outcome = Result<Vec<ExtractedRecord>, ExtractionError>;

/// Answers from a per-code script; codes without a script (or with an
/// exhausted one) return no records. Every call sleeps for the code's
/// latency on the tokio clock.
#[derive(Default)]
pub struct ScriptedExtractor {
    scripts: Mutex<HashMap<PostalCode, VecDeque<Outcome>>>,
    always_fail: Mutex<Vec<PostalCode>>,
    latency: Mutex<HashMap<PostalCode, Duration>>,
    default_latency: Duration,
    calls: Mutex<HashMap<PostalCode, usize>>,
    known: Mutex<HashMap<PostalCode, Vec<Vec<String>>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new(default_latency: Duration) -> Self {
        Self {
            default_latency,
            ..Self::default()
        }
    }

    pub fn answer(self, c: &str, records: Vec<ExtractedRecord>) -> Self {
        self.scripts
            .lock()
            .entry(code(c))
            .or_default()
            .push_back(Ok(records));
        self
    }

    pub fn fail_once(self, c: &str) -> Self {
        self.scripts
            .lock()
            .entry(code(c))
            .or_default()
            .push_back(Err(ExtractionError::Service {
                status: 503,
                message: "unavailable".to_string(),
            }));
        self
    }

    pub fn always_fail(self, c: &str) -> Self {
        self.always_fail.lock().push(code(c));
        self
    }

    pub fn latency(self, c: &str, latency: Duration) -> Self {
        self.latency.lock().insert(code(c), latency);
        self
    }

    pub fn calls(&self, c: &str) -> usize {
        self.calls.lock().get(&code(c)).copied().unwrap_or(0)
    }

    /// Addresses the extractor was told about, one list per call.
    pub fn known_addresses(&self, c: &str) -> Vec<Vec<String>> {
        self.known.lock().get(&code(c)).cloned().unwrap_or_default()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, code: &PostalCode, known: &[ExtractedRecord]) -> Outcome {
        *self.calls.lock().entry(code.clone()).or_default() += 1;
        self.known
            .lock()
            .entry(code.clone())
            .or_default()
            .push(known.iter().map(|r| r.address.clone()).collect());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self
            .latency
            .lock()
            .get(code)
            .copied()
            .unwrap_or(self.default_latency);
        tokio::time::sleep(latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.always_fail.lock().contains(code) {
            return Err(ExtractionError::Transport {
                message: format!("connection reset while scanning {}", code),
            });
        }
        self.scripts
            .lock()
            .get_mut(code)
            .and_then(|script| script.pop_front())
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Panics on every call.
pub struct PanickingExtractor;

#[async_trait]
impl Extractor for PanickingExtractor {
    async fn extract(&self, code: &PostalCode, _known: &[ExtractedRecord]) -> Outcome {
        panic!("extractor bug while scanning {}", code);
    }
}

/// Keeps every attempt report.
#[derive(Default)]
pub struct RecordingObserver {
    reports: Mutex<Vec<AttemptReport>>,
}

impl RecordingObserver {
    pub fn outcomes_for(&self, c: &str) -> Vec<(u32, AttemptOutcome)> {
        let c = code(c);
        self.reports
            .lock()
            .iter()
            .filter(|r| r.code == c)
            .map(|r| (r.attempt, r.outcome.clone()))
            .collect()
    }
}

impl AttemptObserver for RecordingObserver {
    fn on_attempt(&self, report: &AttemptReport) {
        self.reports.lock().push(report.clone());
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
