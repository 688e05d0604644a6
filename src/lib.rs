// src/lib.rs
//! pinscan library: resumable, bounded-concurrency discovery of clinics by
//! postal code.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ExtractionError`, `StoreError`, `ValidationError`
//! - **Configuration**: `AppConfig`, `CommandLineInput`, `RetryPolicy`
//! - **Domain model**: `Collection`, `Group`, `WorkItem`, `ExtractedRecord`
//! - **Domain types**: `PostalCode`, `GroupName`, `ParentLabel`, `ApiKey`
//! - **Discovery**: transitions, the scheduler decision, `Orchestrator`
//! - **Collection**: `merge`, `CollectionManager`, stores
//! - **Extraction**: the `Extractor` capability and `GeminiExtractor`
//! - **Presentation**: progress, export planning and delivery

mod algebras;
mod analytics;
mod collection;
mod config;
mod constants;
mod dedup;
mod discovery;
mod error;
mod error_recovery;
mod extraction;
mod ingest;
mod model;
mod output;
mod store;
mod types;

// --- Error Handling ---
pub use crate::algebras::{ExtractionError, StoreError};
pub use crate::error::{AppError, Result};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    AppConfig, Command, CommandInput, CommandLineInput, ExtractionConfig, StoreLocation,
};
pub use crate::constants::{
    DEFAULT_STORE_FILE, DISCOVERY_CONCURRENCY_LIMIT, EXTRACTION_MAX_ATTEMPTS,
    EXTRACTION_RETRY_DELAY,
};
pub use crate::error_recovery::RetryPolicy;

// --- Domain Model ---
pub use crate::model::{
    Collection, ExtractedRecord, Group, GroupStatus, ItemEvent, ItemStatus, WorkItem,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, GroupName, ParentLabel, PostalCode, ServiceUrl, SessionId};

// --- Capability Traits ---
pub use crate::algebras::{
    AttemptObserver, AttemptOutcome, AttemptReport, CollectionStore, Extractor, LoggingObserver,
};

// --- Discovery ---
pub use crate::dedup::{filter_new, fingerprint};
pub use crate::discovery::{
    next_step, retry_item, start_discovery, stop_discovery, DiscoverySession, NextStep,
    Orchestrator, StopHandle,
};

// --- Collection ---
pub use crate::collection::{merge, CollectionManager, MergeOutcome, MergeReport};
pub use crate::ingest::{ingest_file, ingest_rows, IngestRow};
pub use crate::store::{JsonFileStore, MemoryStore};

// --- Extraction ---
pub use crate::extraction::{parse_records, GeminiExtractor};

// --- Presentation ---
pub use crate::analytics::{export_records, measure_group, progress_line, GroupProgress, ItemBadge};
pub use crate::output::{
    default_export_path, deliver, deliver_all, export_file_name, plan_export, DeliveryTarget,
    OutputPlan, OutputReport,
};
