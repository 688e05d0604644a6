//! Capability algebras for pinscan.
//!
//! This module defines the traits the discovery core depends on. Each is:
//!
//! - **Object-safe**: used as `Arc<dyn Trait>`
//! - **Documented with laws**: properties every implementation satisfies
//! - **Async via `async_trait`** where the capability does I/O
//!
//! # Capability Traits
//!
//! - [`Extractor`]: records for one postal code from the remote service
//! - [`CollectionStore`]: whole-collection snapshot persistence
//! - [`AttemptObserver`]: per-attempt telemetry
//!
//! The orchestrator and collection manager never name a concrete HTTP
//! client or file path; they receive these traits.

pub mod error;
pub mod extraction;
pub mod observer;
pub mod store;

pub use error::{ExtractionError, StoreError};
pub use extraction::Extractor;
pub use observer::{AttemptObserver, AttemptOutcome, AttemptReport, LoggingObserver};
pub use store::CollectionStore;
