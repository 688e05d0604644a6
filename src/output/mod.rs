// src/output/mod.rs
//! Export output with planning separated from execution.
//!
//! Planning (what to write, where) is pure; the writer performs the I/O.

mod paths;
mod plan;
mod types;
mod writer;

pub use paths::{default_export_path, export_file_name};
pub use plan::plan_export;
pub use types::{DeliveryTarget, OutputPlan, OutputReport};
pub use writer::{deliver, deliver_all};
