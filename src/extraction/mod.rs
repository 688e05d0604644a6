//! The extraction service adapter.

mod client;
mod parser;
mod prompts;
mod responses;

pub use client::GeminiExtractor;
pub use parser::parse_records;
