//! Error types for algebra traits.
//!
//! These errors are used by the algebra layer and are intentionally
//! domain-specific rather than generic. The orchestrator never inspects
//! an `ExtractionError` beyond its display string; the variants exist so
//! adapters and logs can tell failure modes apart.

use thiserror::Error;

/// Error that can occur while extracting records for one postal code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The request never produced a response.
    #[error("Request failed: {message}")]
    Transport { message: String },

    /// The service answered with a non-success status.
    #[error("Extraction service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// The service answered, but not with the record shape we asked for.
    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },

    /// The service answered with no usable content at all.
    #[error("Empty response during {stage}")]
    EmptyResponse { stage: &'static str },

    /// A prompt could not be rendered.
    #[error("Prompt rendering failed: {0}")]
    Prompt(String),
}

impl ExtractionError {
    /// Returns `true` when the service itself reported overload or an
    /// internal failure. Purely informational: every failure counts
    /// against the retry budget the same way.
    pub fn is_service_side(&self) -> bool {
        matches!(
            self,
            Self::Service {
                status: 429 | 500..=599,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Error that can occur while reading or writing a collection snapshot.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Snapshot IO failed for {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Snapshot format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}
