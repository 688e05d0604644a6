// src/constants.rs
//! Domain constants that define the operational boundaries of discovery.
//!
//! Each constant is named for the domain concept it constrains. Reading
//! them top to bottom tells you how a discovery run behaves: how many
//! postal codes are in flight, how often a code is retried, how long the
//! scheduler waits between attempts, and where progress is kept.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Scheduling boundaries
// ---------------------------------------------------------------------------

/// How many postal codes of one group may be in flight at once.
///
/// The extraction service is rate limited per key, and every in-flight
/// code holds two sequential model calls. Two keeps a single group from
/// starving other groups running in the same session.
pub const DISCOVERY_CONCURRENCY_LIMIT: usize = 2;

/// How many times a single postal code is attempted before it is marked
/// as failed.
pub const EXTRACTION_MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between two attempts for the same postal code.
pub const EXTRACTION_RETRY_DELAY: Duration = Duration::from_millis(5000);

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// File name of the collection snapshot when no store path is given.
pub const DEFAULT_STORE_FILE: &str = "pinscan_store.json";

/// Version stamped into every snapshot written to disk.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Extraction service
// ---------------------------------------------------------------------------

/// Base URL of the generative language API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for both the grounding and the structuring request.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variable holding the extraction service key.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Maximum characters shown when previewing an unparseable response body.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
