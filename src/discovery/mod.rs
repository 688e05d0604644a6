//! Group discovery: pure transitions, the scheduling decision, and the
//! event loop that drives a running group against an extractor.

mod orchestrator;
mod scheduler;
mod session;
pub(crate) mod transitions;

pub use orchestrator::Orchestrator;
pub use scheduler::{next_step, NextStep};
pub use session::{DiscoverySession, StopHandle};
pub use transitions::{retry_item, start_discovery, stop_discovery};
