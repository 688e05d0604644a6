//! Domain model: work items, extracted records, groups and the collection.
//!
//! Every type here is an immutable value. Changes go through the
//! transition functions in `discovery` and the merge in `collection`,
//! each producing a new snapshot.

mod collection;
mod group;
mod item;
mod record;

pub use collection::Collection;
pub use group::{Group, GroupStatus};
pub use item::{ItemEvent, ItemStatus, WorkItem};
pub use record::ExtractedRecord;
