//! Collection-level operations: merging imports and keeping the live
//! snapshot persisted.

mod manager;
mod merge;

pub use manager::CollectionManager;
pub use merge::{merge, MergeOutcome, MergeReport};
