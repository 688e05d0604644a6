//! Collection persistence backends.
//!
//! Both backends implement [`CollectionStore`](crate::algebras::CollectionStore);
//! the collection manager decides when to save and what to do on failure.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
