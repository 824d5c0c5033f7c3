//! Mock implementations for testing
//!
//! Provides in-memory versions of the collaborator services.

mod binned_contigs;
mod blob_store;
mod object_store;

pub use binned_contigs::FakeBinnedContigsService;
pub use blob_store::InMemoryBlobStore;
pub use object_store::{InMemoryObjectStore, ScriptedFailure};
