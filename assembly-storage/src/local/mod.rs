//! Filesystem-backed implementations of the store traits

pub mod blob_store;
pub mod object_store;

pub use blob_store::LocalBlobStore;
pub use object_store::LocalObjectStore;
