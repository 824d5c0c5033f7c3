//! Collaborator interfaces and storage helpers for assembly-util

pub mod batch;
pub mod local;
pub mod traits;
pub mod types;
pub mod unpack;

// Re-export commonly used types and traits
pub use batch::{estimate_serialized_size, BatchPlanner};
pub use local::{LocalBlobStore, LocalObjectStore};
pub use traits::{BinnedContigsService, BlobStore, ObjectStore};
pub use types::{BlobUpload, HandleInfo, ObjectToSave};
pub use unpack::{detect_compression, unpack_file, Compression};
