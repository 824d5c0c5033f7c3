//! Errors reported by object store and blob store clients

use thiserror::Error;

/// Failure of a collaborator call (object store, blob store, companion services)
#[derive(Error, Debug)]
pub enum StoreError {
    /// The service answered with `Content-Length: 0`
    #[error("the service returned an empty response (Content-Length: 0)")]
    EmptyContent,

    #[error("{0}")]
    Service(String),

    #[error("{0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
