//! Error types for assembly import, export and resolution

pub mod store;

use thiserror::Error;
pub use store::{StoreError, StoreResult};

/// Main error type for assembly-util operations
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Bad or missing request parameters, always raised before any I/O
    #[error("{0}")]
    InvalidInput(String),

    /// Invalid FASTA content: bad characters, duplicate ids, empty records
    #[error("{0}")]
    Parse(String),

    #[error(
        "Either the original FASTA file contained no sequences or they were all filtered out \
         based on the min_contig_length parameter for file {0}"
    )]
    NoSequences(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No output generated: {0}")]
    NoOutput(String),

    #[error("Unsupported object type: {0}")]
    UnsupportedType(String),

    /// A batch write failed after earlier batches were already committed
    #[error("Saved {committed} of {total} assemblies before a later batch failed: {source}")]
    PartialSave {
        committed: usize,
        total: usize,
        upas: Vec<String>,
        #[source]
        source: Box<AssemblyError>,
    },
}

/// Result type alias for assembly-util operations
pub type AssemblyResult<T> = Result<T, AssemblyError>;

impl From<serde_json::Error> for AssemblyError {
    fn from(err: serde_json::Error) -> Self {
        AssemblyError::Serialization(err.to_string())
    }
}

impl AssemblyError {
    /// Convert a collaborator failure, translating the empty-response signature
    pub fn from_store(err: StoreError, operation: &str) -> Self {
        match err {
            StoreError::EmptyContent => AssemblyError::NoOutput(format!(
                "the store returned an empty response to {}",
                operation
            )),
            other => AssemblyError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let io_error = AssemblyError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(format!("{}", io_error).contains("IO error"));

        let input_error = AssemblyError::InvalidInput("workspace_id is required".to_string());
        assert_eq!(format!("{}", input_error), "workspace_id is required");

        let config_error = AssemblyError::Configuration("MAX_THREADS is required".to_string());
        assert_eq!(
            format!("{}", config_error),
            "Configuration error: MAX_THREADS is required"
        );

        let unsupported = AssemblyError::UnsupportedType("KBaseFBA.FBAModel-1.0".to_string());
        assert_eq!(
            format!("{}", unsupported),
            "Unsupported object type: KBaseFBA.FBAModel-1.0"
        );
    }

    #[test]
    fn test_no_sequences_names_file() {
        let err = AssemblyError::NoSequences("/scratch/import_fasta_1/empty.fa.filtered.fa".into());
        let msg = err.to_string();
        assert!(msg.starts_with("Either the original FASTA file contained no sequences"));
        assert!(msg.ends_with("for file /scratch/import_fasta_1/empty.fa.filtered.fa"));
    }

    #[test]
    fn test_empty_content_is_translated() {
        let err = AssemblyError::from_store(StoreError::EmptyContent, "save_objects");
        assert!(matches!(err, AssemblyError::NoOutput(_)));
        assert!(err.to_string().contains("save_objects"));
    }

    #[test]
    fn test_other_store_errors_pass_through() {
        let err = AssemblyError::from_store(
            StoreError::Service("Object foo cannot be accessed".to_string()),
            "save_objects",
        );
        match err {
            AssemblyError::Store(StoreError::Service(msg)) => {
                assert_eq!(msg, "Object foo cannot be accessed")
            }
            other => panic!("Expected Store error, got {:?}", other),
        }
    }

    #[test]
    fn test_store_error_display_is_transparent() {
        let err: AssemblyError = StoreError::Service("workspace 42 is locked".to_string()).into();
        assert_eq!(err.to_string(), "workspace 42 is locked");
    }

    #[test]
    fn test_partial_save_reports_counts() {
        let err = AssemblyError::PartialSave {
            committed: 2,
            total: 5,
            upas: vec!["1/1/1".to_string(), "1/2/1".to_string()],
            source: Box::new(StoreError::Service("payload too large".to_string()).into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Saved 2 of 5"));
        assert!(msg.contains("payload too large"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse_result: Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{invalid json}");
        let err: AssemblyError = parse_result.unwrap_err().into();
        assert!(matches!(err, AssemblyError::Serialization(_)));
    }
}
