//! Test utilities for the assembly-util workspace
//!
//! Common test helpers, fixtures and in-memory collaborator services shared
//! by the workspace crates.
//!
//! # Features
//!
//! - **Test Environment**: isolated scratch, input and store directories with automatic cleanup
//! - **Mock Implementations**: recording in-memory object and blob stores with scripted failures
//! - **Fixtures**: canonical FASTA inputs and deterministic sequence generators

pub mod environment;
pub mod fixtures;
pub mod mock;

// Re-export commonly used items
pub use environment::{TestConfig, TestEnvironment};
pub use fixtures::{create_test_fasta, generate_sequences};
pub use mock::{FakeBinnedContigsService, InMemoryBlobStore, InMemoryObjectStore, ScriptedFailure};

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, shared with the binary
pub const LOG_ENV: &str = "ASSEMBLY_UTIL_LOG";

/// Initialize test logging (safe to call from every test)
///
/// Library code logs through `tracing`; events go to the test writer so
/// they show up only for failing tests. Filter with `ASSEMBLY_UTIL_LOG`.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_installs_tracing_subscriber() {
        init_test_logging();
        init_test_logging();
        assert!(tracing::dispatcher::has_been_set());
        tracing::info!("test logging initialized");
    }
}
