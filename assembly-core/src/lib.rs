//! Core types shared across the assembly-util crates

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{default_config, load_config, save_config, Config, ImportConfig, ParallelConfig, ScratchRetention, StoreConfig};
pub use error::{AssemblyError, AssemblyResult, StoreError, StoreResult};

pub use types::{
    aggregate_checksum, md5_hex, round_fraction, ObjectInfo, Upa, ASSEMBLY_TYPE, GC_DECIMALS,
};

/// Version information for the assembly-util project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
