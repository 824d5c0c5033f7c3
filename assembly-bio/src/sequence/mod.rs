pub mod alphabet;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use alphabet::{classify, validate_char, CharClass};
pub use stats::{parse_assembly_stats, AssemblyStatsBuilder};
pub use types::{AssemblyStats, ContigOverride, ContigOverrides, ContigStats};
