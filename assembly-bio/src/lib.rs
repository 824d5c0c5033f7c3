//! FASTA parsing, validation and statistics for assembly-util

pub mod filter;
pub mod formats;
pub mod sequence;

// Re-export commonly used types
pub use filter::{filter_contigs_by_length, filtered_path_for, FilteredFasta};
pub use formats::{write_fasta, FastaFile, FastaReadable, FastaReader, FastaRecord, FastaWriter};
pub use sequence::{
    parse_assembly_stats, AssemblyStats, AssemblyStatsBuilder, ContigOverride, ContigOverrides,
    ContigStats,
};
