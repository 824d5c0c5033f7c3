pub mod fasta;

// Re-export commonly used items
pub use fasta::{write_fasta, FastaFile, FastaReadable, FastaReader, FastaRecord, FastaWriter};
