//! Test fixtures and data generators

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Two 8 bp contigs, 16 bp total
pub const TWO_CONTIG_FASTA: &str = ">s1\nagtggggg\n>s2\ngacgattt\n";

/// Three contigs; only `s3` (18 bp) survives a minimum length of 9
pub const THREE_CONTIG_FASTA: &str = ">s1\nagtggggg\n>s2\ngacgattt\n>s3 some text\nctgtgtttgtgtgtgtgt\n";

/// Aggregate checksum of [`TWO_CONTIG_FASTA`]
pub const TWO_CONTIG_MD5: &str = "e96bb836615d7ba20044f8b27dd5c115";

/// Aggregate checksum of [`THREE_CONTIG_FASTA`] filtered to `s3`
pub const FILTERED_S3_MD5: &str = "eba4d1771060e19671a56832d159526e";

/// Test sequence with metadata
#[derive(Debug, Clone)]
pub struct TestSequence {
    pub id: String,
    pub description: String,
    pub sequence: String,
}

impl TestSequence {
    /// Create a simple test sequence
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            sequence: sequence.into(),
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Convert to FASTA format
    pub fn to_fasta(&self) -> String {
        let mut header = format!(">{}", self.id);
        if !self.description.is_empty() {
            let _ = write!(&mut header, " {}", self.description);
        }
        format!("{}\n{}\n", header, self.sequence)
    }
}

/// Generate random DNA sequences
pub fn generate_sequences(count: usize, length: usize) -> Vec<TestSequence> {
    let mut rng = StdRng::seed_from_u64(42); // Deterministic for tests
    let bases = ['A', 'T', 'G', 'C'];

    (0..count)
        .map(|i| {
            let sequence: String = (0..length).map(|_| bases[rng.gen_range(0..4)]).collect();
            TestSequence::new(format!("seq_{}", i), sequence)
        })
        .collect()
}

/// Render sequences as one FASTA document
pub fn to_fasta(sequences: &[TestSequence]) -> String {
    sequences.iter().map(|s| s.to_fasta()).collect()
}

/// Write sequences to `dir/name` and return the path
pub fn create_test_fasta(dir: &Path, name: &str, sequences: &[TestSequence]) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, to_fasta(sequences))?;
    Ok(path)
}

/// Write gzip-compressed FASTA text to `dir/name`
pub fn create_gzipped_fasta(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let path = dir.join(name);
    let mut encoder = GzEncoder::new(std::fs::File::create(&path)?, Compression::default());
    encoder.write_all(content.as_bytes())?;
    encoder.finish()?;
    Ok(path)
}
