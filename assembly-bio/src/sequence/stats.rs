use super::alphabet::validate_char;
use super::types::{AssemblyStats, ContigOverride, ContigOverrides, ContigStats};
use crate::formats::{FastaFile, FastaReadable, FastaRecord};
use assembly_core::{aggregate_checksum, md5_hex, round_fraction, AssemblyError, AssemblyResult};
use indexmap::IndexMap;
use std::path::Path;
use tracing::{debug, info};

/// Append-only accumulator of contig statistics.
///
/// Every [`add_contig`](Self::add_contig) consumes the builder and hands back
/// the extended one, so a partially built value is never shared.
#[derive(Debug, Clone)]
pub struct AssemblyStatsBuilder {
    total_length: u64,
    base_counts: IndexMap<String, u64>,
    checksums: Vec<String>,
    contigs: IndexMap<String, ContigStats>,
}

impl Default for AssemblyStatsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssemblyStatsBuilder {
    pub fn new() -> Self {
        let base_counts = ["A", "G", "C", "T"]
            .iter()
            .map(|b| (b.to_string(), 0))
            .collect();
        Self {
            total_length: 0,
            base_counts,
            checksums: Vec::new(),
            contigs: IndexMap::new(),
        }
    }

    pub fn num_contigs(&self) -> usize {
        self.contigs.len()
    }

    pub fn add_contig(
        mut self,
        record: &FastaRecord,
        overrides: Option<&ContigOverride>,
    ) -> AssemblyResult<Self> {
        if self.contigs.contains_key(&record.id) {
            return Err(AssemblyError::Parse(format!(
                "The FASTA header key {} appears more than once in the file",
                record.id
            )));
        }
        if record.is_empty() {
            return Err(AssemblyError::Parse(format!(
                "The FASTA record {} has an empty sequence",
                record.id
            )));
        }

        let sequence = record.sequence.to_ascii_uppercase();

        // Tally in first-seen order; the first offending character is reported
        let mut counts = [0u64; 256];
        let mut seen_order = Vec::new();
        for &b in &sequence {
            if counts[b as usize] == 0 {
                validate_char(b)?;
                seen_order.push(b);
            }
            counts[b as usize] += 1;
        }
        for b in seen_order {
            *self
                .base_counts
                .entry(char::from(b).to_string())
                .or_insert(0) += counts[b as usize];
        }

        let length = sequence.len() as u64;
        let gc = counts[b'G' as usize] + counts[b'C' as usize];
        let n_count = counts[b'N' as usize];
        let md5 = md5_hex(&sequence);

        let mut contig = ContigStats {
            contig_id: record.id.clone(),
            name: record.id.clone(),
            description: record.description.clone(),
            length,
            n_count: (n_count > 0).then_some(n_count),
            is_circ: None,
            md5: md5.clone(),
            gc_content: round_fraction(gc as f64 / length as f64),
        };
        if let Some(extra) = overrides {
            if let Some(is_circ) = extra.is_circ {
                contig.is_circ = Some(is_circ);
            }
            if let Some(description) = &extra.description {
                contig.description = description.clone();
            }
        }

        self.total_length += length;
        self.checksums.push(md5);
        self.contigs.insert(record.id.clone(), contig);
        Ok(self)
    }

    /// Close the accumulator. Zero contigs is a valid, if unsaveable, result.
    pub fn finish(self) -> AssemblyStats {
        let gc_content = if self.total_length > 0 {
            let gc = self.base_counts.get("G").copied().unwrap_or(0)
                + self.base_counts.get("C").copied().unwrap_or(0);
            Some(round_fraction(gc as f64 / self.total_length as f64))
        } else {
            None
        };
        AssemblyStats {
            md5: aggregate_checksum(&self.checksums),
            base_counts: self.base_counts,
            dna_size: self.total_length,
            gc_content,
            num_contigs: self.contigs.len(),
            contigs: self.contigs,
        }
    }
}

/// Stream a FASTA file and compute its assembly statistics.
///
/// Fails with [`AssemblyError::NoSequences`] naming the file when it holds no records.
pub fn parse_assembly_stats<P: AsRef<Path>>(
    path: P,
    overrides: &ContigOverrides,
) -> AssemblyResult<AssemblyStats> {
    let path = path.as_ref();
    debug!("Parsing FASTA statistics from {}", path.display());

    let mut builder = AssemblyStatsBuilder::new();
    for record in FastaFile::records(path)? {
        let record = record?;
        let extra = overrides.get(&record.id);
        builder = builder.add_contig(&record, extra)?;
    }

    if builder.num_contigs() == 0 {
        return Err(AssemblyError::NoSequences(path.display().to_string()));
    }

    let stats = builder.finish();
    info!(
        "Parsed {} contigs ({} bp) from {}",
        stats.num_contigs,
        stats.dna_size,
        path.display()
    );
    Ok(stats)
}
