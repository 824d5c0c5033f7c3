use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-supplied per-contig facts that override parsed values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContigOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_circ: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Overrides keyed by contig id
pub type ContigOverrides = HashMap<String, ContigOverride>;

/// Derived facts for one contig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContigStats {
    pub contig_id: String,
    pub name: String,
    pub description: String,
    pub length: u64,
    #[serde(rename = "Ncount", default, skip_serializing_if = "Option::is_none")]
    pub n_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_circ: Option<i64>,
    pub md5: String,
    pub gc_content: f64,
}

/// Aggregate statistics over every contig of one FASTA file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyStats {
    pub md5: String,
    pub base_counts: IndexMap<String, u64>,
    pub dna_size: u64,
    /// `None` when no bases were seen
    pub gc_content: Option<f64>,
    pub contigs: IndexMap<String, ContigStats>,
    pub num_contigs: usize,
}
