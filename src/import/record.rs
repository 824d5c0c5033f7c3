use super::params::RecordMetadata;
use assembly_bio::AssemblyStats;
use assembly_storage::BlobUpload;
use serde::{Deserialize, Serialize};

const DEFAULT_ASSEMBLY_TYPE: &str = "Unknown";

/// Stored Assembly object: parsed statistics plus identity and provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRecord {
    #[serde(flatten)]
    pub stats: AssemblyStats,
    pub assembly_id: String,
    pub fasta_handle_ref: String,
    pub fasta_handle_info: BlobUpload,
    #[serde(rename = "type")]
    pub assembly_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source_origination_date: Option<String>,
}

impl AssemblyRecord {
    /// Merge statistics with the uploaded file's handle and caller metadata
    pub fn finalize(
        stats: AssemblyStats,
        assembly_name: &str,
        upload: BlobUpload,
        metadata: &RecordMetadata,
    ) -> Self {
        Self {
            stats,
            assembly_id: assembly_name.to_string(),
            fasta_handle_ref: upload.handle.hid.clone(),
            fasta_handle_info: upload,
            assembly_type: metadata
                .assembly_type
                .clone()
                .unwrap_or_else(|| DEFAULT_ASSEMBLY_TYPE.to_string()),
            external_source: metadata.external_source.clone(),
            external_source_id: metadata.external_source_id.clone(),
            external_source_origination_date: metadata.external_source_origination_date.clone(),
        }
    }
}
