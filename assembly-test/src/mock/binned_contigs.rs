//! Fake binned-contigs service writing canned bin files

use assembly_core::{StoreError, StoreResult};
use assembly_storage::BinnedContigsService;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct FakeBinnedContigsService {
    bins: Arc<RwLock<HashMap<String, Vec<(String, String)>>>>,
}

impl FakeBinnedContigsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bin files produced for `reference`
    pub fn with_bins(self, reference: &str, bins: &[(&str, &str)]) -> Self {
        self.bins.write().insert(
            reference.to_string(),
            bins.iter()
                .map(|(name, content)| (name.to_string(), content.to_string()))
                .collect(),
        );
        self
    }
}

impl BinnedContigsService for FakeBinnedContigsService {
    fn binned_contigs_to_fasta(&self, reference: &str, output_dir: &Path) -> StoreResult<PathBuf> {
        // Object references inside a path resolve to the last element
        let key = reference.rsplit(';').next().unwrap_or(reference);
        let bins = self
            .bins
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("No binned contigs at {}", reference)))?;

        let out = output_dir.join("bins");
        std::fs::create_dir_all(&out)?;
        for (name, content) in bins {
            std::fs::write(out.join(name), content)?;
        }
        Ok(out)
    }
}
