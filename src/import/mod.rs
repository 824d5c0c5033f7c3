//! FASTA to Assembly import pipeline
//!
//! An [`ImportOrchestrator`] stages each input into its own scratch
//! directory, optionally filters short contigs, computes statistics, uploads
//! the working files to the blob store and writes the finalized records to
//! the object store in size-bounded batches.

pub mod params;
pub mod record;

pub use params::{
    FileParam, ImportBatch, ImportInput, ImportRequest, InputSource, MassImportParams,
    RecordMetadata, SaveAssemblyParams, WorkspaceTarget,
};
pub use record::AssemblyRecord;

use crate::parallel::FanOutDriver;
use crate::workspace::{ScratchSession, ScratchSpace};
use assembly_bio::{filter_contigs_by_length, parse_assembly_stats, AssemblyStats};
use assembly_core::{
    AssemblyError, AssemblyResult, Config, ObjectInfo, ParallelConfig, StoreError, ASSEMBLY_TYPE,
};
use assembly_storage::{estimate_serialized_size, BatchPlanner, BlobStore, ObjectStore, ObjectToSave};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one imported FASTA file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    /// Address of the saved Assembly object
    pub upa: String,
    /// Filtered working file, when a minimum contig length was applied
    pub filtered_input: Option<PathBuf>,
}

/// One input after staging, filtering and parsing
struct PreparedInput {
    working: PathBuf,
    filtered: Option<PathBuf>,
    stats: AssemblyStats,
}

/// Drives imports against injected object and blob stores
#[derive(Clone)]
pub struct ImportOrchestrator {
    objects: Arc<dyn ObjectStore>,
    blobs: Arc<dyn BlobStore>,
    scratch: ScratchSpace,
    planner: BatchPlanner,
    parallel: ParallelConfig,
}

impl std::fmt::Debug for ImportOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportOrchestrator")
            .field("scratch", &self.scratch)
            .field("planner", &self.planner)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl ImportOrchestrator {
    /// Build from a validated configuration
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        blobs: Arc<dyn BlobStore>,
        config: &Config,
    ) -> AssemblyResult<Self> {
        config.validate()?;
        Ok(Self {
            objects,
            blobs,
            scratch: ScratchSpace::from_config(&config.import),
            planner: BatchPlanner::from_config(&config.import),
            parallel: config.parallel.clone(),
        })
    }

    pub fn with_scratch(mut self, scratch: ScratchSpace) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn with_planner(mut self, planner: BatchPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn scratch(&self) -> &ScratchSpace {
        &self.scratch
    }

    pub fn parallel_config(&self) -> &ParallelConfig {
        &self.parallel
    }

    /// Import one FASTA file, from a local path or a blob id
    pub fn import_fasta(&self, params: SaveAssemblyParams) -> AssemblyResult<ImportResult> {
        info!("validating parameters");
        let (target, mut batch) = params.validate()?;

        if let WorkspaceTarget::Name(name) = &target {
            warn!(
                "Translating workspace name {} to a workspace ID. Prefer submitting a workspace ID \
                 over a mutable workspace name that may cause race conditions",
                name
            );
            batch.workspace_id = self
                .objects
                .resolve_name_to_id(name)
                .map_err(|e| AssemblyError::from_store(e, "resolve_name_to_id"))?;
        }

        self.run_batch(&batch)?
            .pop()
            .ok_or_else(|| AssemblyError::NoOutput("the import produced no result".to_string()))
    }

    /// Import many FASTA files into one workspace.
    ///
    /// With `parallelize` set and more than one input, the inputs are split
    /// across a [`FanOutDriver`]; results always follow input order.
    pub fn import_fasta_mass(
        &self,
        params: MassImportParams,
        parallelize: bool,
    ) -> AssemblyResult<Vec<ImportResult>> {
        info!("validating parameters");
        let batch = params.validate()?;

        if parallelize && batch.len() > 1 {
            FanOutDriver::new(self.clone(), &self.parallel).run(batch)
        } else {
            self.run_batch(&batch)
        }
    }

    /// Run the pipeline over an already validated batch
    pub fn run_batch(&self, batch: &ImportBatch) -> AssemblyResult<Vec<ImportResult>> {
        let mut session = self.scratch.session();

        let mut prepared = Vec::with_capacity(batch.len());
        for request in &batch.requests {
            prepared.push(self.prepare(request, batch.min_contig_length, &mut session)?);
        }

        let paths: Vec<PathBuf> = prepared.iter().map(|p| p.working.clone()).collect();
        let uploads = self
            .blobs
            .upload_files(&paths)
            .map_err(|e| AssemblyError::from_store(e, "upload_files"))?;
        if uploads.len() != paths.len() {
            return Err(AssemblyError::Store(StoreError::Service(format!(
                "Blob store returned {} uploads for {} files",
                uploads.len(),
                paths.len()
            ))));
        }

        let mut objects = Vec::with_capacity(prepared.len());
        let mut sizes = Vec::with_capacity(prepared.len());
        for ((input, request), upload) in prepared.iter().zip(&batch.requests).zip(uploads) {
            let record = AssemblyRecord::finalize(
                input.stats.clone(),
                &request.assembly_name,
                upload,
                &request.metadata,
            );
            let data = serde_json::to_value(&record)?;
            sizes.push(estimate_serialized_size(&data)?);
            objects.push(ObjectToSave {
                type_tag: ASSEMBLY_TYPE.to_string(),
                data,
                name: request.assembly_name.clone(),
            });
        }

        info!("saving assemblies");
        let infos = self.save_in_batches(batch.workspace_id, objects, &sizes)?;

        let results = infos
            .into_iter()
            .zip(prepared)
            .map(|(info, input)| ImportResult {
                upa: info.upa().to_string(),
                filtered_input: input.filtered,
            })
            .collect();
        session.mark_success();
        Ok(results)
    }

    fn prepare(
        &self,
        request: &ImportRequest,
        min_contig_length: Option<u64>,
        session: &mut ScratchSession,
    ) -> AssemblyResult<PreparedInput> {
        let staged = self.stage(&request.source, session)?;

        let (working, filtered) = match min_contig_length {
            Some(min_len) => {
                info!(
                    "filtering FASTA file {} by contig length (min len={} bp)",
                    staged.display(),
                    min_len
                );
                let filtered = filter_contigs_by_length(&staged, min_len)?;
                (filtered.path.clone(), Some(filtered.path))
            }
            None => (staged, None),
        };

        info!("parsing FASTA file: {}", working.display());
        let stats = parse_assembly_stats(&working, &request.contig_info)?;
        info!(" - parsed {} contigs, {} bp", stats.num_contigs, stats.dna_size);

        Ok(PreparedInput {
            working,
            filtered,
            stats,
        })
    }

    /// Copy or fetch one input into a fresh scratch directory and decompress it
    fn stage(&self, source: &InputSource, session: &mut ScratchSession) -> AssemblyResult<PathBuf> {
        let staged = match source {
            InputSource::File(path) => {
                if !path.is_file() {
                    return Err(AssemblyError::NotFound(format!(
                        "KBase Assembly Utils tried to save an assembly, but the calling \
                         application specified a file ('{}') that is missing. Please check the \
                         application logs for details.",
                        path.display()
                    )));
                }
                session.stage_file(path)?
            }
            InputSource::Blob(blob_id) => {
                let dir = session.create_dir()?;
                self.blobs
                    .download(blob_id, &dir)
                    .map_err(|e| AssemblyError::from_store(e, "download"))?
            }
        };

        self.blobs
            .unpack(&staged)
            .map_err(|e| AssemblyError::from_store(e, "unpack"))
    }

    /// Write objects one planned batch at a time.
    ///
    /// Batches already written stay written when a later one fails.
    fn save_in_batches(
        &self,
        workspace_id: u64,
        objects: Vec<ObjectToSave>,
        sizes: &[usize],
    ) -> AssemblyResult<Vec<ObjectInfo>> {
        let total = objects.len();
        let batches = self.planner.split(objects, sizes);
        let batch_count = batches.len();

        let mut saved: Vec<ObjectInfo> = Vec::with_capacity(total);
        for (idx, objects) in batches.into_iter().enumerate() {
            info!(
                "Saving batch {} of {} ({} assemblies) to workspace {}",
                idx + 1,
                batch_count,
                objects.len(),
                workspace_id
            );
            match self.objects.save_objects(workspace_id, objects) {
                Ok(infos) => saved.extend(infos),
                Err(e) => {
                    let err = AssemblyError::from_store(e, "save_objects");
                    if saved.is_empty() {
                        return Err(err);
                    }
                    warn!(
                        "Batch {} of {} failed after {} assemblies were saved",
                        idx + 1,
                        batch_count,
                        saved.len()
                    );
                    return Err(AssemblyError::PartialSave {
                        committed: saved.len(),
                        total,
                        upas: saved.iter().map(|i| i.upa().to_string()).collect(),
                        source: Box::new(err),
                    });
                }
            }
        }

        if saved.len() != total {
            return Err(AssemblyError::Store(StoreError::Service(format!(
                "Object store returned {} object infos for {} saved objects",
                saved.len(),
                total
            ))));
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_result_serializes_null_filtered_input() {
        let result = ImportResult {
            upa: "1/2/3".to_string(),
            filtered_input: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["upa"], "1/2/3");
        assert!(json["filtered_input"].is_null());
    }
}
