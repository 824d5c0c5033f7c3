/// Capability traits for the services an import talks to
use crate::types::{BlobUpload, ObjectToSave};
use assembly_core::{ObjectInfo, StoreResult};
use std::path::{Path, PathBuf};

/// Versioned structured-object store organised into numbered workspaces
pub trait ObjectStore: Send + Sync {
    /// Translate a mutable workspace name into its numeric id
    fn resolve_name_to_id(&self, name: &str) -> StoreResult<u64>;

    /// Metadata of the object at `reference` (`ws/obj[/ver]` or a `;`-separated path)
    fn get_object_info(&self, reference: &str) -> StoreResult<ObjectInfo>;

    /// Object data; an empty `fields` slice returns the whole object
    fn get_object_data(&self, reference: &str, fields: &[String]) -> StoreResult<serde_json::Value>;

    /// Save objects into one workspace, returning their info in input order
    fn save_objects(
        &self,
        workspace_id: u64,
        objects: Vec<ObjectToSave>,
    ) -> StoreResult<Vec<ObjectInfo>>;
}

/// Content-addressed store for raw files
pub trait BlobStore: Send + Sync {
    /// Upload one file and create a handle for it
    fn upload_file(&self, path: &Path) -> StoreResult<BlobUpload>;

    /// Upload several files in one call
    fn upload_files(&self, paths: &[PathBuf]) -> StoreResult<Vec<BlobUpload>> {
        // Default implementation: upload one by one
        paths.iter().map(|p| self.upload_file(p)).collect()
    }

    /// Download a blob into `dest_dir`, returning the local file path
    fn download(&self, blob_id: &str, dest_dir: &Path) -> StoreResult<PathBuf>;

    /// Decompress a downloaded or staged file in place
    fn unpack(&self, path: &Path) -> StoreResult<PathBuf> {
        crate::unpack::unpack_file(path)
    }
}

/// Companion service that writes binned-contig objects out as FASTA files
pub trait BinnedContigsService: Send + Sync {
    /// Write every bin of `reference` into `output_dir`, returning the directory holding the bins
    fn binned_contigs_to_fasta(&self, reference: &str, output_dir: &Path) -> StoreResult<PathBuf>;
}
