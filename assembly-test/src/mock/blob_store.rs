//! In-memory blob store for testing

use super::object_store::ScriptedFailure;
use assembly_core::{md5_hex, StoreError, StoreResult};
use assembly_storage::{BlobStore, BlobUpload, HandleInfo};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default)]
struct State {
    blobs: HashMap<String, (String, Vec<u8>)>,
    next_id: u64,
    upload_failure: Option<ScriptedFailure>,
}

/// In-memory [`BlobStore`]; blob ids are `blob_<n>`, handle ids `HID_<n>`
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    state: Arc<RwLock<State>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob, returning its id
    pub fn insert_blob(&self, file_name: &str, content: &[u8]) -> String {
        let mut state = self.state.write();
        state.next_id += 1;
        let id = format!("blob_{}", state.next_id);
        state
            .blobs
            .insert(id.clone(), (file_name.to_string(), content.to_vec()));
        id
    }

    /// Make every subsequent upload fail
    pub fn fail_uploads(&self, failure: ScriptedFailure) {
        self.state.write().upload_failure = Some(failure);
    }

    /// Content of a stored blob
    pub fn blob_content(&self, blob_id: &str) -> Option<Vec<u8>> {
        self.state.read().blobs.get(blob_id).map(|(_, c)| c.clone())
    }

    /// Names of every uploaded or seeded file, by blob id
    pub fn blob_names(&self) -> HashMap<String, String> {
        self.state
            .read()
            .blobs
            .iter()
            .map(|(id, (name, _))| (id.clone(), name.clone()))
            .collect()
    }

    /// Get recorded method calls (for verification in tests)
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    fn record_call(&self, call: impl Into<String>) {
        self.calls.write().push(call.into());
    }
}

impl BlobStore for InMemoryBlobStore {
    fn upload_file(&self, path: &Path) -> StoreResult<BlobUpload> {
        self.record_call(format!("upload_file({})", path.display()));
        if let Some(failure) = &self.state.read().upload_failure {
            return Err(failure.to_error());
        }

        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = self.insert_blob(&file_name, &content);
        let hid = format!("HID_{}", id.trim_start_matches("blob_"));

        Ok(BlobUpload {
            shock_id: id.clone(),
            handle: HandleInfo {
                hid,
                file_name: file_name.clone(),
                id,
                url: "memory://blobs".to_string(),
                handle_type: "shock".to_string(),
                remote_md5: md5_hex(&content),
            },
            node_file_name: file_name,
            size: content.len() as u64,
        })
    }

    fn download(&self, blob_id: &str, dest_dir: &Path) -> StoreResult<PathBuf> {
        self.record_call(format!("download({})", blob_id));
        let (name, content) = self
            .state
            .read()
            .blobs
            .get(blob_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("No blob with id {} exists", blob_id)))?;
        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(name);
        std::fs::write(&dest, content)?;
        Ok(dest)
    }
}
