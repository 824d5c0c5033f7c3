/// Filesystem-backed blob store
///
/// Blobs live under `<root>/blobs/<uuid>` with a `<uuid>.json` sidecar holding
/// the upload record. Handle ids are sequential (`LH_1`, `LH_2`, ...).
use crate::traits::BlobStore;
use crate::types::{BlobUpload, HandleInfo};
use assembly_core::{StoreError, StoreResult};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub struct LocalBlobStore {
    blob_dir: PathBuf,
    next_handle: Mutex<u64>,
}

impl LocalBlobStore {
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let blob_dir = root.as_ref().join("blobs");
        fs::create_dir_all(&blob_dir)?;

        let existing = fs::read_dir(&blob_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
            .count() as u64;

        Ok(Self {
            blob_dir,
            next_handle: Mutex::new(existing + 1),
        })
    }

    fn record_path(&self, blob_id: &str) -> PathBuf {
        self.blob_dir.join(format!("{}.json", blob_id))
    }

    /// Upload record of an existing blob
    pub fn get_upload(&self, blob_id: &str) -> StoreResult<BlobUpload> {
        let path = self.record_path(blob_id);
        if Uuid::parse_str(blob_id).is_err() || !path.exists() {
            return Err(StoreError::NotFound(format!("No blob with id {} exists", blob_id)));
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}

fn file_md5(path: &Path) -> StoreResult<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut context = md5::Context::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        context.consume(&buffer[..n]);
    }
    Ok(format!("{:x}", context.compute()))
}

impl BlobStore for LocalBlobStore {
    fn upload_file(&self, path: &Path) -> StoreResult<BlobUpload> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StoreError::Service(format!("Not a file: {}", path.display())))?;

        let blob_id = Uuid::new_v4().to_string();
        let size = fs::copy(path, self.blob_dir.join(&blob_id))?;
        let remote_md5 = file_md5(path)?;

        let hid = {
            let mut next = self.next_handle.lock();
            let hid = format!("LH_{}", *next);
            *next += 1;
            hid
        };

        let upload = BlobUpload {
            shock_id: blob_id.clone(),
            handle: HandleInfo {
                hid,
                file_name: file_name.clone(),
                id: blob_id.clone(),
                url: self.blob_dir.display().to_string(),
                handle_type: "shock".to_string(),
                remote_md5,
            },
            node_file_name: file_name,
            size,
        };
        fs::write(self.record_path(&blob_id), serde_json::to_vec_pretty(&upload)?)?;
        debug!("Uploaded {} as blob {}", path.display(), blob_id);
        Ok(upload)
    }

    fn download(&self, blob_id: &str, dest_dir: &Path) -> StoreResult<PathBuf> {
        let upload = self.get_upload(blob_id)?;
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(&upload.node_file_name);
        fs::copy(self.blob_dir.join(blob_id), &dest)?;
        Ok(dest)
    }
}
