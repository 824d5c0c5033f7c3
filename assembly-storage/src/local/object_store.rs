/// Filesystem-backed object store
///
/// Layout under the root:
/// - `workspaces.json`: workspace name to id
/// - `objects/<ws>/index.json`: object name to object id
/// - `objects/<ws>/<obj>/<ver>.json`: stored object (info and data)
use crate::traits::ObjectStore;
use crate::types::ObjectToSave;
use assembly_core::{md5_hex, ObjectInfo, StoreError, StoreResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct StoredObject {
    info: ObjectInfo,
    data: serde_json::Value,
}

pub struct LocalObjectStore {
    root: PathBuf,
    user: String,
    // Serialises index updates between concurrent saves
    write_lock: Mutex<()>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("objects"))?;
        let user = std::env::var("USER").unwrap_or_else(|_| "local".to_string());
        Ok(Self {
            root,
            user,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn workspaces_path(&self) -> PathBuf {
        self.root.join("workspaces.json")
    }

    fn workspace_dir(&self, workspace_id: u64) -> PathBuf {
        self.root.join("objects").join(workspace_id.to_string())
    }

    fn read_json_map(path: &Path) -> StoreResult<BTreeMap<String, u64>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
        fs::write(path, serde_json::to_vec_pretty(value)?)?;
        Ok(())
    }

    /// Create a workspace, or return the id of an existing one with this name
    pub fn create_workspace(&self, name: &str) -> StoreResult<u64> {
        let _guard = self.write_lock.lock();
        let path = self.workspaces_path();
        let mut workspaces = Self::read_json_map(&path)?;
        if let Some(id) = workspaces.get(name) {
            return Ok(*id);
        }
        let id = workspaces.values().max().copied().unwrap_or(0) + 1;
        workspaces.insert(name.to_string(), id);
        Self::write_json(&path, &workspaces)?;
        fs::create_dir_all(self.workspace_dir(id))?;
        debug!("Created workspace {} ({})", name, id);
        Ok(id)
    }

    fn workspace_name(&self, workspace_id: u64) -> StoreResult<String> {
        let workspaces = Self::read_json_map(&self.workspaces_path())?;
        Ok(workspaces
            .into_iter()
            .find(|(_, id)| *id == workspace_id)
            .map(|(name, _)| name)
            .unwrap_or_else(|| workspace_id.to_string()))
    }

    fn latest_version(&self, workspace_id: u64, object_id: u64) -> StoreResult<Option<u64>> {
        let dir = self.workspace_dir(workspace_id).join(object_id.to_string());
        if !dir.exists() {
            return Ok(None);
        }
        let mut latest = None;
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name();
            let version = name
                .to_string_lossy()
                .strip_suffix(".json")
                .and_then(|v| v.parse::<u64>().ok());
            latest = latest.max(version);
        }
        Ok(latest)
    }

    /// Load the object addressed by the last element of a reference path
    fn load(&self, reference: &str) -> StoreResult<StoredObject> {
        let target = reference.rsplit(';').next().unwrap_or(reference).trim();
        let parts: Vec<&str> = target.split('/').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(StoreError::Service(format!(
                "Invalid object reference: {}",
                reference
            )));
        }

        let workspace_id = match parts[0].parse::<u64>() {
            Ok(id) => id,
            Err(_) => self.resolve_name_to_id(parts[0])?,
        };
        let object_id = match parts[1].parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                let index =
                    Self::read_json_map(&self.workspace_dir(workspace_id).join("index.json"))?;
                *index.get(parts[1]).ok_or_else(|| not_found(reference))?
            }
        };
        let version = match parts.get(2) {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| StoreError::Service(format!("Invalid object reference: {}", reference)))?,
            None => self
                .latest_version(workspace_id, object_id)?
                .ok_or_else(|| not_found(reference))?,
        };

        let path = self
            .workspace_dir(workspace_id)
            .join(object_id.to_string())
            .join(format!("{}.json", version));
        if !path.exists() {
            return Err(not_found(reference));
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }

    /// Write every version file, then the index.
    ///
    /// On failure the version files already written are removed again, so the
    /// index never lags behind the objects on disk.
    fn commit(
        writes: &[(PathBuf, StoredObject)],
        index_path: &Path,
        index: &BTreeMap<String, u64>,
    ) -> StoreResult<()> {
        let mut written: Vec<&Path> = Vec::with_capacity(writes.len());
        let result = writes
            .iter()
            .try_for_each(|(path, stored)| -> StoreResult<()> {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                Self::write_json(path, stored)?;
                written.push(path);
                Ok(())
            })
            .and_then(|()| Self::write_json(index_path, index));

        if result.is_err() {
            for path in written {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Failed to remove {} after a failed save: {}", path.display(), e);
                }
            }
        }
        result
    }
}

fn not_found(reference: &str) -> StoreError {
    StoreError::NotFound(format!("No object with reference {} exists", reference))
}

impl ObjectStore for LocalObjectStore {
    fn resolve_name_to_id(&self, name: &str) -> StoreResult<u64> {
        Self::read_json_map(&self.workspaces_path())?
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("No workspace with name {} exists", name)))
    }

    fn get_object_info(&self, reference: &str) -> StoreResult<ObjectInfo> {
        Ok(self.load(reference)?.info)
    }

    fn get_object_data(&self, reference: &str, fields: &[String]) -> StoreResult<serde_json::Value> {
        let data = self.load(reference)?.data;
        if fields.is_empty() {
            return Ok(data);
        }
        let mut subset = serde_json::Map::new();
        if let serde_json::Value::Object(map) = data {
            for field in fields {
                if let Some(value) = map.get(field) {
                    subset.insert(field.clone(), value.clone());
                }
            }
        }
        Ok(serde_json::Value::Object(subset))
    }

    fn save_objects(
        &self,
        workspace_id: u64,
        objects: Vec<ObjectToSave>,
    ) -> StoreResult<Vec<ObjectInfo>> {
        let _guard = self.write_lock.lock();
        let ws_dir = self.workspace_dir(workspace_id);
        fs::create_dir_all(&ws_dir)?;
        let workspace_name = self.workspace_name(workspace_id)?;

        let index_path = ws_dir.join("index.json");
        let mut index = Self::read_json_map(&index_path)?;
        let mut versions: HashMap<u64, u64> = HashMap::new();
        let mut writes = Vec::with_capacity(objects.len());

        for object in objects {
            let object_id = match index.get(&object.name) {
                Some(id) => *id,
                None => {
                    let id = index.values().max().copied().unwrap_or(0) + 1;
                    index.insert(object.name.clone(), id);
                    id
                }
            };
            let version = match versions.get(&object_id) {
                Some(previous) => previous + 1,
                None => self.latest_version(workspace_id, object_id)?.unwrap_or(0) + 1,
            };
            versions.insert(object_id, version);
            let serialized = serde_json::to_vec(&object.data)?;

            let info = ObjectInfo {
                object_id,
                name: object.name,
                type_string: object.type_tag,
                save_date: chrono::Utc::now().to_rfc3339(),
                version,
                saved_by: self.user.clone(),
                workspace_id,
                workspace_name: workspace_name.clone(),
                checksum: md5_hex(&serialized),
                size: serialized.len() as u64,
                metadata: BTreeMap::new(),
            };
            let path = ws_dir
                .join(object_id.to_string())
                .join(format!("{}.json", version));
            writes.push((
                path,
                StoredObject {
                    info,
                    data: object.data,
                },
            ));
        }

        Self::commit(&writes, &index_path, &index)?;
        Ok(writes
            .into_iter()
            .map(|(_, stored)| {
                debug!("Saved {} as {}", stored.info.name, stored.info.upa());
                stored.info
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn save_one(store: &LocalObjectStore, ws: u64, name: &str, data: serde_json::Value) -> ObjectInfo {
        store
            .save_objects(
                ws,
                vec![ObjectToSave {
                    type_tag: "KBaseGenomeAnnotations.Assembly".to_string(),
                    data,
                    name: name.to_string(),
                }],
            )
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_save_and_fetch() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();
        let ws = store.create_workspace("mine").unwrap();

        let info = save_one(&store, ws, "asm", json!({"md5": "abc", "num_contigs": 2}));
        assert_eq!(info.upa().to_string(), format!("{}/1/1", ws));
        assert_eq!(info.workspace_name, "mine");

        let fetched = store.get_object_info(&info.upa().to_string()).unwrap();
        assert_eq!(fetched, info);

        let by_name = store.get_object_info(&format!("{}/asm", ws)).unwrap();
        assert_eq!(by_name.object_id, 1);

        let subset = store
            .get_object_data("mine/asm", &["num_contigs".to_string()])
            .unwrap();
        assert_eq!(subset, json!({"num_contigs": 2}));
    }

    #[test]
    fn test_same_name_twice_in_one_save() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();
        let ws = store.create_workspace("mine").unwrap();

        let object = |v: u64| ObjectToSave {
            type_tag: "KBaseGenomeAnnotations.Assembly".to_string(),
            data: json!({ "v": v }),
            name: "asm".to_string(),
        };
        let infos = store.save_objects(ws, vec![object(1), object(2)]).unwrap();

        let versions: Vec<(u64, u64)> = infos.iter().map(|i| (i.object_id, i.version)).collect();
        assert_eq!(versions, vec![(1, 1), (1, 2)]);
        assert_eq!(
            store.get_object_data("mine/asm", &[]).unwrap(),
            json!({"v": 2})
        );
    }

    #[test]
    fn test_failed_commit_removes_written_versions() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();
        let ws = store.create_workspace("mine").unwrap();
        let first = save_one(&store, ws, "asm", json!({"v": 1}));

        let ws_dir = store.workspace_dir(ws);
        let index_path = ws_dir.join("index.json");
        let index_before = fs::read_to_string(&index_path).unwrap();
        // A regular file where an object directory is expected
        let blocker = ws_dir.join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut index = LocalObjectStore::read_json_map(&index_path).unwrap();
        index.insert("other".to_string(), 2);
        let second_version = ws_dir.join("1").join("2.json");
        let writes = vec![
            (
                second_version.clone(),
                StoredObject {
                    info: first.clone(),
                    data: json!({"v": 2}),
                },
            ),
            (
                blocker.join("1.json"),
                StoredObject {
                    info: first.clone(),
                    data: json!({"v": 3}),
                },
            ),
        ];

        assert!(LocalObjectStore::commit(&writes, &index_path, &index).is_err());
        assert!(!second_version.exists());
        assert_eq!(fs::read_to_string(&index_path).unwrap(), index_before);
        assert_eq!(
            store.get_object_info("mine/asm").unwrap().version,
            first.version
        );
    }

    #[test]
    fn test_resave_bumps_version() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();
        let ws = store.create_workspace("mine").unwrap();

        save_one(&store, ws, "asm", json!({"v": 1}));
        let second = save_one(&store, ws, "asm", json!({"v": 2}));
        let other = save_one(&store, ws, "other", json!({"v": 3}));

        assert_eq!((second.object_id, second.version), (1, 2));
        assert_eq!((other.object_id, other.version), (2, 1));
        assert_eq!(
            store.get_object_data(&format!("{}/1", ws), &[]).unwrap(),
            json!({"v": 2})
        );
        assert_eq!(
            store.get_object_data(&format!("{}/1/1", ws), &[]).unwrap(),
            json!({"v": 1})
        );
    }

    #[test]
    fn test_reference_path_uses_last_element() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();
        let ws = store.create_workspace("mine").unwrap();
        let info = save_one(&store, ws, "asm", json!({}));

        let path = format!("{}/9/9;{}", ws, info.upa());
        assert_eq!(store.get_object_info(&path).unwrap().name, "asm");
    }

    #[test]
    fn test_missing_objects_and_workspaces() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path()).unwrap();

        assert!(matches!(
            store.resolve_name_to_id("nope"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.get_object_info("1/1/1"),
            Err(StoreError::NotFound(_))
        ));
        assert!(store.get_object_info("garbage").is_err());
    }
}
