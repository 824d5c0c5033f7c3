//! In-memory object store for testing
//!
//! Records every call, assigns sequential object ids per workspace and can be
//! scripted to fail or stall specific `save_objects` calls.

use assembly_core::{md5_hex, ObjectInfo, StoreError, StoreResult};
use assembly_storage::{ObjectStore, ObjectToSave};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// A failure to inject into a store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// Empty response body (`Content-Length: 0`)
    EmptyContent,
    Service(String),
}

impl ScriptedFailure {
    pub fn to_error(&self) -> StoreError {
        match self {
            ScriptedFailure::EmptyContent => StoreError::EmptyContent,
            ScriptedFailure::Service(msg) => StoreError::Service(msg.clone()),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredVersion {
    info: ObjectInfo,
    data: serde_json::Value,
}

#[derive(Debug, Default)]
struct State {
    workspaces: HashMap<String, u64>,
    /// (workspace, object) -> versions, oldest first
    objects: HashMap<(u64, u64), Vec<StoredVersion>>,
    names: HashMap<(u64, String), u64>,
    next_object: HashMap<u64, u64>,
    save_calls: usize,
    /// 1-based save call number -> failure
    save_failures: HashMap<usize, ScriptedFailure>,
    /// object name -> delay applied before saving a batch containing it
    save_delays: HashMap<String, Duration>,
    /// names saved by each successful save call
    batches: Vec<Vec<String>>,
}

/// In-memory [`ObjectStore`] for tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    state: Arc<RwLock<State>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workspace name for [`ObjectStore::resolve_name_to_id`]
    pub fn with_workspace(self, name: &str, id: u64) -> Self {
        self.state.write().workspaces.insert(name.to_string(), id);
        self
    }

    /// Make the n-th (1-based) `save_objects` call fail
    pub fn fail_save_call(&self, call_number: usize, failure: ScriptedFailure) {
        self.state.write().save_failures.insert(call_number, failure);
    }

    /// Stall any save that includes an object with this name
    pub fn delay_save_of(&self, name: &str, delay: Duration) {
        self.state.write().save_delays.insert(name.to_string(), delay);
    }

    /// Store an object of any type directly, bypassing call recording
    pub fn insert_object(
        &self,
        workspace_id: u64,
        name: &str,
        type_string: &str,
        data: serde_json::Value,
    ) -> ObjectInfo {
        let mut state = self.state.write();
        Self::store(&mut state, workspace_id, name, type_string, data)
    }

    fn store(
        state: &mut State,
        workspace_id: u64,
        name: &str,
        type_string: &str,
        data: serde_json::Value,
    ) -> ObjectInfo {
        let object_id = match state.names.get(&(workspace_id, name.to_string())) {
            Some(id) => *id,
            None => {
                let next = state.next_object.entry(workspace_id).or_insert(0);
                *next += 1;
                let id = *next;
                state.names.insert((workspace_id, name.to_string()), id);
                id
            }
        };
        let versions = state.objects.entry((workspace_id, object_id)).or_default();
        let serialized = serde_json::to_vec(&data).unwrap_or_default();
        let info = ObjectInfo {
            object_id,
            name: name.to_string(),
            type_string: type_string.to_string(),
            save_date: "2026-01-01T00:00:00+00:00".to_string(),
            version: versions.len() as u64 + 1,
            saved_by: "test".to_string(),
            workspace_id,
            workspace_name: format!("ws_{}", workspace_id),
            checksum: md5_hex(&serialized),
            size: serialized.len() as u64,
            metadata: BTreeMap::new(),
        };
        versions.push(StoredVersion {
            info: info.clone(),
            data,
        });
        info
    }

    fn lookup(&self, reference: &str) -> StoreResult<StoredVersion> {
        let target = reference.rsplit(';').next().unwrap_or(reference);
        let parts: Vec<&str> = target.split('/').collect();
        let state = self.state.read();
        let not_found = || StoreError::NotFound(format!("No object with reference {}", reference));

        if parts.len() < 2 || parts.len() > 3 {
            return Err(StoreError::Service(format!("Invalid object reference: {}", reference)));
        }
        let workspace_id = match parts[0].parse::<u64>() {
            Ok(id) => id,
            Err(_) => *state.workspaces.get(parts[0]).ok_or_else(not_found)?,
        };
        let object_id = match parts[1].parse::<u64>() {
            Ok(id) => id,
            Err(_) => *state
                .names
                .get(&(workspace_id, parts[1].to_string()))
                .ok_or_else(not_found)?,
        };
        let versions = state
            .objects
            .get(&(workspace_id, object_id))
            .ok_or_else(not_found)?;
        let stored = match parts.get(2).and_then(|v| v.parse::<usize>().ok()) {
            Some(v) if v >= 1 => versions.get(v - 1),
            Some(_) => None,
            None => versions.last(),
        };
        stored.cloned().ok_or_else(not_found)
    }

    /// Number of stored objects across all workspaces
    pub fn object_count(&self) -> usize {
        self.state.read().objects.len()
    }

    /// Latest data saved under `name` in `workspace_id`
    pub fn saved_data(&self, workspace_id: u64, name: &str) -> Option<serde_json::Value> {
        let state = self.state.read();
        let id = state.names.get(&(workspace_id, name.to_string()))?;
        state
            .objects
            .get(&(workspace_id, *id))
            .and_then(|v| v.last())
            .map(|v| v.data.clone())
    }

    /// Object names written by each successful `save_objects` call
    pub fn save_batches(&self) -> Vec<Vec<String>> {
        self.state.read().batches.clone()
    }

    /// Get recorded method calls (for verification in tests)
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    fn record_call(&self, call: impl Into<String>) {
        self.calls.write().push(call.into());
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn resolve_name_to_id(&self, name: &str) -> StoreResult<u64> {
        self.record_call(format!("resolve_name_to_id({})", name));
        self.state
            .read()
            .workspaces
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("No workspace with name {} exists", name)))
    }

    fn get_object_info(&self, reference: &str) -> StoreResult<ObjectInfo> {
        self.record_call(format!("get_object_info({})", reference));
        Ok(self.lookup(reference)?.info)
    }

    fn get_object_data(&self, reference: &str, fields: &[String]) -> StoreResult<serde_json::Value> {
        self.record_call(format!("get_object_data({})", reference));
        let data = self.lookup(reference)?.data;
        if fields.is_empty() {
            return Ok(data);
        }
        let mut subset = serde_json::Map::new();
        for field in fields {
            if let Some(value) = data.get(field) {
                subset.insert(field.clone(), value.clone());
            }
        }
        Ok(serde_json::Value::Object(subset))
    }

    fn save_objects(
        &self,
        workspace_id: u64,
        objects: Vec<ObjectToSave>,
    ) -> StoreResult<Vec<ObjectInfo>> {
        let names: Vec<String> = objects.iter().map(|o| o.name.clone()).collect();
        self.record_call(format!("save_objects({}, [{}])", workspace_id, names.join(", ")));

        let (call_number, failure, delay) = {
            let mut state = self.state.write();
            state.save_calls += 1;
            let call_number = state.save_calls;
            let failure = state.save_failures.get(&call_number).cloned();
            let delay = names
                .iter()
                .filter_map(|n| state.save_delays.get(n).copied())
                .max();
            (call_number, failure, delay)
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if let Some(failure) = failure {
            self.record_call(format!("save_objects call {} failed", call_number));
            return Err(failure.to_error());
        }

        let mut state = self.state.write();
        let infos: Vec<ObjectInfo> = objects
            .into_iter()
            .map(|o| Self::store(&mut state, workspace_id, &o.name, &o.type_tag, o.data))
            .collect();
        state.batches.push(names);
        Ok(infos)
    }
}
