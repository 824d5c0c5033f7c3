use serde::{Deserialize, Serialize};

/// One object handed to [`ObjectStore::save_objects`](crate::ObjectStore::save_objects)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectToSave {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub data: serde_json::Value,
    pub name: String,
}

/// Handle record created for an uploaded blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleInfo {
    /// Handle id, referenced from stored objects
    pub hid: String,
    pub file_name: String,
    /// Blob id the handle points at
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub handle_type: String,
    pub remote_md5: String,
}

/// Result of uploading one file to the blob store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobUpload {
    pub shock_id: String,
    pub handle: HandleInfo,
    pub node_file_name: String,
    pub size: u64,
}
