//! Request parameters and their validation into typed import requests

use assembly_bio::ContigOverrides;
use assembly_core::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Where the FASTA bytes of one request come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Local file, hard-linked into scratch before use
    File(PathBuf),
    /// Blob store id, downloaded into scratch
    Blob(String),
}

impl InputSource {
    pub fn kind(&self) -> &'static str {
        match self {
            InputSource::File(_) => "file",
            InputSource::Blob(_) => "node",
        }
    }
}

/// Caller-supplied fields copied onto the saved record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub assembly_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source_origination_date: Option<String>,
}

/// One validated FASTA source and the name to save it under
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    pub source: InputSource,
    pub assembly_name: String,
    pub metadata: RecordMetadata,
    pub contig_info: ContigOverrides,
}

/// Validated requests sharing a target workspace, source kind and filter
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch {
    pub workspace_id: u64,
    pub min_contig_length: Option<u64>,
    pub requests: Vec<ImportRequest>,
}

impl ImportBatch {
    /// Same settings, different requests
    pub fn with_requests(&self, requests: Vec<ImportRequest>) -> Self {
        Self {
            workspace_id: self.workspace_id,
            min_contig_length: self.min_contig_length,
            requests,
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Target workspace of a single-record import
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceTarget {
    Id(u64),
    /// Mutable name, resolved through the object store
    Name(String),
}

/// `file` parameter of a single-record import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Value>,
}

/// Parameters of a single-record import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveAssemblyParams {
    #[serde(default)]
    pub workspace_id: Option<Value>,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub assembly_name: Option<String>,
    #[serde(default)]
    pub file: Option<Value>,
    #[serde(default)]
    pub shock_id: Option<String>,
    #[serde(default)]
    pub min_contig_length: Option<Value>,
    #[serde(flatten)]
    pub metadata: RecordMetadata,
    #[serde(default)]
    pub contig_info: Option<ContigOverrides>,
}

/// One entry of a mass import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportInput {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub assembly_name: Option<String>,
    #[serde(flatten)]
    pub metadata: RecordMetadata,
    #[serde(default)]
    pub contig_info: Option<ContigOverrides>,
}

/// Parameters of a mass import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassImportParams {
    #[serde(default)]
    pub workspace_id: Option<Value>,
    /// List of [`ImportInput`] mappings; kept loose so shape errors get domain messages
    #[serde(default)]
    pub inputs: Option<Value>,
    #[serde(default)]
    pub min_contig_length: Option<Value>,
}

fn invalid(msg: impl Into<String>) -> AssemblyError {
    AssemblyError::InvalidInput(msg.into())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// An optional integer parameter that must be at least `minimum` when present
pub(crate) fn get_int(value: Option<&Value>, name: &str, minimum: u64) -> AssemblyResult<Option<u64>> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };
    let int = match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n.as_i64().unwrap_or(i64::MAX),
        other => {
            return Err(invalid(format!("{} must be an integer, got: {}", name, other)));
        }
    };
    if int < minimum as i64 {
        return Err(invalid(format!("{} must be an integer >= {}", name, minimum)));
    }
    Ok(Some(int as u64))
}

impl SaveAssemblyParams {
    /// Validate into a workspace target and a one-request batch template.
    ///
    /// The batch's `workspace_id` is 0 when the target is a name; the caller
    /// resolves it before importing.
    pub fn validate(self) -> AssemblyResult<(WorkspaceTarget, ImportBatch)> {
        let workspace_id = get_int(self.workspace_id.as_ref(), "workspace_id", 1)?;
        let workspace_name = non_empty(&self.workspace_name).map(str::to_string);
        let target = match (workspace_id, workspace_name) {
            (Some(id), None) => WorkspaceTarget::Id(id),
            (None, Some(name)) => WorkspaceTarget::Name(name),
            _ => {
                return Err(invalid(
                    "Exactly one of a workspace_id or a workspace_name must be provided",
                ))
            }
        };

        let assembly_name = non_empty(&self.assembly_name)
            .ok_or_else(|| invalid("Required parameter assembly_name was not defined"))?
            .to_string();

        let file = self.file.as_ref().filter(|f| is_truthy(f));
        let shock_id = non_empty(&self.shock_id);
        let source = match (file, shock_id) {
            (Some(file), None) => {
                let path = file
                    .get("path")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        invalid(
                            "When specifying a FASTA file input, \"path\" field was not defined in \"file\"",
                        )
                    })?;
                InputSource::File(PathBuf::from(path))
            }
            (None, Some(id)) => InputSource::Blob(id.to_string()),
            _ => return Err(invalid("Exactly one of file or shock_id is required")),
        };

        let min_contig_length = get_int(
            self.min_contig_length.as_ref(),
            "If provided, min_contig_length",
            1,
        )?;

        let request = ImportRequest {
            source,
            assembly_name,
            metadata: self.metadata,
            contig_info: self.contig_info.unwrap_or_default(),
        };
        let batch = ImportBatch {
            workspace_id: match target {
                WorkspaceTarget::Id(id) => id,
                WorkspaceTarget::Name(_) => 0,
            },
            min_contig_length,
            requests: vec![request],
        };
        Ok((target, batch))
    }
}

impl MassImportParams {
    pub fn validate(self) -> AssemblyResult<ImportBatch> {
        let workspace_id = get_int(self.workspace_id.as_ref(), "workspace_id", 1)?
            .ok_or_else(|| invalid("workspace_id is required"))?;

        let entries = match self.inputs {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            _ => return Err(invalid("inputs field is required and must be a non-empty list")),
        };
        if let Some(i) = entries.iter().position(|entry| !entry.is_object()) {
            return Err(invalid(format!(
                "Entry #{} in inputs field is not a mapping as required",
                i + 1
            )));
        }
        let inputs = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                serde_json::from_value::<ImportInput>(entry).map_err(|e| {
                    invalid(format!("Entry #{} in inputs field is malformed: {}", i + 1, e))
                })
            })
            .collect::<AssemblyResult<Vec<_>>>()?;

        let use_file = match (non_empty(&inputs[0].file), non_empty(&inputs[0].node)) {
            (Some(_), None) => true,
            (None, Some(_)) => false,
            _ => {
                return Err(invalid(
                    "Entry #1 in inputs field must have exactly one of file or node specified",
                ))
            }
        };
        let field = if use_file { "file" } else { "node" };

        let mut requests = Vec::with_capacity(inputs.len());
        for (i, input) in inputs.into_iter().enumerate() {
            let entry = i + 1;
            let location = if use_file {
                non_empty(&input.file)
            } else {
                non_empty(&input.node)
            }
            .ok_or_else(|| {
                invalid(format!(
                    "Entry #{} in inputs must have a {} field to match entry #1",
                    entry, field
                ))
            })?;
            let source = if use_file {
                InputSource::File(PathBuf::from(location))
            } else {
                InputSource::Blob(location.to_string())
            };

            let assembly_name = non_empty(&input.assembly_name)
                .ok_or_else(|| {
                    invalid(format!("Missing assembly_name field in inputs entry #{}", entry))
                })?
                .to_string();

            requests.push(ImportRequest {
                source,
                assembly_name,
                metadata: input.metadata,
                contig_info: input.contig_info.unwrap_or_default(),
            });
        }

        let min_contig_length = get_int(
            self.min_contig_length.as_ref(),
            "If provided, min_contig_length",
            2,
        )?;

        Ok(ImportBatch {
            workspace_id,
            min_contig_length,
            requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn single(value: Value) -> AssemblyResult<(WorkspaceTarget, ImportBatch)> {
        serde_json::from_value::<SaveAssemblyParams>(value)
            .unwrap()
            .validate()
    }

    fn mass(value: Value) -> AssemblyResult<ImportBatch> {
        serde_json::from_value::<MassImportParams>(value)
            .unwrap()
            .validate()
    }

    #[test]
    fn test_single_file_request() {
        let (target, batch) = single(json!({
            "workspace_id": 12,
            "assembly_name": "asm",
            "file": {"path": "/data/genome.fa"},
            "type": "isolate",
            "external_source": "RefSeq",
            "contig_info": {"s1": {"is_circ": 1}},
        }))
        .unwrap();

        assert_eq!(target, WorkspaceTarget::Id(12));
        assert_eq!(batch.workspace_id, 12);
        assert_eq!(batch.min_contig_length, None);
        let request = &batch.requests[0];
        assert_eq!(request.source, InputSource::File(PathBuf::from("/data/genome.fa")));
        assert_eq!(request.metadata.assembly_type.as_deref(), Some("isolate"));
        assert_eq!(request.metadata.external_source.as_deref(), Some("RefSeq"));
        assert_eq!(request.contig_info["s1"].is_circ, Some(1));
    }

    #[test]
    fn test_single_blob_request_by_workspace_name() {
        let (target, batch) = single(json!({
            "workspace_name": "my_ws",
            "assembly_name": "asm",
            "shock_id": "abc-123",
            "min_contig_length": 1,
        }))
        .unwrap();
        assert_eq!(target, WorkspaceTarget::Name("my_ws".to_string()));
        assert_eq!(batch.requests[0].source, InputSource::Blob("abc-123".to_string()));
        assert_eq!(batch.min_contig_length, Some(1));
    }

    #[rstest]
    #[case(json!({"assembly_name": "a", "shock_id": "x"}),
           "Exactly one of a workspace_id or a workspace_name must be provided")]
    #[case(json!({"workspace_id": 1, "workspace_name": "w", "assembly_name": "a", "shock_id": "x"}),
           "Exactly one of a workspace_id or a workspace_name must be provided")]
    #[case(json!({"workspace_id": 0, "assembly_name": "a", "shock_id": "x"}),
           "workspace_id must be an integer >= 1")]
    #[case(json!({"workspace_id": "7", "assembly_name": "a", "shock_id": "x"}),
           "workspace_id must be an integer, got: \"7\"")]
    #[case(json!({"workspace_id": 1, "shock_id": "x"}),
           "Required parameter assembly_name was not defined")]
    #[case(json!({"workspace_id": 1, "assembly_name": "", "shock_id": "x"}),
           "Required parameter assembly_name was not defined")]
    #[case(json!({"workspace_id": 1, "assembly_name": "a"}),
           "Exactly one of file or shock_id is required")]
    #[case(json!({"workspace_id": 1, "assembly_name": "a", "file": {"path": "/f.fa"}, "shock_id": "x"}),
           "Exactly one of file or shock_id is required")]
    #[case(json!({"workspace_id": 1, "assembly_name": "a", "file": {"pth": "/f.fa"}}),
           "When specifying a FASTA file input, \"path\" field was not defined in \"file\"")]
    #[case(json!({"workspace_id": 1, "assembly_name": "a", "shock_id": "x", "min_contig_length": 0}),
           "If provided, min_contig_length must be an integer >= 1")]
    #[case(json!({"workspace_id": 1, "assembly_name": "a", "shock_id": "x", "min_contig_length": 2.5}),
           "If provided, min_contig_length must be an integer, got: 2.5")]
    fn test_single_validation_errors(#[case] params: Value, #[case] expected: &str) {
        let err = single(params).unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidInput(_)));
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_mass_entry_with_wrong_field_type() {
        let err = mass(json!({
            "workspace_id": 1,
            "inputs": [{"file": "/a.fa", "assembly_name": "a"}, {"file": 7, "assembly_name": "b"}],
        }))
        .unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidInput(_)));
        assert!(err
            .to_string()
            .starts_with("Entry #2 in inputs field is malformed:"));
    }

    #[test]
    fn test_mass_request() {
        let batch = mass(json!({
            "workspace_id": 3,
            "min_contig_length": 9,
            "inputs": [
                {"file": "/a.fa", "assembly_name": "a"},
                {"file": "/b.fa", "assembly_name": "b", "type": "metagenome"},
            ],
        }))
        .unwrap();

        assert_eq!(batch.workspace_id, 3);
        assert_eq!(batch.min_contig_length, Some(9));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.requests[1].source, InputSource::File(PathBuf::from("/b.fa")));
        assert_eq!(
            batch.requests[1].metadata.assembly_type.as_deref(),
            Some("metagenome")
        );
    }

    #[rstest]
    #[case(json!({"inputs": [{"file": "/a.fa", "assembly_name": "a"}]}),
           "workspace_id is required")]
    #[case(json!({"workspace_id": 1}),
           "inputs field is required and must be a non-empty list")]
    #[case(json!({"workspace_id": 1, "inputs": []}),
           "inputs field is required and must be a non-empty list")]
    #[case(json!({"workspace_id": 1, "inputs": "/a.fa"}),
           "inputs field is required and must be a non-empty list")]
    #[case(json!({"workspace_id": 1, "inputs": [{"file": "/a.fa", "assembly_name": "a"}, "/b.fa"]}),
           "Entry #2 in inputs field is not a mapping as required")]
    #[case(json!({"workspace_id": 1, "inputs": [{"file": "/a.fa", "node": "n"}, {}, ["/c.fa"]]}),
           "Entry #3 in inputs field is not a mapping as required")]
    #[case(json!({"workspace_id": 1, "inputs": [{"file": "/a.fa", "node": "n", "assembly_name": "a"}]}),
           "Entry #1 in inputs field must have exactly one of file or node specified")]
    #[case(json!({"workspace_id": 1, "inputs": [{"assembly_name": "a"}]}),
           "Entry #1 in inputs field must have exactly one of file or node specified")]
    #[case(json!({"workspace_id": 1, "inputs": [
                {"file": "/a.fa", "assembly_name": "a"},
                {"node": "n", "assembly_name": "b"}]}),
           "Entry #2 in inputs must have a file field to match entry #1")]
    #[case(json!({"workspace_id": 1, "inputs": [
                {"node": "n1", "assembly_name": "a"},
                {"node": "n2", "assembly_name": "b"},
                {"file": "/c.fa", "assembly_name": "c"}]}),
           "Entry #3 in inputs must have a node field to match entry #1")]
    #[case(json!({"workspace_id": 1, "inputs": [
                {"file": "/a.fa", "assembly_name": "a"},
                {"file": "/b.fa"}]}),
           "Missing assembly_name field in inputs entry #2")]
    #[case(json!({"workspace_id": 1, "min_contig_length": 1,
                  "inputs": [{"file": "/a.fa", "assembly_name": "a"}]}),
           "If provided, min_contig_length must be an integer >= 2")]
    fn test_mass_validation_errors(#[case] params: Value, #[case] expected: &str) {
        let err = mass(params).unwrap_err();
        assert_eq!(err.to_string(), expected);
    }
}
