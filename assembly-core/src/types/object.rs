//! Object store identities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Type tag under which assemblies are saved
pub const ASSEMBLY_TYPE: &str = "KBaseGenomeAnnotations.Assembly";

/// Metadata returned by the object store for one stored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub object_id: u64,
    pub name: String,
    /// Fully qualified type string, e.g. `KBaseGenomeAnnotations.Assembly-6.0`
    #[serde(rename = "type")]
    pub type_string: String,
    pub save_date: String,
    pub version: u64,
    pub saved_by: String,
    pub workspace_id: u64,
    pub workspace_name: String,
    pub checksum: String,
    pub size: u64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ObjectInfo {
    /// Stable `workspace/object/version` address of this object
    pub fn upa(&self) -> Upa {
        Upa {
            workspace_id: self.workspace_id,
            object_id: self.object_id,
            version: self.version,
        }
    }

    /// Type name with the version suffix stripped
    pub fn type_name(&self) -> &str {
        self.type_string
            .split_once('-')
            .map(|(name, _)| name)
            .unwrap_or(&self.type_string)
    }
}

/// `workspace_id/object_id/version` triple addressing one stored object version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Upa {
    pub workspace_id: u64,
    pub object_id: u64,
    pub version: u64,
}

impl fmt::Display for Upa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.workspace_id, self.object_id, self.version)
    }
}

impl FromStr for Upa {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 3 {
            return Err(format!("Invalid object address '{}': expected ws/obj/ver", s));
        }
        let parse = |part: &str| {
            part.parse::<u64>()
                .map_err(|_| format!("Invalid object address '{}': '{}' is not a number", s, part))
        };
        Ok(Upa {
            workspace_id: parse(parts[0])?,
            object_id: parse(parts[1])?,
            version: parse(parts[2])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> ObjectInfo {
        ObjectInfo {
            object_id: 7,
            name: "my_assembly".to_string(),
            type_string: "KBaseGenomeAnnotations.Assembly-6.3".to_string(),
            save_date: "2026-01-01T00:00:00+0000".to_string(),
            version: 2,
            saved_by: "someone".to_string(),
            workspace_id: 42,
            workspace_name: "ws42".to_string(),
            checksum: "e96bb836615d7ba20044f8b27dd5c115".to_string(),
            size: 512,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_upa_from_info() {
        let info = sample_info();
        assert_eq!(info.upa().to_string(), "42/7/2");
        assert_eq!(info.type_name(), ASSEMBLY_TYPE);
    }

    #[test]
    fn test_upa_parse() {
        let upa: Upa = "1/2/3".parse().unwrap();
        assert_eq!(
            upa,
            Upa {
                workspace_id: 1,
                object_id: 2,
                version: 3
            }
        );
        assert!("1/2".parse::<Upa>().is_err());
        assert!("1/x/3".parse::<Upa>().is_err());
    }

    #[test]
    fn test_type_name_without_version() {
        let mut info = sample_info();
        info.type_string = "KBaseSets.AssemblySet".to_string();
        assert_eq!(info.type_name(), "KBaseSets.AssemblySet");
    }
}
