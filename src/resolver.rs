//! Resolution of container objects down to FASTA files
//!
//! Every recognized object type maps to one [`ObjectKind`]; each kind has an
//! explicit expansion into the assemblies it holds. Unknown types are errors.

use crate::export::AssemblyExporter;
use crate::workspace::ScratchSpace;
use assembly_core::{AssemblyError, AssemblyResult};
use assembly_storage::{BinnedContigsService, ObjectStore};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Object types that can be resolved to FASTA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// `KBaseSets.GenomeSet`, genome refs under `items[].ref`
    GenomeSet,
    /// `KBaseSearch.GenomeSet`, genome refs under `elements{}.ref`
    SearchGenomeSet,
    Genome,
    Assembly,
    ContigSet,
    AssemblySet,
    BinnedContigs,
    AnnotatedMetagenomeAssembly,
}

impl ObjectKind {
    /// Parse a type string such as `KBaseGenomes.Genome-17.0`; the version is ignored
    pub fn from_type_string(type_string: &str) -> Option<Self> {
        let name = type_string
            .split_once('-')
            .map(|(name, _)| name)
            .unwrap_or(type_string);
        let kind = match name {
            "KBaseSets.GenomeSet" => ObjectKind::GenomeSet,
            "KBaseSearch.GenomeSet" => ObjectKind::SearchGenomeSet,
            "KBaseGenomes.Genome" => ObjectKind::Genome,
            "KBaseGenomeAnnotations.Assembly" => ObjectKind::Assembly,
            "KBaseGenomes.ContigSet" => ObjectKind::ContigSet,
            "KBaseSets.AssemblySet" => ObjectKind::AssemblySet,
            "KBaseMetagenomes.BinnedContigs" => ObjectKind::BinnedContigs,
            "KBaseMetagenomes.AnnotatedMetagenomeAssembly" => {
                ObjectKind::AnnotatedMetagenomeAssembly
            }
            _ => return None,
        };
        Some(kind)
    }
}

/// One FASTA file and the reference path it was produced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastaResolution {
    pub path: PathBuf,
    #[serde(rename = "ref")]
    pub reference: String,
}

pub struct TypeResolver {
    objects: Arc<dyn ObjectStore>,
    exporter: AssemblyExporter,
    binned: Arc<dyn BinnedContigsService>,
    scratch: ScratchSpace,
}

impl TypeResolver {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        exporter: AssemblyExporter,
        binned: Arc<dyn BinnedContigsService>,
        scratch: ScratchSpace,
    ) -> Self {
        Self {
            objects,
            exporter,
            binned,
            scratch,
        }
    }

    /// Resolve every reference to FASTA files, in input order
    pub fn get_fastas(&self, refs: &[String]) -> AssemblyResult<Vec<FastaResolution>> {
        if refs.is_empty() {
            return Err(AssemblyError::InvalidInput(
                "Must provide reference list.".to_string(),
            ));
        }

        let mut resolved = Vec::new();
        for reference in refs {
            let info = self
                .objects
                .get_object_info(reference)
                .map_err(|e| AssemblyError::from_store(e, "get_object_info"))?;
            let kind = ObjectKind::from_type_string(&info.type_string)
                .ok_or_else(|| AssemblyError::UnsupportedType(info.type_string.clone()))?;
            debug!("Resolving {} as {:?}", reference, kind);

            let before = resolved.len();
            self.resolve(reference, kind, &mut resolved)?;
            info!(
                "Resolved {} to {} FASTA file(s)",
                reference,
                resolved.len() - before
            );
        }
        Ok(resolved)
    }

    fn resolve(
        &self,
        reference: &str,
        kind: ObjectKind,
        out: &mut Vec<FastaResolution>,
    ) -> AssemblyResult<()> {
        match kind {
            ObjectKind::GenomeSet => {
                let data = self.object_data(reference, "items")?;
                for genome in refs_in_list(&data, "items", reference)? {
                    self.resolve_genome(&genome, out)?;
                }
            }
            ObjectKind::SearchGenomeSet => {
                let data = self.object_data(reference, "elements")?;
                let elements = data
                    .get("elements")
                    .and_then(Value::as_object)
                    .ok_or_else(|| missing_field(reference, "elements"))?;
                for element in elements.values() {
                    let genome = element
                        .get("ref")
                        .and_then(Value::as_str)
                        .ok_or_else(|| missing_field(reference, "elements.ref"))?;
                    self.resolve_genome(genome, out)?;
                }
            }
            ObjectKind::Genome => self.resolve_genome(reference, out)?,
            ObjectKind::Assembly | ObjectKind::ContigSet => {
                out.push(self.export(reference)?);
            }
            ObjectKind::AssemblySet => {
                let data = self.object_data(reference, "items")?;
                for item in refs_in_list(&data, "items", reference)? {
                    out.push(self.export(&item)?);
                }
            }
            ObjectKind::BinnedContigs => self.resolve_bins(reference, out)?,
            ObjectKind::AnnotatedMetagenomeAssembly => {
                let data = self.object_data(reference, "assembly_ref")?;
                let assembly = data
                    .get("assembly_ref")
                    .and_then(Value::as_str)
                    .ok_or_else(|| missing_field(reference, "assembly_ref"))?;
                out.push(self.export(assembly)?);
            }
        }
        Ok(())
    }

    /// Export a genome's assembly through the `genome;assembly` reference path
    fn resolve_genome(&self, genome: &str, out: &mut Vec<FastaResolution>) -> AssemblyResult<()> {
        let data = self
            .objects
            .get_object_data(genome, &[])
            .map_err(|e| AssemblyError::from_store(e, "get_object_data"))?;
        let assembly = ["contigset_ref", "assembly_ref"]
            .iter()
            .find_map(|field| data.get(*field).and_then(Value::as_str).filter(|s| !s.is_empty()))
            .ok_or_else(|| missing_field(genome, "assembly_ref"))?;

        let path = format!("{};{}", genome, assembly);
        out.push(self.export(&path)?);
        Ok(())
    }

    /// Copy each bin file into scratch and report it against the binned-contigs ref
    fn resolve_bins(&self, reference: &str, out: &mut Vec<FastaResolution>) -> AssemblyResult<()> {
        let work_dir = self.scratch.create_dir("binned_contigs")?;
        let bin_dir = self
            .binned
            .binned_contigs_to_fasta(reference, &work_dir)
            .map_err(|e| AssemblyError::from_store(e, "binned_contigs_to_fasta"))?;

        let mut bins: Vec<PathBuf> = fs::read_dir(&bin_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        bins.sort();

        for bin in bins {
            let Some(file_name) = bin.file_name() else {
                continue;
            };
            let dest = work_dir.join(file_name);
            fs::copy(&bin, &dest)?;
            out.push(FastaResolution {
                path: dest,
                reference: reference.to_string(),
            });
        }
        Ok(())
    }

    fn export(&self, reference: &str) -> AssemblyResult<FastaResolution> {
        let file = self.exporter.assembly_as_fasta(reference, None)?;
        Ok(FastaResolution {
            path: file.path,
            reference: reference.to_string(),
        })
    }

    fn object_data(&self, reference: &str, field: &str) -> AssemblyResult<Value> {
        self.objects
            .get_object_data(reference, &[field.to_string()])
            .map_err(|e| AssemblyError::from_store(e, "get_object_data"))
    }
}

fn missing_field(reference: &str, field: &str) -> AssemblyError {
    AssemblyError::NotFound(format!("Object {} has no {} field", reference, field))
}

/// `<field>[].ref` values of a set object
fn refs_in_list(data: &Value, field: &str, reference: &str) -> AssemblyResult<Vec<String>> {
    let items = data
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| missing_field(reference, field))?;
    items
        .iter()
        .map(|item| {
            item.get("ref")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| missing_field(reference, &format!("{}.ref", field)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_ignores_version_suffix() {
        assert_eq!(
            ObjectKind::from_type_string("KBaseGenomes.Genome-17.0"),
            Some(ObjectKind::Genome)
        );
        assert_eq!(
            ObjectKind::from_type_string("KBaseGenomeAnnotations.Assembly"),
            Some(ObjectKind::Assembly)
        );
        assert_eq!(
            ObjectKind::from_type_string("KBaseSearch.GenomeSet-2.1"),
            Some(ObjectKind::SearchGenomeSet)
        );
    }

    #[test]
    fn test_kind_rejects_near_misses() {
        assert_eq!(ObjectKind::from_type_string("KBaseGenomes.GenomeX-1.0"), None);
        assert_eq!(ObjectKind::from_type_string("KBaseFBA.FBAModel-1.0"), None);
    }

    #[test]
    fn test_refs_in_list() {
        let data = json!({"items": [{"ref": "1/2/3"}, {"ref": "1/4/1", "label": "x"}]});
        assert_eq!(
            refs_in_list(&data, "items", "1/9/1").unwrap(),
            vec!["1/2/3".to_string(), "1/4/1".to_string()]
        );

        let broken = json!({"items": [{"label": "x"}]});
        let err = refs_in_list(&broken, "items", "1/9/1").unwrap_err();
        assert_eq!(err.to_string(), "Object 1/9/1 has no items.ref field");
    }
}
