//! Materialize stored Assembly and ContigSet objects as local FASTA files

use crate::resolver::ObjectKind;
use crate::workspace::ScratchSpace;
use assembly_bio::{write_fasta, FastaRecord};
use assembly_core::{AssemblyError, AssemblyResult, ObjectInfo};
use assembly_storage::{BlobStore, ObjectStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use zip::write::{FileOptions, ZipWriter};

/// Name of the object info document inside an export package
pub const PACKAGE_INFO_FILE: &str = "info.json";

/// A FASTA file written for a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastaFile {
    pub path: PathBuf,
    pub assembly_name: String,
}

/// Object info and provenance written next to the FASTA in an export package
#[derive(Debug, Serialize)]
struct PackageInfo<'a> {
    object_info: &'a ObjectInfo,
    provenance: Provenance<'a>,
}

#[derive(Debug, Serialize)]
struct Provenance<'a> {
    input_ref: &'a str,
    service: &'static str,
    service_ver: &'static str,
    method: &'static str,
}

/// Inline contig of a legacy ContigSet object
#[derive(Debug, Deserialize)]
struct LegacyContig {
    id: String,
    #[serde(default)]
    description: Option<String>,
    sequence: String,
}

#[derive(Clone)]
pub struct AssemblyExporter {
    objects: Arc<dyn ObjectStore>,
    blobs: Arc<dyn BlobStore>,
    scratch: ScratchSpace,
}

impl AssemblyExporter {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        blobs: Arc<dyn BlobStore>,
        scratch: ScratchSpace,
    ) -> Self {
        Self {
            objects,
            blobs,
            scratch,
        }
    }

    /// Write the object at `reference` to a FASTA file in a fresh scratch directory.
    ///
    /// `filename` names the output file; otherwise the stored file name is
    /// kept (Assembly) or `<object name>.fa` is used (ContigSet).
    pub fn assembly_as_fasta(
        &self,
        reference: &str,
        filename: Option<&str>,
    ) -> AssemblyResult<FastaFile> {
        let info = self.object_info(reference)?;
        self.export_object(reference, &info, filename)
    }

    /// Package the FASTA of `reference` with its object info into a zip
    /// archive, upload it to the blob store and return the archive's blob id.
    pub fn export_as_fasta(&self, reference: &str) -> AssemblyResult<String> {
        let info = self.object_info(reference)?;
        let fasta = self.export_object(reference, &info, None)?;

        let dir = self.scratch.create_dir("assembly_package")?;
        let archive = dir.join(format!("{}.zip", info.name));
        let package = PackageInfo {
            object_info: &info,
            provenance: Provenance {
                input_ref: reference,
                service: env!("CARGO_PKG_NAME"),
                service_ver: env!("CARGO_PKG_VERSION"),
                method: "export_assembly_as_fasta",
            },
        };
        write_package(&archive, &fasta.path, &package)?;

        let upload = self
            .blobs
            .upload_file(&archive)
            .map_err(|e| AssemblyError::from_store(e, "upload_file"))?;
        info!(
            "Packaged {} as {} (blob {})",
            reference,
            archive.display(),
            upload.shock_id
        );
        Ok(upload.shock_id)
    }

    fn object_info(&self, reference: &str) -> AssemblyResult<ObjectInfo> {
        self.objects
            .get_object_info(reference)
            .map_err(|e| AssemblyError::from_store(e, "get_object_info"))
    }

    fn export_object(
        &self,
        reference: &str,
        info: &ObjectInfo,
        filename: Option<&str>,
    ) -> AssemblyResult<FastaFile> {
        match ObjectKind::from_type_string(&info.type_string) {
            Some(ObjectKind::Assembly) => self.export_assembly(reference, &info.name, filename),
            Some(ObjectKind::ContigSet) => self.export_contig_set(reference, &info.name, filename),
            _ => Err(AssemblyError::UnsupportedType(info.type_string.clone())),
        }
    }

    fn export_assembly(
        &self,
        reference: &str,
        name: &str,
        filename: Option<&str>,
    ) -> AssemblyResult<FastaFile> {
        let data = self
            .objects
            .get_object_data(reference, &["fasta_handle_info".to_string()])
            .map_err(|e| AssemblyError::from_store(e, "get_object_data"))?;
        let blob_id = data
            .pointer("/fasta_handle_info/shock_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AssemblyError::NotFound(format!(
                    "Assembly {} has no fasta_handle_info.shock_id",
                    reference
                ))
            })?;

        let dir = self.scratch.create_dir("assembly_export")?;
        let downloaded = self
            .blobs
            .download(blob_id, &dir)
            .map_err(|e| AssemblyError::from_store(e, "download"))?;
        let mut path = self
            .blobs
            .unpack(&downloaded)
            .map_err(|e| AssemblyError::from_store(e, "unpack"))?;

        if let Some(filename) = filename {
            let renamed = dir.join(filename);
            if renamed != path {
                fs::rename(&path, &renamed)?;
                path = renamed;
            }
        }

        info!("Exported assembly {} to {}", reference, path.display());
        Ok(FastaFile {
            path,
            assembly_name: name.to_string(),
        })
    }

    fn export_contig_set(
        &self,
        reference: &str,
        name: &str,
        filename: Option<&str>,
    ) -> AssemblyResult<FastaFile> {
        let data = self
            .objects
            .get_object_data(reference, &[])
            .map_err(|e| AssemblyError::from_store(e, "get_object_data"))?;
        let contigs: Vec<LegacyContig> = match data.get("contigs") {
            Some(contigs) => serde_json::from_value(contigs.clone())?,
            None => {
                return Err(AssemblyError::NotFound(format!(
                    "ContigSet {} has no contigs field",
                    reference
                )))
            }
        };

        let dir = self.scratch.create_dir("assembly_export")?;
        let path = dir.join(output_name(name, filename));
        let written = write_fasta(&path, contigs.into_iter().map(contig_to_record))?;
        debug!("Wrote {} contigs of {} to {}", written, reference, path.display());

        Ok(FastaFile {
            path,
            assembly_name: name.to_string(),
        })
    }
}

/// Zip the FASTA file and the info document into `archive`
fn write_package(archive: &Path, fasta: &Path, package: &PackageInfo<'_>) -> AssemblyResult<()> {
    let fasta_name = fasta
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AssemblyError::NotFound(format!("{} has no file name", fasta.display())))?;

    let mut zip = ZipWriter::new(File::create(archive)?);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(fasta_name, options).map_err(io::Error::from)?;
    io::copy(&mut File::open(fasta)?, &mut zip)?;

    zip.start_file(PACKAGE_INFO_FILE, options).map_err(io::Error::from)?;
    zip.write_all(serde_json::to_string_pretty(package)?.as_bytes())?;

    zip.finish().map_err(io::Error::from)?;
    Ok(())
}

fn contig_to_record(contig: LegacyContig) -> FastaRecord {
    let record = FastaRecord::new(contig.id, contig.sequence);
    match contig.description {
        Some(description) if !description.is_empty() => record.with_description(description),
        _ => record,
    }
}

fn output_name(name: &str, filename: Option<&str>) -> PathBuf {
    match filename {
        Some(filename) => PathBuf::from(filename),
        None => Path::new(name).with_extension("fa"),
    }
}
