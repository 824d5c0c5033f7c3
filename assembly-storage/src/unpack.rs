//! Single-file decompression for staged inputs

use assembly_core::{StoreError, StoreResult};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use xz2::read::XzDecoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl Compression {
    fn extension(self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gz"),
            Compression::Bzip2 => Some("bz2"),
            Compression::Xz => Some("xz"),
        }
    }
}

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

const ARCHIVE_SUFFIXES: &[&str] = &[".zip", ".tar", ".tgz", ".tar.gz", ".tar.bz2", ".tar.xz"];

/// Detect compression from the leading bytes of a file
pub fn detect_compression(path: &Path) -> StoreResult<Compression> {
    let mut header = [0u8; 6];
    let mut file = File::open(path)?;
    let mut read = 0;
    while read < header.len() {
        let n = file.read(&mut header[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    let header = &header[..read];

    if header.starts_with(ZIP_MAGIC) {
        return Err(archive_error(path));
    }
    Ok(if header.starts_with(GZIP_MAGIC) {
        Compression::Gzip
    } else if header.starts_with(BZIP2_MAGIC) {
        Compression::Bzip2
    } else if header.starts_with(XZ_MAGIC) {
        Compression::Xz
    } else {
        Compression::None
    })
}

fn archive_error(path: &Path) -> StoreError {
    StoreError::Service(format!(
        "File {} is an archive; only single-file gzip, bzip2 or xz compression can be unpacked",
        path.display()
    ))
}

fn decompressed_path(path: &Path, compression: Compression) -> PathBuf {
    match compression.extension() {
        Some(ext) if path.extension().and_then(|e| e.to_str()) == Some(ext) => path.with_extension(""),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".uncompressed");
            PathBuf::from(name)
        }
    }
}

/// Decompress `path` next to itself and return the usable file.
///
/// Uncompressed files are returned unchanged. Archives are refused.
pub fn unpack_file(path: &Path) -> StoreResult<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ARCHIVE_SUFFIXES.iter().any(|s| name.ends_with(s)) {
        return Err(archive_error(path));
    }

    let compression = detect_compression(path)?;
    if compression == Compression::None {
        return Ok(path.to_path_buf());
    }

    let output = decompressed_path(path, compression);
    debug!("Decompressing {} to {}", path.display(), output.display());

    let input = File::open(path)?;
    let mut reader: Box<dyn Read> = match compression {
        Compression::Gzip => Box::new(GzDecoder::new(input)),
        Compression::Bzip2 => Box::new(BzDecoder::new(input)),
        Compression::Xz => Box::new(XzDecoder::new(input)),
        Compression::None => Box::new(input),
    };
    let mut writer = BufWriter::new(File::create(&output)?);
    io::copy(&mut reader, &mut writer)?;
    writer.into_inner().map_err(|e| e.into_error())?;

    Ok(output)
}
