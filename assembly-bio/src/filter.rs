//! Length-based contig filtering

use crate::formats::{FastaFile, FastaReadable, FastaWriter};
use assembly_core::AssemblyResult;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of a filtering pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredFasta {
    pub path: PathBuf,
    pub total: usize,
    pub kept: usize,
}

impl FilteredFasta {
    pub fn removed(&self) -> usize {
        self.total - self.kept
    }
}

/// `<input>.filtered.fa`, next to the input
pub fn filtered_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".filtered.fa");
    PathBuf::from(name)
}

/// Copy every record at least `min_contig_length` bases long into a new file.
///
/// The source file is left untouched. Records are streamed one at a time.
pub fn filter_contigs_by_length(
    path: &Path,
    min_contig_length: u64,
) -> AssemblyResult<FilteredFasta> {
    let output = filtered_path_for(path);
    let mut writer = FastaWriter::new(BufWriter::new(File::create(&output)?));

    let mut total = 0;
    let mut kept = 0;
    for record in FastaFile::records(path)? {
        let record = record?;
        total += 1;
        if record.len() as u64 >= min_contig_length {
            writer.write_record(&record)?;
            kept += 1;
        }
    }
    writer.finish()?;

    info!(
        "filtered out {} of {} contigs that were shorter than {} bp.",
        total - kept,
        total,
        min_contig_length
    );

    Ok(FilteredFasta {
        path: output,
        total,
        kept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_filtered_path_naming() {
        assert_eq!(
            filtered_path_for(Path::new("/scratch/import_fasta_1/genome.fa")),
            PathBuf::from("/scratch/import_fasta_1/genome.fa.filtered.fa")
        );
    }

    #[test]
    fn test_filter_keeps_long_contigs_in_order() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.fa");
        fs::write(
            &input,
            ">short1\nACG\n>long1 first\nACGTACGTAC\n>exact\nACGTA\n>short2\nA\n>long2\nGGGGGGGG\n",
        )
        .unwrap();
        let before = fs::read(&input).unwrap();

        let result = filter_contigs_by_length(&input, 5).unwrap();

        assert_eq!(result.total, 5);
        assert_eq!(result.kept, 3);
        assert_eq!(result.removed(), 2);
        assert_eq!(
            fs::read_to_string(&result.path).unwrap(),
            ">long1 first\nACGTACGTAC\n>exact\nACGTA\n>long2\nGGGGGGGG\n"
        );
        assert_eq!(fs::read(&input).unwrap(), before);
    }

    #[test]
    fn test_filter_everything_out() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("tiny.fa");
        fs::write(&input, ">a\nAC\n>b\nG\n").unwrap();

        let result = filter_contigs_by_length(&input, 10).unwrap();
        assert_eq!(result.kept, 0);
        assert_eq!(fs::read_to_string(&result.path).unwrap(), "");
    }
}
