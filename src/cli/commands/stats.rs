use crate::cli::output::*;
use crate::workspace::ScratchSpace;
use assembly_bio::{
    filter_contigs_by_length, parse_assembly_stats, AssemblyStats, ContigOverrides, FilteredFasta,
};
use assembly_core::{AssemblyError, AssemblyResult, Config, ScratchRetention};
use assembly_storage::unpack_file;
use clap::Args;
use colored::*;
use humansize::{format_size, DECIMAL};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct StatsArgs {
    /// Input FASTA file
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Drop contigs shorter than this many bases before computing statistics
    #[arg(short = 'm', long)]
    pub min_contig_length: Option<u64>,

    /// Per-contig overrides as a JSON file (`{"contig": {"is_circ": 1}}`)
    #[arg(long, value_name = "FILE")]
    pub contig_info: Option<PathBuf>,

    /// Print the full statistics record as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs, config: &Config) -> anyhow::Result<()> {
    let overrides: ContigOverrides = match &args.contig_info {
        Some(path) => serde_json::from_slice(&std::fs::read(path)?)?,
        None => ContigOverrides::new(),
    };

    // Nothing is persisted, so the staged copies never outlive the command
    let scratch = ScratchSpace::new(&config.import.scratch_dir, ScratchRetention::RemoveAlways);
    let (stats, filtered) =
        compute_stats(&args.input, args.min_contig_length, &overrides, &scratch)?;

    if let (Some(filtered), Some(min_len), false) = (&filtered, args.min_contig_length, args.json) {
        info(&format!(
            "Filtered out {} of {} contigs shorter than {} bp",
            filtered.removed(),
            filtered.total,
            min_len
        ));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_text_stats(&args.input.display().to_string(), &stats);
    }
    Ok(())
}

/// Stage `input` in scratch, then unpack, filter and parse the staged copy
fn compute_stats(
    input: &Path,
    min_contig_length: Option<u64>,
    overrides: &ContigOverrides,
    scratch: &ScratchSpace,
) -> AssemblyResult<(AssemblyStats, Option<FilteredFasta>)> {
    if !input.is_file() {
        return Err(AssemblyError::NotFound(format!(
            "Input file not found: {}",
            input.display()
        )));
    }

    let mut session = scratch.session();
    let staged = session.stage_file(input)?;
    let mut path = unpack_file(&staged).map_err(|e| AssemblyError::from_store(e, "unpack"))?;

    let mut filtered = None;
    if let Some(min_len) = min_contig_length {
        let result = filter_contigs_by_length(&path, min_len)?;
        path = result.path.clone();
        filtered = Some(result);
    }

    let stats = parse_assembly_stats(&path, overrides)?;
    session.mark_success();
    Ok((stats, filtered))
}

fn print_text_stats(source: &str, stats: &AssemblyStats) {
    section_header_with_line("Assembly Statistics");
    let gc = stats
        .gc_content
        .map(|gc| format!("{:.2}%", gc * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    tree_items(&[
        ("File", source.to_string()),
        ("Contigs", stats.num_contigs.to_string()),
        (
            "Total length",
            format!("{} bp ({})", stats.dna_size, format_size(stats.dna_size, DECIMAL)),
        ),
        ("GC content", gc),
        ("MD5", stats.md5.clone()),
    ]);

    section_header_with_line("Base Counts");
    let counts: Vec<(&str, String)> = stats
        .base_counts
        .iter()
        .map(|(base, count)| (base.as_str(), count.to_string()))
        .collect();
    tree_items(&counts);

    if let Some((id, longest)) = stats.contigs.iter().max_by_key(|(_, c)| c.length) {
        println!();
        success(&format!(
            "Longest contig {} ({} bp)",
            id.bold(),
            longest.length
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use tempfile::TempDir;

    const THREE_CONTIGS: &str = ">s1\nagtggggg\n>s2\ngacgattt\n>s3 some text\nctgtgtttgtgtgtgtgt\n";

    #[test]
    fn test_stats_leave_input_directory_untouched() {
        let tmp = TempDir::new().unwrap();
        let input_dir = tmp.path().join("input");
        fs::create_dir(&input_dir).unwrap();
        let input = input_dir.join("genome.fa");
        fs::write(&input, THREE_CONTIGS).unwrap();
        let scratch_root = tmp.path().join("scratch");
        let scratch = ScratchSpace::new(&scratch_root, ScratchRetention::RemoveAlways);

        let (stats, filtered) =
            compute_stats(&input, Some(9), &ContigOverrides::new(), &scratch).unwrap();
        assert_eq!(stats.num_contigs, 1);
        assert_eq!(stats.dna_size, 18);
        assert_eq!(filtered.map(|f| f.removed()), Some(2));

        let entries: Vec<OsString> = fs::read_dir(&input_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![OsString::from("genome.fa")]);
        assert_eq!(fs::read_dir(&scratch_root).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_input() {
        let tmp = TempDir::new().unwrap();
        let scratch = ScratchSpace::new(tmp.path().join("scratch"), ScratchRetention::RemoveAlways);

        let err = compute_stats(
            &tmp.path().join("absent.fa"),
            None,
            &ContigOverrides::new(),
            &scratch,
        )
        .unwrap_err();
        assert!(matches!(err, AssemblyError::NotFound(_)));
        assert!(!tmp.path().join("scratch").exists());
    }
}
