use crate::cli::output::*;
use crate::cli::AppContext;
use crate::import::{
    ImportInput, ImportOrchestrator, ImportResult, MassImportParams, RecordMetadata,
    SaveAssemblyParams,
};
use clap::Args;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args)]
pub struct ImportArgs {
    /// FASTA files to import (plain, .gz, .bz2 or .xz)
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Target workspace name; created if it does not exist
    #[arg(short, long)]
    pub workspace: String,

    /// Assembly names, one per input (default: file name without extension)
    #[arg(short, long = "name", value_name = "NAME")]
    pub names: Vec<String>,

    /// Drop contigs shorter than this many bases
    #[arg(short = 'm', long)]
    pub min_contig_length: Option<u64>,

    /// Assembly type recorded on each object
    #[arg(short = 't', long = "type")]
    pub assembly_type: Option<String>,

    /// Import several files in a single worker
    #[arg(long)]
    pub no_parallel: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ImportArgs, ctx: AppContext) -> anyhow::Result<()> {
    if !args.names.is_empty() && args.names.len() != args.inputs.len() {
        anyhow::bail!(
            "Got {} assembly names for {} input files",
            args.names.len(),
            args.inputs.len()
        );
    }

    let workspace_id = ctx.objects.create_workspace(&args.workspace)?;
    let orchestrator = ImportOrchestrator::new(ctx.objects.clone(), ctx.blobs.clone(), &ctx.config)?;

    let names: Vec<String> = if args.names.is_empty() {
        args.inputs.iter().map(|p| default_name(p)).collect()
    } else {
        args.names.clone()
    };
    let metadata = RecordMetadata {
        assembly_type: args.assembly_type.clone(),
        ..Default::default()
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Importing {} FASTA file(s)...", args.inputs.len()));

    let results = if args.inputs.len() == 1 {
        let params = SaveAssemblyParams {
            workspace_name: Some(args.workspace.clone()),
            assembly_name: Some(names[0].clone()),
            file: Some(json!({ "path": path_string(&args.inputs[0]) })),
            min_contig_length: args.min_contig_length.map(|v| json!(v)),
            metadata,
            ..Default::default()
        };
        vec![orchestrator.import_fasta(params)?]
    } else {
        let inputs = args
            .inputs
            .iter()
            .zip(&names)
            .map(|(path, name)| ImportInput {
                file: Some(path_string(path)),
                assembly_name: Some(name.clone()),
                metadata: metadata.clone(),
                ..Default::default()
            })
            .collect::<Vec<_>>();
        let params = MassImportParams {
            workspace_id: Some(json!(workspace_id)),
            inputs: Some(serde_json::to_value(inputs)?),
            min_contig_length: args.min_contig_length.map(|v| json!(v)),
        };
        orchestrator.import_fasta_mass(params, !args.no_parallel)?
    };
    spinner.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    print_results(&args.workspace, &names, &results);
    Ok(())
}

fn print_results(workspace: &str, names: &[String], results: &[ImportResult]) {
    section_header_with_line(&format!("Imported into workspace {}", workspace));
    for (name, result) in names.iter().zip(results) {
        success(&format!("{} {}", name.bold(), result.upa.cyan()));
        if let Some(filtered) = &result.filtered_input {
            tree_item(true, "filtered input", Some(&filtered.display().to_string()));
        }
    }
}

fn default_name(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for suffix in [".gz", ".bz2", ".xz"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.to_string();
        }
    }
    let stem = Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());
    stem.unwrap_or(name)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
