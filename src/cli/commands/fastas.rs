use crate::cli::output::*;
use crate::cli::AppContext;
use crate::export::AssemblyExporter;
use crate::resolver::TypeResolver;
use crate::workspace::ScratchSpace;
use assembly_core::{StoreError, StoreResult};
use assembly_storage::BinnedContigsService;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args)]
pub struct FastasArgs {
    /// Object references to resolve
    #[arg(required = true, value_name = "REF")]
    pub refs: Vec<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// The local stores have no binned-contigs conversion service
struct NoBinnedContigsService;

impl BinnedContigsService for NoBinnedContigsService {
    fn binned_contigs_to_fasta(&self, reference: &str, _output_dir: &Path) -> StoreResult<PathBuf> {
        Err(StoreError::Service(format!(
            "Cannot resolve binned contigs {}: no binned contigs service is configured",
            reference
        )))
    }
}

pub fn run(args: FastasArgs, ctx: AppContext) -> anyhow::Result<()> {
    let scratch = ScratchSpace::from_config(&ctx.config.import);
    let exporter = AssemblyExporter::new(ctx.objects.clone(), ctx.blobs.clone(), scratch.clone());
    let resolver = TypeResolver::new(
        ctx.objects.clone(),
        exporter,
        Arc::new(NoBinnedContigsService),
        scratch,
    );

    let fastas = resolver.get_fastas(&args.refs)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&fastas)?);
        return Ok(());
    }

    section_header_with_line(&format!("Resolved {} FASTA file(s)", fastas.len()));
    if fastas.is_empty() {
        warning("No FASTA files found");
    }
    for (idx, fasta) in fastas.iter().enumerate() {
        tree_item(
            idx + 1 == fastas.len(),
            &fasta.reference,
            Some(&fasta.path.display().to_string()),
        );
    }
    Ok(())
}
