use crate::cli::output::*;
use crate::cli::AppContext;
use crate::export::AssemblyExporter;
use crate::workspace::ScratchSpace;
use clap::Args;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct ExportArgs {
    /// Object reference (`ws/obj[/ver]`, names allowed)
    #[arg(value_name = "REF")]
    pub reference: String,

    /// Output file name inside the export directory
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Copy the exported file here
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Package the FASTA with its object info into a zip and store it as a blob
    #[arg(long, conflicts_with_all = ["filename", "output"])]
    pub package: bool,
}

pub fn run(args: ExportArgs, ctx: AppContext) -> anyhow::Result<()> {
    let scratch = ScratchSpace::from_config(&ctx.config.import);
    let exporter = AssemblyExporter::new(ctx.objects.clone(), ctx.blobs.clone(), scratch);

    if args.package {
        let blob_id = exporter.export_as_fasta(&args.reference)?;
        success(&format!("Packaged {} as blob {}", args.reference, blob_id));
        return Ok(());
    }

    let file = exporter.assembly_as_fasta(&args.reference, args.filename.as_deref())?;
    let path = match args.output {
        Some(output) => {
            fs::copy(&file.path, &output)?;
            output
        }
        None => file.path,
    };

    success(&format!(
        "Exported {} to {}",
        file.assembly_name,
        path.display()
    ));
    Ok(())
}
