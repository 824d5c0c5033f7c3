use assembly_util::cli::{commands, load_app_config, AppContext, Cli, Commands};
use assembly_util::AssemblyError;
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // ASSEMBLY_UTIL_LOG wins; otherwise -v raises the default level
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("ASSEMBLY_UTIL_LOG")
        .ok()
        .and_then(|filter| EnvFilter::try_new(filter).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<AssemblyError>() {
            Some(AssemblyError::Configuration(_)) => 2,
            Some(AssemblyError::Io(_)) | Some(AssemblyError::NotFound(_)) => 3,
            Some(AssemblyError::Parse(_)) | Some(AssemblyError::NoSequences(_)) => 4,
            Some(AssemblyError::InvalidInput(_)) => 5,
            Some(AssemblyError::Store(_))
            | Some(AssemblyError::NoOutput(_))
            | Some(AssemblyError::PartialSave { .. }) => 6,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let load_context = || -> anyhow::Result<AppContext> {
        let ctx = AppContext::load(cli.config.as_deref(), cli.threads)?;
        if cli.verbose > 0 {
            eprintln!(
                "Using up to {} import workers, scratch in {}",
                ctx.config.parallel.max_threads,
                ctx.config.import.scratch_dir.display()
            );
        }
        Ok(ctx)
    };

    match cli.command {
        Commands::Import(args) => commands::import::run(args, load_context()?),
        Commands::Stats(args) => {
            commands::stats::run(args, &load_app_config(cli.config.as_deref(), cli.threads)?)
        }
        Commands::Export(args) => commands::export::run(args, load_context()?),
        Commands::Fastas(args) => commands::fastas::run(args, load_context()?),
    }
}
