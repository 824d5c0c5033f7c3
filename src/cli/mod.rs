pub mod commands;
pub mod output;

use anyhow::Context;
use assembly_core::{default_config, load_config, Config};
use assembly_storage::{LocalBlobStore, LocalObjectStore};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "assembly-util",
    version,
    about = "Import FASTA files as Assembly objects and export them back",
    long_about = "assembly-util parses FASTA files into checksummed, statistics-annotated \
                  Assembly records, stores them alongside the original file, and resolves \
                  genome sets, assembly sets and binned contigs back to FASTA files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Maximum number of import workers (0 = from configuration)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import one or more FASTA files as Assembly objects
    Import(commands::import::ImportArgs),

    /// Parse a FASTA file and print its Assembly statistics
    Stats(commands::stats::StatsArgs),

    /// Write a stored Assembly or ContigSet to a FASTA file
    Export(commands::export::ExportArgs),

    /// Resolve objects (genomes, sets, binned contigs) to FASTA files
    Fastas(commands::fastas::FastasArgs),
}

/// Configuration file (or defaults) with the environment and `-j` overrides applied
pub fn load_app_config(config_path: Option<&Path>, threads: usize) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => default_config(),
    };
    config.parallel = config.parallel.with_env_overrides()?;
    if threads > 0 {
        config.parallel.max_threads = threads;
    }
    config.validate()?;
    Ok(config)
}

/// Configuration and local stores shared by the commands
pub struct AppContext {
    pub config: Config,
    pub objects: Arc<LocalObjectStore>,
    pub blobs: Arc<LocalBlobStore>,
}

impl AppContext {
    pub fn load(config_path: Option<&Path>, threads: usize) -> anyhow::Result<Self> {
        let config = load_app_config(config_path, threads)?;
        let objects = LocalObjectStore::new(&config.store.root)?;
        let blobs = LocalBlobStore::new(&config.store.root)?;
        Ok(Self {
            config,
            objects: Arc::new(objects),
            blobs: Arc::new(blobs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assembly_core::save_config;
    use serial_test::serial;
    use tempfile::TempDir;

    fn config_file(dir: &TempDir) -> PathBuf {
        let mut config = default_config();
        config.store.root = dir.path().join("store");
        let path = dir.path().join("config.toml");
        save_config(&path, &config).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_threads_flag_wins_over_environment() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir);

        std::env::set_var("MAX_THREADS", "3");
        let from_env = AppContext::load(Some(&path), 0);
        let from_flag = AppContext::load(Some(&path), 7);
        std::env::remove_var("MAX_THREADS");

        assert_eq!(from_env.unwrap().config.parallel.max_threads, 3);
        assert_eq!(from_flag.unwrap().config.parallel.max_threads, 7);
        assert!(dir.path().join("store").is_dir());
    }

    #[test]
    #[serial]
    fn test_bad_environment_value_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir);

        std::env::set_var("MAX_THREADS", "many");
        let result = AppContext::load(Some(&path), 0);
        std::env::remove_var("MAX_THREADS");

        let err = result.err().unwrap();
        assert_eq!(
            err.to_string(),
            "Configuration error: MAX_THREADS must be an integer, got: many"
        );
    }
}
