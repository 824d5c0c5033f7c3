//! Test environment management
//!
//! Provides isolated scratch, input and store directories with automatic cleanup.

use anyhow::{Context, Result};
use assembly_core::{Config, ImportConfig, ParallelConfig, ScratchRetention, StoreConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Configuration for test environment
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Keep the directory tree after the test (for debugging)
    pub preserve: bool,
    /// Number of fan-out workers
    pub threads: usize,
    /// Object store payload cap, in bytes
    pub max_data_size: u64,
    pub scratch_retention: ScratchRetention,
    /// Custom prefix for test directories
    pub prefix: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            preserve: false,
            threads: 1, // Single-threaded by default for determinism
            max_data_size: 1024 * 1024 * 1024,
            scratch_retention: ScratchRetention::Keep,
            prefix: None,
        }
    }
}

/// Isolated test environment, removed on drop unless preserved
pub struct TestEnvironment {
    temp_dir: Option<TempDir>,
    root_path: PathBuf,
    config: TestConfig,
}

impl TestEnvironment {
    /// Create a new test environment with default config
    pub fn new() -> Result<Self> {
        Self::with_config(TestConfig::default())
    }

    /// Create a new test environment with custom config
    pub fn with_config(config: TestConfig) -> Result<Self> {
        let prefix = config.prefix.as_deref().unwrap_or("assembly-test");
        let temp_dir =
            TempDir::with_prefix(prefix).context("Failed to create temporary directory")?;
        let root_path = temp_dir.path().to_path_buf();

        for sub in ["scratch", "inputs", "store"] {
            std::fs::create_dir_all(root_path.join(sub))?;
        }

        Ok(Self {
            temp_dir: Some(temp_dir),
            root_path,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root_path.join("scratch")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root_path.join("inputs")
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root_path.join("store")
    }

    /// Write a file under the input directory
    pub fn write_input(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.input_dir().join(name);
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Application config pointing at this environment
    pub fn app_config(&self) -> Config {
        Config {
            import: ImportConfig {
                scratch_dir: self.scratch_dir(),
                max_data_size: self.config.max_data_size,
                scratch_retention: self.config.scratch_retention,
                ..ImportConfig::default()
            },
            parallel: ParallelConfig {
                max_threads: self.config.threads,
                threads_per_cpu: 1.0,
            },
            store: StoreConfig {
                root: self.store_dir(),
            },
        }
    }

    /// Directories created under the scratch root
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(self.scratch_dir())
            .map(|rd| rd.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default();
        entries.sort();
        entries
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if self.config.preserve {
            if let Some(dir) = self.temp_dir.take() {
                let path = dir.keep();
                eprintln!("Preserved test environment at {}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_layout() {
        let env = TestEnvironment::new().unwrap();
        assert!(env.scratch_dir().is_dir());
        assert!(env.input_dir().is_dir());

        let config = env.app_config();
        assert_eq!(config.import.scratch_dir, env.scratch_dir());
        assert_eq!(config.parallel.max_threads, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cleanup_on_drop() {
        let root = {
            let env = TestEnvironment::new().unwrap();
            env.write_input("a.fa", ">a\nA\n").unwrap();
            env.root().to_path_buf()
        };
        assert!(!root.exists());
    }
}
