//! Configuration types for assembly-util

use crate::AssemblyError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding `parallel.max_threads`
pub const MAX_THREADS_VAR: &str = "MAX_THREADS";
/// Environment variable overriding `parallel.threads_per_cpu`
pub const THREADS_PER_CPU_VAR: &str = "THREADS_PER_CPU";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Root under which every import creates its own `import_fasta_<uuid>` directory
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Hard cap on the payload of a single object store write, in bytes
    #[serde(default = "default_max_data_size")]
    pub max_data_size: u64,
    /// Fraction of `max_data_size` actually used when planning batches
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,
    #[serde(default)]
    pub scratch_retention: ScratchRetention,
}

/// What happens to per-import scratch directories once an import finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScratchRetention {
    /// Leave everything in place (filtered files are reported back to callers)
    #[default]
    Keep,
    /// Remove scratch directories after a successful import, keep them on failure
    RemoveOnSuccess,
    /// Remove scratch directories whatever the outcome
    RemoveAlways,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Absolute cap on fan-out workers
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    /// Workers per available CPU; values above 1 are treated as 1
    #[serde(default = "default_threads_per_cpu")]
    pub threads_per_cpu: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the local object and blob stores
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

// Default value functions
fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("assembly-util")
}
fn default_max_data_size() -> u64 {
    1024 * 1024 * 1024
}
fn default_safety_factor() -> f64 {
    0.95
}
fn default_max_threads() -> usize {
    num_cpus::get()
}
fn default_threads_per_cpu() -> f64 {
    1.0
}
fn default_store_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("assembly-util")
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            max_data_size: default_max_data_size(),
            safety_factor: default_safety_factor(),
            scratch_retention: ScratchRetention::default(),
        }
    }
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
            threads_per_cpu: default_threads_per_cpu(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

impl ImportConfig {
    /// Largest cumulative payload allowed in one object store write
    pub fn max_batch_payload(&self) -> usize {
        (self.max_data_size as f64 * self.safety_factor) as usize
    }

    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.max_data_size == 0 {
            return Err(AssemblyError::Configuration(
                "import.max_data_size must be >= 1".to_string(),
            ));
        }
        if !(self.safety_factor > 0.0 && self.safety_factor <= 1.0) {
            return Err(AssemblyError::Configuration(format!(
                "import.safety_factor must be in (0, 1], got: {}",
                self.safety_factor
            )));
        }
        Ok(())
    }
}

impl ParallelConfig {
    pub fn new(max_threads: usize, threads_per_cpu: f64) -> Result<Self, AssemblyError> {
        let config = Self {
            max_threads,
            threads_per_cpu,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.max_threads < 1 {
            return Err(AssemblyError::Configuration(format!(
                "{} must be >= 1",
                MAX_THREADS_VAR
            )));
        }
        if !self.threads_per_cpu.is_finite() || self.threads_per_cpu <= 0.0 {
            return Err(AssemblyError::Configuration(format!(
                "{} must be > 0",
                THREADS_PER_CPU_VAR
            )));
        }
        Ok(())
    }

    /// Build from raw environment-style values; both must be present
    pub fn from_env_values(
        max_threads: Option<&str>,
        threads_per_cpu: Option<&str>,
    ) -> Result<Self, AssemblyError> {
        let max_threads = validate_threads_param(max_threads, MAX_THREADS_VAR)?;
        let threads_per_cpu = validate_ratio_param(threads_per_cpu, THREADS_PER_CPU_VAR)?;
        Self::new(max_threads, threads_per_cpu)
    }

    /// Apply `MAX_THREADS` / `THREADS_PER_CPU` if they are set in the environment
    pub fn with_env_overrides(mut self) -> Result<Self, AssemblyError> {
        if let Ok(value) = std::env::var(MAX_THREADS_VAR) {
            self.max_threads = validate_threads_param(Some(&value), MAX_THREADS_VAR)?;
            debug!("{} overrides max_threads: {}", MAX_THREADS_VAR, self.max_threads);
        }
        if let Ok(value) = std::env::var(THREADS_PER_CPU_VAR) {
            self.threads_per_cpu = validate_ratio_param(Some(&value), THREADS_PER_CPU_VAR)?;
            debug!("{} overrides threads_per_cpu: {}", THREADS_PER_CPU_VAR, self.threads_per_cpu);
        }
        self.validate()?;
        Ok(self)
    }

    /// Number of fan-out workers for the given CPU count
    pub fn worker_count(&self, available_cpus: usize) -> usize {
        let scaled = (available_cpus as f64 * self.threads_per_cpu.min(1.0)).floor() as usize;
        scaled.max(1).min(self.max_threads.max(1))
    }
}

/// Parse a thread-count parameter: required, integer, >= 1
pub fn validate_threads_param(value: Option<&str>, name: &str) -> Result<usize, AssemblyError> {
    let value = value
        .ok_or_else(|| AssemblyError::Configuration(format!("{} is required", name)))?;
    let parsed: i64 = value.trim().parse().map_err(|_| {
        AssemblyError::Configuration(format!("{} must be an integer, got: {}", name, value))
    })?;
    if parsed < 1 {
        return Err(AssemblyError::Configuration(format!("{} must be >= 1", name)));
    }
    Ok(parsed as usize)
}

fn validate_ratio_param(value: Option<&str>, name: &str) -> Result<f64, AssemblyError> {
    let value = value
        .ok_or_else(|| AssemblyError::Configuration(format!("{} is required", name)))?;
    let parsed: f64 = value.trim().parse().map_err(|_| {
        AssemblyError::Configuration(format!("{} must be a number, got: {}", name, value))
    })?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(AssemblyError::Configuration(format!("{} must be > 0", name)));
    }
    Ok(parsed)
}

impl Config {
    pub fn validate(&self) -> Result<(), AssemblyError> {
        self.import.validate()?;
        self.parallel.validate()
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, AssemblyError> {
    debug!("loading config from {}", path.as_ref().display());
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| AssemblyError::Configuration(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), AssemblyError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| AssemblyError::Configuration(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
