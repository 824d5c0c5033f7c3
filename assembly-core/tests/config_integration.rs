/// Integration tests for configuration loading and saving
use assembly_core::config::{default_config, load_config, save_config, ScratchRetention};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_loading_from_multiple_files() {
    let dir = TempDir::new().unwrap();

    let small_limits = dir.path().join("small.toml");
    let workers = dir.path().join("workers.toml");

    fs::write(
        &small_limits,
        r#"
[import]
max_data_size = 2048
scratch_retention = "remove_always"
"#,
    )
    .unwrap();

    fs::write(
        &workers,
        r#"
[parallel]
max_threads = 12
threads_per_cpu = 0.5

[store]
root = "/srv/assembly"
"#,
    )
    .unwrap();

    let config1 = load_config(&small_limits).unwrap();
    assert_eq!(config1.import.max_data_size, 2048);
    assert_eq!(config1.import.safety_factor, 0.95); // Default
    assert_eq!(config1.import.max_batch_payload(), 1945);
    assert_eq!(config1.import.scratch_retention, ScratchRetention::RemoveAlways);

    let config2 = load_config(&workers).unwrap();
    assert_eq!(config2.parallel.max_threads, 12);
    assert_eq!(config2.parallel.worker_count(8), 4);
    assert_eq!(config2.store.root.to_str(), Some("/srv/assembly"));
}

#[test]
fn test_config_roundtrip_preserves_retention() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = default_config();
    config.import.scratch_retention = ScratchRetention::RemoveOnSuccess;
    config.import.scratch_dir = dir.path().join("scratch");
    save_config(&path, &config).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("scratch_retention = \"remove_on_success\""));

    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded.import.scratch_retention, ScratchRetention::RemoveOnSuccess);
    assert_eq!(loaded.import.scratch_dir, dir.path().join("scratch"));
}

#[test]
fn test_malformed_config_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[parallel\nmax_threads = ").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error: Failed to parse config"));
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("IO error"));
}
