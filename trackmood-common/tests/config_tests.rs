//! Configuration resolution tests
//!
//! Tests that touch TRACKMOOD_* environment variables are marked #[serial]
//! so they do not race each other.

use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;
use trackmood_common::config::{
    ConfigResolver, TomlConfig, CONFIG_ENV_VAR, DOWNLOADER_ENV_VAR, WORK_DIR_ENV_VAR,
};

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(DOWNLOADER_ENV_VAR);
    env::remove_var(WORK_DIR_ENV_VAR);
}

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write config");
    path
}

#[test]
#[serial]
fn test_cli_path_has_highest_priority() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let cli = write_config(&dir, "cli.toml", "[downloader]\nprogram = \"from-cli\"");
    let env_file = write_config(&dir, "env.toml", "[downloader]\nprogram = \"from-env\"");
    env::set_var(CONFIG_ENV_VAR, &env_file);

    let config = ConfigResolver::new(Some(cli)).resolve().unwrap();
    assert_eq!(config.downloader.program, "from-cli");

    clear_env();
}

#[test]
#[serial]
fn test_env_config_path_used_without_cli() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let env_file = write_config(&dir, "env.toml", "[analysis]\nsample_rate = 44100");
    env::set_var(CONFIG_ENV_VAR, &env_file);

    let config = ConfigResolver::new(None).resolve().unwrap();
    assert_eq!(config.analysis.sample_rate, 44_100);

    clear_env();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = ConfigResolver::new(Some(missing)).resolve();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Config file not found"));
}

#[test]
#[serial]
fn test_env_overrides_apply_after_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let file = write_config(
        &dir,
        "config.toml",
        "[downloader]\nprogram = \"yt-dlp\"\n[analysis]\nwork_dir = \"/var/tmp\"",
    );
    env::set_var(DOWNLOADER_ENV_VAR, "/opt/bin/yt-dlp-nightly");
    env::set_var(WORK_DIR_ENV_VAR, dir.path());

    let config = ConfigResolver::new(Some(file)).resolve().unwrap();
    assert_eq!(config.downloader.program, "/opt/bin/yt-dlp-nightly");
    assert_eq!(config.work_dir(), dir.path());

    clear_env();
}

#[test]
#[serial]
fn test_work_dir_defaults_to_system_temp() {
    clear_env();
    let config = TomlConfig::default();
    assert_eq!(config.work_dir(), env::temp_dir());
}

#[test]
#[serial]
fn test_invalid_file_fails_resolution() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let file = write_config(&dir, "bad.toml", "[analysis]\nsample_rate = 0");

    let result = ConfigResolver::new(Some(file)).resolve();
    assert!(result.is_err());
}
