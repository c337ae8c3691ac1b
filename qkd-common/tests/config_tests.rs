//! Integration tests for configuration resolution
//!
//! Covers config file priority (argument → QKD_CONFIG → platform default →
//! built-in defaults) and the QKD_ENRICHMENT_URL override.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate QKD_CONFIG or QKD_ENRICHMENT_URL are marked with
//! #[serial] so they run sequentially.

use qkd_common::config::{
    load_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR, ENRICHMENT_URL_ENV_VAR,
};
use qkd_common::Error;
use serial_test::serial;
use std::env;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_argument_takes_priority_over_env() {
    let temp_dir = TempDir::new().unwrap();
    let cli_path = write_config(&temp_dir, "cli.toml", "[logging]\nlevel = \"debug\"\n");
    let env_path = write_config(&temp_dir, "env.toml", "[logging]\nlevel = \"warn\"\n");

    env::set_var(CONFIG_ENV_VAR, &env_path);
    env::remove_var(ENRICHMENT_URL_ENV_VAR);

    let resolved = resolve_config_path(Some(&cli_path));
    assert_eq!(resolved, Some(cli_path.clone()));

    let config = load_config(Some(&cli_path)).unwrap();
    assert_eq!(config.logging.level, "debug");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    let temp_dir = TempDir::new().unwrap();
    let env_path = write_config(
        &temp_dir,
        "env.toml",
        "[skr]\nqber_threshold = 0.09\n[server]\nbind = \"0.0.0.0:9000\"\n",
    );

    env::set_var(CONFIG_ENV_VAR, &env_path);
    env::remove_var(ENRICHMENT_URL_ENV_VAR);

    let config = load_config(None).unwrap();
    assert_eq!(config.skr.qber_threshold, 0.09);
    assert_eq!(config.skr.default_ec_efficiency, 1.1);
    assert_eq!(config.server.bind, "0.0.0.0:9000");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist.toml");

    env::remove_var(CONFIG_ENV_VAR);

    let err = load_config(Some(&missing)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "bad.toml", "[enrichment\nendpoint = ");

    let err = TomlConfig::load(&path).unwrap_err();
    match err {
        Error::Config(msg) => assert!(msg.contains("bad.toml")),
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_enrichment_url_env_override() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(
        &temp_dir,
        "config.toml",
        "[enrichment]\nendpoint = \"http://file-endpoint/enrich\"\nrequired = true\n",
    );

    env::remove_var(CONFIG_ENV_VAR);
    env::set_var(ENRICHMENT_URL_ENV_VAR, "http://env-endpoint/enrich");

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(
        config.enrichment.endpoint.as_deref(),
        Some("http://env-endpoint/enrich")
    );
    assert!(config.enrichment.required);

    env::remove_var(ENRICHMENT_URL_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_enrichment_url_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_config(&temp_dir, "config.toml", "");

    env::remove_var(CONFIG_ENV_VAR);
    env::set_var(ENRICHMENT_URL_ENV_VAR, "   ");

    let config = load_config(Some(&path)).unwrap();
    assert!(config.enrichment.endpoint.is_none());

    env::remove_var(ENRICHMENT_URL_ENV_VAR);
}
