//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use courier_domain::CourierError;
use courier_infra::config;
use tempfile::{Builder, NamedTempFile};

fn temp_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_toml_file() {
    let file = temp_config(
        ".toml",
        r#"
app_id = "wx-integration"
app_secret = "integration-secret"
token = "integration-token"
account_id = "gh_integration"
encoding_aes_key = "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFG"
api_base_url = "http://127.0.0.1:8080"
request_timeout_secs = 4
convergence_window_secs = 3
retry_interval_secs = 30
"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf())).unwrap();

    assert_eq!(config.app_id, "wx-integration");
    assert_eq!(config.account_id.as_deref(), Some("gh_integration"));
    assert_eq!(config.api_base_url, "http://127.0.0.1:8080");
    assert_eq!(config.retry_interval_secs, 30);
    config.validate().expect("valid config");
    assert!(config.aes_key().unwrap().is_some());
}

#[test]
fn test_load_config_from_json_file() {
    let file = temp_config(
        ".json",
        r#"{
            "app_id": "wx-json",
            "app_secret": "json-secret",
            "token": "json-token"
        }"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf())).unwrap();
    assert_eq!(config.app_id, "wx-json");
    assert!(config.encoding_aes_key.is_none());
    config.validate().expect("valid config");
}

#[test]
fn test_secrets_are_redacted_in_debug_output() {
    let file = temp_config(
        ".toml",
        r#"
app_id = "wx-redact"
app_secret = "do-not-print"
token = "also-hidden"
"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf())).unwrap();
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("do-not-print"));
    assert!(!rendered.contains("also-hidden"));
}

#[test]
fn test_invalid_window_fails_validation() {
    let file = temp_config(
        ".toml",
        r#"
app_id = "wx"
app_secret = "s"
token = "t"
convergence_window_secs = 9
"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf())).unwrap();
    assert!(matches!(config.validate(), Err(CourierError::Config(_))));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let file = temp_config(".toml", "app_id = ");
    let result = config::load_from_file(Some(file.path().to_path_buf()));
    assert!(matches!(result, Err(CourierError::Config(msg)) if msg.contains("TOML")));
}
