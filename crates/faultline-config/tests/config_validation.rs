// faultline-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Defaults, overrides, and fail-closed validation tests.
// Purpose: Ensure invalid configuration never reaches the gateway.
// Dependencies: faultline-config, tempfile
// ============================================================================
//! Validates defaults, the example document, env overrides, and rejection of
//! invalid sections.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use std::io::Write;

use faultline_config::FaultlineConfig;
use faultline_config::config_toml_example;

/// Builds a minimal valid config with secrets set.
fn valid_config() -> FaultlineConfig {
    let mut config = FaultlineConfig::default();
    config.auth.jwt_secret = "unit-test-jwt-secret".to_string();
    config.encryption.master_key = "unit-test-master-key".to_string();
    config
}

/// Defaults plus secrets validate.
#[test]
fn defaults_with_secrets_validate() {
    assert!(valid_config().validate().is_ok());
}

/// A missing JWT secret fails closed.
#[test]
fn missing_jwt_secret_is_rejected() {
    let mut config = valid_config();
    config.auth.jwt_secret = String::new();
    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("auth.jwt_secret"));
}

/// A missing encryption master key fails closed.
#[test]
fn missing_master_key_is_rejected() {
    let mut config = valid_config();
    config.encryption.master_key = String::new();
    assert!(config.validate().is_err());
}

/// The example document parses and carries the documented defaults.
#[test]
fn example_document_parses() {
    let config: FaultlineConfig = toml::from_str(config_toml_example()).unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:8500");
    assert_eq!(config.cache.positive_ttl_secs, 300);
    assert_eq!(config.cache.negative_ttl_secs, 30);
    assert_eq!(config.alerting.tick_interval_secs, 30);
    assert!(!config.ai.has_credentials());
}

/// Unknown fields are rejected rather than ignored.
#[test]
fn unknown_fields_are_rejected() {
    let result = toml::from_str::<FaultlineConfig>("[server]\nbind = \"127.0.0.1:1\"\nbogus = 1\n");
    assert!(result.is_err());
}

/// A malformed bind address is rejected.
#[test]
fn malformed_bind_is_rejected() {
    let mut config = valid_config();
    config.server.bind = "not-an-address".to_string();
    assert!(config.validate().is_err());
}

/// Zero rate-limit capacity is rejected.
#[test]
fn zero_rate_limit_capacity_is_rejected() {
    let mut config = valid_config();
    config.server.rate_limit_capacity = 0;
    assert!(config.validate().is_err());
}

/// Negative token prices are rejected.
#[test]
fn negative_token_prices_are_rejected() {
    let mut config = valid_config();
    config.ai.input_price_per_million = -0.01;
    assert!(config.validate().is_err());
}

/// A negative-cache TTL longer than the positive TTL is rejected.
#[test]
fn inverted_cache_ttls_are_rejected() {
    let mut config = valid_config();
    config.cache.negative_ttl_secs = 600;
    assert!(config.validate().is_err());
}

/// Loading from disk parses, validates, and keeps file-provided secrets.
#[test]
fn load_round_trips_a_complete_file() {
    let document = r#"
[server]
bind = "127.0.0.1:8600"

[auth]
jwt_secret = "file-jwt-secret"

[encryption]
master_key = "file-master-key"
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(document.as_bytes()).unwrap();

    let config = FaultlineConfig::load(file.path()).unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:8600");
    assert_eq!(config.auth.jwt_secret, "file-jwt-secret");
    assert_eq!(config.encryption.master_key, "file-master-key");
    // Untouched sections keep their defaults.
    assert_eq!(config.alerting.tick_interval_secs, 30);
}

/// AI credentials require both endpoint and key.
#[test]
fn ai_credentials_require_endpoint_and_key() {
    let mut config = valid_config();
    config.ai.api_key = Some("sk-test".to_string());
    assert!(!config.ai.has_credentials());
    config.ai.endpoint = Some("https://api.example.com/v1/chat/completions".to_string());
    assert!(config.ai.has_credentials());
}
