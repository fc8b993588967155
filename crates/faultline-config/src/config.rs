// faultline-config/src/config.rs
// ============================================================================
// Module: Faultline Configuration Model
// Description: Canonical model, defaults, and validation for faultline.toml.
// Purpose: Single source of truth for control-plane configuration semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration loads from `faultline.toml`, then environment overrides are
//! applied for secret material so credentials never have to live in the file.
//! Validation is strict and fail-closed: a config that validates is a config
//! the gateway can run with, and anything doubtful is rejected at startup
//! rather than discovered mid-request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing failed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Validation failed; the message names the offending field.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Environment Override Keys
// ============================================================================

/// Environment variable carrying the JWT signing secret.
pub const ENV_JWT_SECRET: &str = "FAULTLINE_JWT_SECRET";
/// Environment variable carrying the internal service secret.
pub const ENV_INTERNAL_SECRET: &str = "FAULTLINE_INTERNAL_SECRET";
/// Environment variable carrying the sealed-storage master key.
pub const ENV_ENCRYPTION_KEY: &str = "FAULTLINE_ENCRYPTION_KEY";
/// Environment variable carrying the model provider API key.
pub const ENV_AI_API_KEY: &str = "FAULTLINE_AI_API_KEY";
/// Environment variable carrying the SMTP password.
pub const ENV_SMTP_PASSWORD: &str = "FAULTLINE_SMTP_PASSWORD";

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaultlineConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Durable store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// API-key cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Alert engine settings.
    #[serde(default)]
    pub alerting: AlertingConfig,
    /// AI enrichment settings.
    #[serde(default)]
    pub ai: AiConfig,
    /// Sealed-storage settings.
    #[serde(default)]
    pub encryption: EncryptionConfig,
    /// Notification delivery settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl FaultlineConfig {
    /// Loads configuration from a TOML file and applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, unparsable, or
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw =
            std::fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let mut config: Self =
            toml::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides for secret material.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(ENV_JWT_SECRET) {
            self.auth.jwt_secret = value;
        }
        if let Ok(value) = std::env::var(ENV_INTERNAL_SECRET) {
            self.auth.internal_secret = value;
        }
        if let Ok(value) = std::env::var(ENV_ENCRYPTION_KEY) {
            self.encryption.master_key = value;
        }
        if let Ok(value) = std::env::var(ENV_AI_API_KEY) {
            self.ai.api_key = Some(value);
        }
        if let Ok(value) = std::env::var(ENV_SMTP_PASSWORD) {
            self.notify.smtp_password = Some(value);
        }
    }

    /// Validates the configuration fail-closed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.auth.validate()?;
        self.store.validate()?;
        self.cache.validate()?;
        self.alerting.validate()?;
        self.ai.validate()?;
        self.encryption.validate()?;
        self.notify.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address, e.g. `127.0.0.1:8500`.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allowed CORS origins; empty allows none.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Requests admitted per key per window.
    #[serde(default = "default_rate_limit_capacity")]
    pub rate_limit_capacity: u32,
    /// Rate limit window in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    /// Timeout for outbound calls to external providers, in seconds.
    #[serde(default = "default_outbound_timeout_secs")]
    pub outbound_timeout_secs: u64,
    /// TLS termination; absent serves plain HTTP behind a trusted proxy.
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// TLS termination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// PEM certificate chain path.
    pub cert_path: PathBuf,
    /// PEM private key path.
    pub key_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
            rate_limit_capacity: default_rate_limit_capacity(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            outbound_timeout_secs: default_outbound_timeout_secs(),
            tls: None,
        }
    }
}

impl ServerConfig {
    /// Validates the server section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!("server.bind is not an address: {}", self.bind)));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("server.max_body_bytes must be positive".to_string()));
        }
        if self.rate_limit_capacity == 0 {
            return Err(ConfigError::Invalid(
                "server.rate_limit_capacity must be positive".to_string(),
            ));
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.rate_limit_window_secs must be positive".to_string(),
            ));
        }
        for origin in &self.cors_origins {
            Url::parse(origin).map_err(|_| {
                ConfigError::Invalid(format!("server.cors_origins entry invalid: {origin}"))
            })?;
        }
        if let Some(tls) = &self.tls {
            if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "server.tls requires both cert_path and key_path".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:8500".to_string()
}

/// Default request body cap (4 MiB).
const fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}

/// Default rate limit capacity per window.
const fn default_rate_limit_capacity() -> u32 {
    600
}

/// Default rate limit window length.
const fn default_rate_limit_window_secs() -> u64 {
    60
}

/// Default outbound provider timeout.
const fn default_outbound_timeout_secs() -> u64 {
    10
}

// ============================================================================
// SECTION: Auth
// ============================================================================

/// Authentication settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// JWT signing secret; usually injected via environment.
    #[serde(default)]
    pub jwt_secret: String,
    /// JWT lifetime in minutes for tokens this service mints.
    #[serde(default = "default_jwt_expiry_minutes")]
    pub jwt_expiry_minutes: u64,
    /// Shared secret expected on internal endpoints.
    #[serde(default)]
    pub internal_secret: String,
}

impl AuthConfig {
    /// Validates the auth section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "auth.jwt_secret is required (set {ENV_JWT_SECRET})"
            )));
        }
        if self.jwt_expiry_minutes == 0 {
            return Err(ConfigError::Invalid("auth.jwt_expiry_minutes must be positive".to_string()));
        }
        Ok(())
    }
}

/// Default JWT lifetime.
const fn default_jwt_expiry_minutes() -> u64 {
    8 * 60
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path(), busy_timeout_ms: default_busy_timeout_ms() }
    }
}

impl StoreConfig {
    /// Validates the store section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store.path must not be empty".to_string()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid("store.busy_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Default store path.
fn default_store_path() -> PathBuf {
    PathBuf::from("faultline.db")
}

/// Default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// API-key cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// TTL for successful key lookups, in seconds.
    #[serde(default = "default_positive_ttl_secs")]
    pub positive_ttl_secs: u64,
    /// TTL for failed key lookups, in seconds.
    #[serde(default = "default_negative_ttl_secs")]
    pub negative_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            positive_ttl_secs: default_positive_ttl_secs(),
            negative_ttl_secs: default_negative_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// Validates the cache section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.positive_ttl_secs == 0 || self.negative_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache TTLs must be positive".to_string()));
        }
        if self.negative_ttl_secs > self.positive_ttl_secs {
            return Err(ConfigError::Invalid(
                "cache.negative_ttl_secs must not exceed cache.positive_ttl_secs".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default positive lookup TTL (5 minutes).
const fn default_positive_ttl_secs() -> u64 {
    300
}

/// Default negative lookup TTL (30 seconds).
const fn default_negative_ttl_secs() -> u64 {
    30
}

// ============================================================================
// SECTION: Alerting
// ============================================================================

/// Alert engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertingConfig {
    /// Seconds between evaluator ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self { tick_interval_secs: default_tick_interval_secs() }
    }
}

impl AlertingConfig {
    /// Validates the alerting section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "alerting.tick_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default evaluator tick interval.
const fn default_tick_interval_secs() -> u64 {
    30
}

// ============================================================================
// SECTION: AI
// ============================================================================

/// AI enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiConfig {
    /// Chat-completions endpoint; absence switches to the mock generator.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Provider API key; absence switches to the mock generator.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier requested from the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Price per one million input tokens, USD.
    #[serde(default = "default_input_price")]
    pub input_price_per_million: f64,
    /// Price per one million output tokens, USD.
    #[serde(default = "default_output_price")]
    pub output_price_per_million: f64,
    /// Provider request timeout in seconds.
    #[serde(default = "default_ai_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: default_model(),
            input_price_per_million: default_input_price(),
            output_price_per_million: default_output_price(),
            request_timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Returns true when real model credentials are configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|value| !value.trim().is_empty())
            && self.api_key.as_deref().is_some_and(|value| !value.trim().is_empty())
    }

    /// Validates the AI section.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.trim().is_empty() {
                Url::parse(endpoint).map_err(|_| {
                    ConfigError::Invalid(format!("ai.endpoint is not a URL: {endpoint}"))
                })?;
            }
        }
        if self.input_price_per_million < 0.0 || self.output_price_per_million < 0.0 {
            return Err(ConfigError::Invalid("ai token prices must be non-negative".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "ai.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default model identifier.
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default input token price.
const fn default_input_price() -> f64 {
    0.150
}

/// Default output token price.
const fn default_output_price() -> f64 {
    0.600
}

/// Default provider timeout.
const fn default_ai_timeout_secs() -> u64 {
    30
}

// ============================================================================
// SECTION: Encryption
// ============================================================================

/// Sealed-storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionConfig {
    /// Master key for sealed channel/config secrets; usually injected via
    /// environment.
    #[serde(default)]
    pub master_key: String,
}

impl EncryptionConfig {
    /// Validates the encryption section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.master_key.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "encryption.master_key is required (set {ENV_ENCRYPTION_KEY})"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Notify
// ============================================================================

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Per-delivery timeout in seconds.
    #[serde(default = "default_notify_timeout_secs")]
    pub delivery_timeout_secs: u64,
    /// SMTP password override applied to email channel configs; usually
    /// injected via environment.
    #[serde(default)]
    pub smtp_password: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { delivery_timeout_secs: default_notify_timeout_secs(), smtp_password: None }
    }
}

impl NotifyConfig {
    /// Validates the notify section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.delivery_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "notify.delivery_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default delivery timeout.
const fn default_notify_timeout_secs() -> u64 {
    10
}
