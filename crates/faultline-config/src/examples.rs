// faultline-config/src/examples.rs
// ============================================================================
// Module: Faultline Config Examples
// Description: Deterministic example configuration generation.
// Purpose: Give `config init` one canonical starting document.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The example document is a literal string rather than a serialized default
//! so comments survive and the output is byte-stable across releases. Secrets
//! are intentionally absent; the comments point at the environment overrides.

// ============================================================================
// SECTION: Example Document
// ============================================================================

/// Returns the canonical example `faultline.toml`.
#[must_use]
pub const fn config_toml_example() -> &'static str {
    r#"# Faultline control-plane configuration.
# Secrets are injected via environment variables:
#   FAULTLINE_JWT_SECRET, FAULTLINE_INTERNAL_SECRET,
#   FAULTLINE_ENCRYPTION_KEY, FAULTLINE_AI_API_KEY, FAULTLINE_SMTP_PASSWORD

[server]
bind = "127.0.0.1:8500"
cors_origins = ["http://localhost:5173"]
max_body_bytes = 4194304
rate_limit_capacity = 600
rate_limit_window_secs = 60
outbound_timeout_secs = 10

# [server.tls]
# cert_path = "certs/faultline.pem"
# key_path = "certs/faultline.key"

[auth]
jwt_expiry_minutes = 480

[store]
path = "faultline.db"
busy_timeout_ms = 5000

[cache]
positive_ttl_secs = 300
negative_ttl_secs = 30

[alerting]
tick_interval_secs = 30

[ai]
# endpoint = "https://api.openai.example/v1/chat/completions"
model = "gpt-4o-mini"
input_price_per_million = 0.150
output_price_per_million = 0.600
request_timeout_secs = 30

[notify]
delivery_timeout_secs = 10
"#
}
