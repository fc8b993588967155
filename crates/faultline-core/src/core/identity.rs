// faultline-core/src/core/identity.rs
// ============================================================================
// Module: Faultline Identity Model
// Description: Tenants, projects, and ingest API keys.
// Purpose: Define the isolation hierarchy and the agent-facing credential.
// Dependencies: serde, rand, crate::core::hashing
// ============================================================================

//! ## Overview
//! Tenants are the billing/isolation roots; projects scope all telemetry and
//! configuration beneath a tenant. API keys are long-lived bearer credentials
//! bound to one project with an ingest scope set. The raw key is emitted once
//! at creation; only its SHA-256 digest is stored, and lookups go through the
//! digest. Inactive or expired keys fail validation even when the digest
//! matches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::sha256_hex;
use crate::core::identifiers::ApiKeyId;
use crate::core::identifiers::ConnectionId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix carried by every raw API key.
pub const API_KEY_PREFIX: &str = "flk_";
/// Number of leading raw-key characters retained for display.
pub const API_KEY_DISPLAY_PREFIX_LEN: usize = 12;
/// Number of random bytes behind each raw key.
const API_KEY_ENTROPY_BYTES: usize = 36;

// ============================================================================
// SECTION: Tenant / Project
// ============================================================================

/// Root billing and isolation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant identifier.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

/// Scoping container owned by a tenant.
///
/// # Invariants
/// - `(tenant_id, slug)` is unique; the store enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: ProjectId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// URL-safe slug, unique within the tenant.
    pub slug: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Ingest Domains
// ============================================================================

/// Telemetry ingest domains accepted by the ingest plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestDomain {
    /// Custom and runtime metrics.
    Metrics,
    /// Distributed trace spans.
    Traces,
    /// Error events.
    Errors,
    /// Structured log records.
    Logs,
    /// Host infrastructure samples.
    Infrastructure,
    /// Browser real-user-monitoring events.
    Browser,
    /// Dependency vulnerability scan findings.
    Vulnerabilities,
}

impl IngestDomain {
    /// All ingest domains, in stable order.
    pub const ALL: [Self; 7] = [
        Self::Metrics,
        Self::Traces,
        Self::Errors,
        Self::Logs,
        Self::Infrastructure,
        Self::Browser,
        Self::Vulnerabilities,
    ];

    /// Returns the URL path segment for the domain.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Traces => "traces",
            Self::Errors => "errors",
            Self::Logs => "logs",
            Self::Infrastructure => "infrastructure",
            Self::Browser => "browser",
            Self::Vulnerabilities => "vulnerabilities",
        }
    }

    /// Returns the scope label stored on API keys, e.g. `ingest:metrics`.
    #[must_use]
    pub fn scope_label(self) -> String {
        format!("ingest:{}", self.as_str())
    }

    /// Parses a URL path segment into a domain.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "metrics" => Some(Self::Metrics),
            "traces" => Some(Self::Traces),
            "errors" => Some(Self::Errors),
            "logs" => Some(Self::Logs),
            "infrastructure" => Some(Self::Infrastructure),
            "browser" => Some(Self::Browser),
            "vulnerabilities" => Some(Self::Vulnerabilities),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: API Keys
// ============================================================================

/// Ingest API key record.
///
/// # Invariants
/// - `key_hash` is unique across the store and is the only stored key form.
/// - `scopes` restrict which ingest domains the key may write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Key identifier.
    pub id: ApiKeyId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Bound project; all writes authenticated by this key land here.
    pub project_id: ProjectId,
    /// Friendly name, e.g. `Production Agent Key`.
    pub name: String,
    /// Leading raw-key characters shown in UIs for identification.
    pub key_prefix: String,
    /// SHA-256 hex digest of the raw key.
    pub key_hash: String,
    /// Granted ingest domains.
    pub scopes: Vec<IngestDomain>,
    /// Whether the key is currently usable.
    pub is_active: bool,
    /// Last successful use, updated best-effort by the ingest plane.
    pub last_used_at: Option<Timestamp>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Expiry; `None` means the key never expires.
    pub expires_at: Option<Timestamp>,
}

impl ApiKey {
    /// Mints a new key bound to the project. Returns the record and the raw
    /// key, which is never recoverable afterwards.
    #[must_use]
    pub fn mint(
        tenant_id: TenantId,
        project_id: ProjectId,
        name: impl Into<String>,
        scopes: Vec<IngestDomain>,
        expires_at: Option<Timestamp>,
    ) -> (Self, String) {
        let raw = generate_raw_key();
        let scopes = if scopes.is_empty() { IngestDomain::ALL.to_vec() } else { scopes };
        let record = Self {
            id: ApiKeyId::generate(),
            tenant_id,
            project_id,
            name: name.into(),
            key_prefix: raw.chars().take(API_KEY_DISPLAY_PREFIX_LEN).collect(),
            key_hash: digest_raw_key(&raw),
            scopes,
            is_active: true,
            last_used_at: None,
            created_at: Timestamp::now(),
            expires_at,
        };
        (record, raw)
    }

    /// Returns true when the key is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expiry| now > expiry)
    }

    /// Returns true when the key is active and unexpired at `now`.
    #[must_use]
    pub fn is_valid(&self, now: Timestamp) -> bool {
        self.is_active && !self.is_expired(now)
    }

    /// Returns true when the key may write the given ingest domain.
    #[must_use]
    pub fn allows(&self, domain: IngestDomain) -> bool {
        self.scopes.contains(&domain)
    }
}

// ============================================================================
// SECTION: Webhook Connections
// ============================================================================

/// CI/CD providers that deliver signed webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookProvider {
    /// GitHub (`X-Hub-Signature-256` HMAC).
    Github,
    /// Azure DevOps (`X-Webhook-Secret` header).
    AzureDevops,
}

impl WebhookProvider {
    /// Returns the stable provider label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::AzureDevops => "azure_devops",
        }
    }

    /// Parses a provider label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "github" => Some(Self::Github),
            "azure_devops" => Some(Self::AzureDevops),
            _ => None,
        }
    }
}

/// CI/CD webhook connection bound to a project.
///
/// # Invariants
/// - `webhook_secret` is stored sealed; handlers receive it plaintext only
///   for signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConnection {
    /// Connection identifier; part of the webhook URL.
    pub id: ConnectionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project; deployments land here.
    pub project_id: ProjectId,
    /// Delivering provider.
    pub provider: WebhookProvider,
    /// Shared secret used for signature verification.
    pub webhook_secret: String,
    /// Whether deliveries are accepted.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

/// Generates a raw API key: the `flk_` prefix plus URL-safe random material.
#[must_use]
pub fn generate_raw_key() -> String {
    let mut entropy = [0_u8; API_KEY_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut entropy);
    use base64::Engine as _;
    let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(entropy);
    format!("{API_KEY_PREFIX}{token}")
}

/// Computes the stored digest of a presented raw key.
#[must_use]
pub fn digest_raw_key(raw: &str) -> String {
    sha256_hex(raw.as_bytes())
}
