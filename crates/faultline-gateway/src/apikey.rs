// faultline-gateway/src/apikey.rs
// ============================================================================
// Module: Ingest API-Key Plane
// Description: API-key validation with a process-wide lookup cache.
// Purpose: Resolve presented keys to project context before persistence.
// Dependencies: faultline-core, serde
// ============================================================================

//! ## Overview
//! Every ingest request presents an `X-API-Key` header. The plane digests the
//! key, consults the KV cache (positive entries for five minutes, negative
//! for thirty seconds), and falls back to the store on a miss. The cache is
//! authoritative for speed, not correctness: deactivating a key invalidates
//! its cache entry. Validation failures never persist anything; successful
//! validation injects `(project_id, tenant_id)` into the batch and updates
//! `last_used_at` best-effort.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use faultline_core::ApiKeyId;
use faultline_core::IngestDomain;
use faultline_core::ProjectId;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_core::digest_raw_key;
use faultline_core::interfaces::IdentityStore;
use faultline_core::interfaces::KvCache;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// API-key validation failures.
#[derive(Debug, Error)]
pub enum ApiKeyError {
    /// Header missing.
    #[error("X-API-Key header is required")]
    Missing,
    /// Key unknown, inactive, or expired.
    #[error("invalid or inactive API key")]
    Invalid,
    /// Key lacks the scope for the addressed domain.
    #[error("API key not authorized for ingest domain {0}")]
    Forbidden(&'static str),
    /// Store unavailable while validating.
    #[error("authentication backend unavailable")]
    Unavailable,
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Project context injected into validated ingest payloads.
#[derive(Debug, Clone)]
pub struct IngestContext {
    /// Validated key identifier.
    pub key_id: ApiKeyId,
    /// Tenant the key belongs to.
    pub tenant_id: TenantId,
    /// Project every record in the batch lands in.
    pub project_id: ProjectId,
}

/// Cached lookup result keyed by key digest.
#[derive(Debug, Serialize, Deserialize)]
struct CachedLookup {
    /// Whether the digest maps to a usable key.
    valid: bool,
    /// Key identifier for valid entries.
    #[serde(default)]
    key_id: Option<String>,
    /// Tenant for valid entries.
    #[serde(default)]
    tenant_id: Option<String>,
    /// Project for valid entries.
    #[serde(default)]
    project_id: Option<String>,
    /// Granted scopes for valid entries.
    #[serde(default)]
    scopes: Vec<IngestDomain>,
}

// ============================================================================
// SECTION: Authenticator
// ============================================================================

/// API-key authenticator with cache fallback.
pub struct ApiKeyAuthenticator {
    /// Identity repository.
    identity: Arc<dyn IdentityStore>,
    /// Process-wide lookup cache.
    cache: Arc<dyn KvCache>,
    /// TTL for successful lookups.
    positive_ttl: Duration,
    /// TTL for failed lookups.
    negative_ttl: Duration,
}

impl ApiKeyAuthenticator {
    /// Builds an authenticator over the identity store and cache.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        cache: Arc<dyn KvCache>,
        positive_ttl: Duration,
        negative_ttl: Duration,
    ) -> Self {
        Self { identity, cache, positive_ttl, negative_ttl }
    }

    /// Validates a presented key for a domain, returning the project context.
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeyError`] when the key is missing, unusable, or lacks
    /// the domain scope.
    pub fn validate(
        &self,
        presented: Option<&str>,
        domain: IngestDomain,
    ) -> Result<IngestContext, ApiKeyError> {
        let presented = presented.filter(|key| !key.trim().is_empty()).ok_or(ApiKeyError::Missing)?;
        let digest = digest_raw_key(presented);
        let cache_key = format!("apikey:{digest}");

        if let Some(raw) = self.cache.get(&cache_key) {
            if let Ok(cached) = serde_json::from_str::<CachedLookup>(&raw) {
                return self.from_cached(&cached, domain);
            }
            // Unreadable entries are dropped and revalidated.
            self.cache.remove(&cache_key);
        }

        let lookup = match self.identity.api_key_by_hash(&digest) {
            Ok(lookup) => lookup,
            Err(err) => {
                debug!(error = %err, "api key lookup failed");
                return Err(ApiKeyError::Unavailable);
            }
        };
        let now = Timestamp::now();
        let Some(key) = lookup.filter(|key| key.is_valid(now)) else {
            let negative = CachedLookup {
                valid: false,
                key_id: None,
                tenant_id: None,
                project_id: None,
                scopes: Vec::new(),
            };
            self.cache_lookup(&cache_key, &negative, self.negative_ttl);
            return Err(ApiKeyError::Invalid);
        };

        let positive = CachedLookup {
            valid: true,
            key_id: Some(key.id.to_string()),
            tenant_id: Some(key.tenant_id.to_string()),
            project_id: Some(key.project_id.to_string()),
            scopes: key.scopes.clone(),
        };
        self.cache_lookup(&cache_key, &positive, self.positive_ttl);
        self.from_cached(&positive, domain)
    }

    /// Invalidates the cache entry for a key digest after scope or status
    /// changes.
    pub fn invalidate(&self, key_hash: &str) {
        self.cache.remove(&format!("apikey:{key_hash}"));
    }

    /// Updates `last_used_at` best-effort; failures are swallowed.
    pub fn touch(&self, context: &IngestContext) {
        let _ = self.identity.touch_api_key(&context.key_id, Timestamp::now());
    }

    /// Builds the context from a cached lookup, enforcing scope.
    fn from_cached(
        &self,
        cached: &CachedLookup,
        domain: IngestDomain,
    ) -> Result<IngestContext, ApiKeyError> {
        if !cached.valid {
            return Err(ApiKeyError::Invalid);
        }
        if !cached.scopes.contains(&domain) {
            return Err(ApiKeyError::Forbidden(domain.as_str()));
        }
        match (&cached.key_id, &cached.tenant_id, &cached.project_id) {
            (Some(key_id), Some(tenant_id), Some(project_id)) => Ok(IngestContext {
                key_id: ApiKeyId::new(key_id.clone()),
                tenant_id: TenantId::new(tenant_id.clone()),
                project_id: ProjectId::new(project_id.clone()),
            }),
            _ => Err(ApiKeyError::Invalid),
        }
    }

    /// Writes a lookup into the cache; serialization failure just skips
    /// caching.
    fn cache_lookup(&self, cache_key: &str, lookup: &CachedLookup, ttl: Duration) {
        if let Ok(serialized) = serde_json::to_string(lookup) {
            self.cache.put_ttl(cache_key, &serialized, ttl);
        }
    }
}
