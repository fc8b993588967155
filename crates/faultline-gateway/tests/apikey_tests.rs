// faultline-gateway/tests/apikey_tests.rs
// ============================================================================
// Module: Ingest Auth Plane Tests
// Description: API-key validation matrix and cache behavior tests.
// Purpose: Ensure the plane injects the key's own project and nothing else.
// Dependencies: faultline-gateway, faultline-bus, faultline-core
// ============================================================================
//! Validates the full key matrix (valid, unknown, inactive, expired, wrong
//! scope) plus positive/negative caching and invalidation.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions use unwrap for clarity."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use faultline_bus::MemoryKvCache;
use faultline_core::ApiKey;
use faultline_core::ApiKeyId;
use faultline_core::ConnectionId;
use faultline_core::IngestDomain;
use faultline_core::Project;
use faultline_core::ProjectId;
use faultline_core::Tenant;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_core::WebhookConnection;
use faultline_core::digest_raw_key;
use faultline_core::interfaces::IdentityStore;
use faultline_core::interfaces::KvCache;
use faultline_core::interfaces::StoreError;
use faultline_gateway::ApiKeyAuthenticator;
use faultline_gateway::ApiKeyError;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Identity fake counting hash lookups.
#[derive(Default)]
struct CountingIdentityStore {
    /// Stored keys.
    keys: Mutex<Vec<ApiKey>>,
    /// Number of `api_key_by_hash` calls observed.
    lookups: AtomicUsize,
}

impl IdentityStore for CountingIdentityStore {
    fn insert_tenant(&self, _tenant: &Tenant) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert_project(&self, _project: &Project) -> Result<(), StoreError> {
        Ok(())
    }

    fn get_project(&self, _project_id: &ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(None)
    }

    fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError> {
        self.keys.lock().unwrap().push(key.clone());
        Ok(())
    }

    fn api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.keys.lock().unwrap().iter().find(|key| key.key_hash == key_hash).cloned())
    }

    fn touch_api_key(&self, _key_id: &ApiKeyId, _used_at: Timestamp) -> Result<(), StoreError> {
        Ok(())
    }

    fn set_api_key_active(
        &self,
        key_id: &ApiKeyId,
        is_active: bool,
    ) -> Result<(), StoreError> {
        let mut keys = self.keys.lock().unwrap();
        if let Some(key) = keys.iter_mut().find(|key| key.id == *key_id) {
            key.is_active = is_active;
        }
        Ok(())
    }

    fn insert_webhook_connection(
        &self,
        _connection: &WebhookConnection,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    fn get_webhook_connection(
        &self,
        _connection_id: &ConnectionId,
    ) -> Result<Option<WebhookConnection>, StoreError> {
        Ok(None)
    }
}

/// Builds an authenticator plus its seams and one minted key.
fn authenticator_with_key(
    scopes: Vec<IngestDomain>,
    expires_at: Option<Timestamp>,
) -> (ApiKeyAuthenticator, Arc<CountingIdentityStore>, ApiKey, String) {
    let identity = Arc::new(CountingIdentityStore::default());
    let cache = Arc::new(MemoryKvCache::new());
    let (key, raw) = ApiKey::mint(
        TenantId::new("tenant-1"),
        ProjectId::new("project-1"),
        "agent key",
        scopes,
        expires_at,
    );
    identity.insert_api_key(&key).unwrap();
    let authenticator = ApiKeyAuthenticator::new(
        Arc::clone(&identity) as Arc<dyn IdentityStore>,
        cache as Arc<dyn KvCache>,
        Duration::from_secs(300),
        Duration::from_secs(30),
    );
    (authenticator, identity, key, raw)
}

// ============================================================================
// SECTION: Validation Matrix
// ============================================================================

/// A valid key resolves to its own project and tenant.
#[test]
fn valid_key_injects_its_own_project() {
    let (authenticator, _identity, key, raw) = authenticator_with_key(Vec::new(), None);
    let context = authenticator.validate(Some(&raw), IngestDomain::Metrics).unwrap();
    assert_eq!(context.project_id, key.project_id);
    assert_eq!(context.tenant_id, key.tenant_id);
    assert_eq!(context.key_id, key.id);
}

/// A missing header is a distinct failure.
#[test]
fn missing_header_is_rejected() {
    let (authenticator, _identity, _key, _raw) = authenticator_with_key(Vec::new(), None);
    assert!(matches!(
        authenticator.validate(None, IngestDomain::Metrics),
        Err(ApiKeyError::Missing)
    ));
}

/// An unknown key is invalid.
#[test]
fn unknown_key_is_rejected() {
    let (authenticator, _identity, _key, _raw) = authenticator_with_key(Vec::new(), None);
    assert!(matches!(
        authenticator.validate(Some("flk_does-not-exist"), IngestDomain::Metrics),
        Err(ApiKeyError::Invalid)
    ));
}

/// An inactive key fails even though the digest matches.
#[test]
fn inactive_key_is_rejected() {
    let (authenticator, identity, key, raw) = authenticator_with_key(Vec::new(), None);
    identity.set_api_key_active(&key.id, false).unwrap();
    assert!(matches!(
        authenticator.validate(Some(&raw), IngestDomain::Metrics),
        Err(ApiKeyError::Invalid)
    ));
}

/// An expired key fails even though the digest matches.
#[test]
fn expired_key_is_rejected() {
    let expired = Timestamp::now().minus_minutes(5);
    let (authenticator, _identity, _key, raw) = authenticator_with_key(Vec::new(), Some(expired));
    assert!(matches!(
        authenticator.validate(Some(&raw), IngestDomain::Metrics),
        Err(ApiKeyError::Invalid)
    ));
}

/// A key without the domain scope is forbidden, not unauthenticated.
#[test]
fn out_of_scope_domain_is_forbidden() {
    let (authenticator, _identity, _key, raw) =
        authenticator_with_key(vec![IngestDomain::Metrics], None);
    assert!(authenticator.validate(Some(&raw), IngestDomain::Metrics).is_ok());
    assert!(matches!(
        authenticator.validate(Some(&raw), IngestDomain::Logs),
        Err(ApiKeyError::Forbidden("logs"))
    ));
}

// ============================================================================
// SECTION: Cache Behavior
// ============================================================================

/// A second validation is served from the cache.
#[test]
fn positive_lookups_are_cached() {
    let (authenticator, identity, _key, raw) = authenticator_with_key(Vec::new(), None);
    authenticator.validate(Some(&raw), IngestDomain::Metrics).unwrap();
    authenticator.validate(Some(&raw), IngestDomain::Metrics).unwrap();
    assert_eq!(identity.lookups.load(Ordering::SeqCst), 1);
}

/// Unknown keys are negatively cached.
#[test]
fn negative_lookups_are_cached() {
    let (authenticator, identity, _key, _raw) = authenticator_with_key(Vec::new(), None);
    let _ = authenticator.validate(Some("flk_unknown"), IngestDomain::Metrics);
    let _ = authenticator.validate(Some("flk_unknown"), IngestDomain::Metrics);
    assert_eq!(identity.lookups.load(Ordering::SeqCst), 1);
}

/// Invalidation forces the next validation back to the store, observing a
/// deactivation.
#[test]
fn invalidation_observes_status_changes() {
    let (authenticator, identity, key, raw) = authenticator_with_key(Vec::new(), None);
    authenticator.validate(Some(&raw), IngestDomain::Metrics).unwrap();

    identity.set_api_key_active(&key.id, false).unwrap();
    // Still cached: the stale entry answers until invalidated.
    assert!(authenticator.validate(Some(&raw), IngestDomain::Metrics).is_ok());

    authenticator.invalidate(&digest_raw_key(&raw));
    assert!(matches!(
        authenticator.validate(Some(&raw), IngestDomain::Metrics),
        Err(ApiKeyError::Invalid)
    ));
}
