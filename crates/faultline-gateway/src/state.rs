// faultline-gateway/src/state.rs
// ============================================================================
// Module: Gateway State
// Description: Shared state wiring every seam together at startup.
// Purpose: Construct the control plane once and pass it by reference.
// Dependencies: faultline-{core,bus,config,notify,providers,store-sqlite}
// ============================================================================

//! ## Overview
//! [`GatewayState`] owns every long-lived collaborator: the durable store
//! behind all four repository seams, the in-process bus and cache, the alert
//! evaluator, incident orchestrator, hypothesis engine, notifier, rate
//! limiter, and auth material. Everything is constructed in
//! [`GatewayState::from_config`] and shared via `Arc`; nothing lives in
//! module-level statics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use faultline_bus::MemoryBus;
use faultline_bus::MemoryKvCache;
use faultline_config::FaultlineConfig;
use faultline_core::AlertEvaluator;
use faultline_core::HypothesisEngine;
use faultline_core::IncidentOrchestrator;
use faultline_core::SealedBox;
use faultline_core::TokenPricing;
use faultline_core::interfaces::AlertStore;
use faultline_core::interfaces::EventBus;
use faultline_core::interfaces::IdentityStore;
use faultline_core::interfaces::IncidentStore;
use faultline_core::interfaces::KvCache;
use faultline_core::interfaces::ModelClient;
use faultline_core::interfaces::Notifier;
use faultline_core::interfaces::TelemetryStore;
use faultline_notify::AlertNotifier;
use faultline_providers::MockModelClient;
use faultline_providers::OpenAiCompatClient;
use faultline_providers::OpenAiCompatConfig;
use faultline_store_sqlite::SqliteStore;
use faultline_store_sqlite::SqliteStoreConfig;
use thiserror::Error;
use tracing::info;

use crate::apikey::ApiKeyAuthenticator;
use crate::audit::AuthAuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::JwtKeys;
use crate::limits::RateLimiter;
use crate::telemetry::GatewayMetrics;
use crate::telemetry::NoopMetrics;
use crate::workers::EnrichmentSpawner;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway construction errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration rejected.
    #[error("gateway config error: {0}")]
    Config(String),
    /// Store initialization failed.
    #[error("gateway store error: {0}")]
    Store(String),
    /// Transport initialization failed.
    #[error("gateway transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared gateway state.
pub struct GatewayState {
    /// Loaded configuration.
    pub config: FaultlineConfig,
    /// Identity repository.
    pub identity: Arc<dyn IdentityStore>,
    /// Telemetry repository.
    pub telemetry: Arc<dyn TelemetryStore>,
    /// Alerting repository.
    pub alerts: Arc<dyn AlertStore>,
    /// Incident repository.
    pub incidents: Arc<dyn IncidentStore>,
    /// In-process event bus (concrete for `subscribe_all`).
    pub bus: Arc<MemoryBus>,
    /// Process-wide KV cache.
    pub cache: Arc<dyn KvCache>,
    /// Ingest auth plane.
    pub api_keys: Arc<ApiKeyAuthenticator>,
    /// JWT keys for the API surface and realtime handshake.
    pub jwt: JwtKeys,
    /// Token-bucket rate limiter.
    pub limiter: Arc<RateLimiter>,
    /// Incident lifecycle engine.
    pub orchestrator: Arc<IncidentOrchestrator>,
    /// Hypothesis generation engine.
    pub enrichment: Arc<HypothesisEngine>,
    /// Alert evaluation engine.
    pub evaluator: Arc<AlertEvaluator>,
    /// Realtime session registry.
    pub realtime: Arc<crate::realtime::SessionRegistry>,
    /// Metrics sink.
    pub metrics: Arc<dyn GatewayMetrics>,
    /// Audit sink for auth decisions.
    pub audit: Arc<dyn AuthAuditSink>,
}

impl GatewayState {
    /// Builds the full control plane from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a collaborator cannot be constructed.
    pub fn from_config(config: FaultlineConfig) -> Result<Arc<Self>, GatewayError> {
        config.validate().map_err(|err| GatewayError::Config(err.to_string()))?;
        let secrets = SealedBox::from_master_key(&config.encryption.master_key);
        let store_config = SqliteStoreConfig {
            path: config.store.path.clone(),
            busy_timeout_ms: config.store.busy_timeout_ms,
        };
        let store = Arc::new(
            SqliteStore::open(&store_config, secrets)
                .map_err(|err| GatewayError::Store(err.to_string()))?,
        );
        Self::from_parts(config, store)
    }

    /// Builds the control plane over an existing store; used by tests and
    /// the CLI's offline tooling.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a collaborator cannot be constructed.
    pub fn from_parts(
        config: FaultlineConfig,
        store: Arc<SqliteStore>,
    ) -> Result<Arc<Self>, GatewayError> {
        let bus = Arc::new(MemoryBus::new());
        let cache: Arc<dyn KvCache> = Arc::new(MemoryKvCache::new());

        let identity: Arc<dyn IdentityStore> = Arc::clone(&store) as Arc<dyn IdentityStore>;
        let telemetry: Arc<dyn TelemetryStore> = Arc::clone(&store) as Arc<dyn TelemetryStore>;
        let alerts: Arc<dyn AlertStore> = Arc::clone(&store) as Arc<dyn AlertStore>;
        let incidents: Arc<dyn IncidentStore> = Arc::clone(&store) as Arc<dyn IncidentStore>;

        let api_keys = Arc::new(ApiKeyAuthenticator::new(
            Arc::clone(&identity),
            Arc::clone(&cache),
            Duration::from_secs(config.cache.positive_ttl_secs),
            Duration::from_secs(config.cache.negative_ttl_secs),
        ));

        let model = build_model_client(&config)?;
        let pricing = TokenPricing {
            input_per_million: config.ai.input_price_per_million,
            output_per_million: config.ai.output_price_per_million,
        };
        let enrichment = Arc::new(HypothesisEngine::new(
            Arc::clone(&incidents),
            Arc::clone(&cache),
            Arc::clone(&bus) as Arc<dyn EventBus>,
            model,
            pricing,
        ));

        let trigger = Arc::new(EnrichmentSpawner::new(Arc::clone(&enrichment)));
        let orchestrator = Arc::new(IncidentOrchestrator::new(
            Arc::clone(&incidents),
            Arc::clone(&bus) as Arc<dyn EventBus>,
            trigger,
        ));

        let notifier: Arc<dyn Notifier> = Arc::new(AlertNotifier::new(
            Arc::clone(&alerts),
            Arc::clone(&bus) as Arc<dyn EventBus>,
            Duration::from_secs(config.notify.delivery_timeout_secs),
            config.notify.smtp_password.clone(),
        ));
        let evaluator = Arc::new(AlertEvaluator::new(
            Arc::clone(&alerts),
            Arc::clone(&telemetry),
            Arc::clone(&bus) as Arc<dyn EventBus>,
            notifier,
        ));

        let jwt = JwtKeys::from_secret(&config.auth.jwt_secret);
        let limiter = Arc::new(RateLimiter::new(
            config.server.rate_limit_capacity,
            Duration::from_secs(config.server.rate_limit_window_secs),
        ));

        Ok(Arc::new(Self {
            config,
            identity,
            telemetry,
            alerts,
            incidents,
            bus,
            cache,
            api_keys,
            jwt,
            limiter,
            orchestrator,
            enrichment,
            evaluator,
            realtime: Arc::new(crate::realtime::SessionRegistry::new()),
            metrics: Arc::new(NoopMetrics),
            audit: Arc::new(StderrAuditSink),
        }))
    }
}

/// Selects the hosted model client when credentials exist, else the mock.
fn build_model_client(
    config: &FaultlineConfig,
) -> Result<Arc<dyn ModelClient>, GatewayError> {
    if config.ai.has_credentials() {
        let endpoint = config.ai.endpoint.clone().unwrap_or_default();
        let api_key = config.ai.api_key.clone().unwrap_or_default();
        let client = OpenAiCompatClient::new(OpenAiCompatConfig {
            endpoint,
            api_key,
            model: config.ai.model.clone(),
            timeout: Duration::from_secs(config.ai.request_timeout_secs),
        })
        .map_err(|err| GatewayError::Transport(err.to_string()))?;
        info!(model = %config.ai.model, "using hosted model client");
        Ok(Arc::new(client))
    } else {
        info!("no model credentials configured; using deterministic mock generator");
        Ok(Arc::new(MockModelClient::new()))
    }
}
