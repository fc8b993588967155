// faultline-gateway/src/lib.rs
// ============================================================================
// Module: Faultline Gateway Library
// Description: HTTP/WebSocket gateway and background workers for Faultline.
// Purpose: Terminate external traffic and host the control-plane engines.
// Dependencies: axum, faultline-{core,bus,config,notify,providers,store}
// ============================================================================

//! ## Overview
//! The gateway hosts every external surface of the control plane: the
//! API-key-authenticated ingest plane, the JWT-gated incident and AI APIs,
//! signed CI/CD webhooks, and the realtime WebSocket endpoint with
//! tenant-isolated fan-out. It also supervises the alert evaluator loop and
//! spawns fire-and-forget AI enrichment tasks. All state is constructed at
//! startup in [`GatewayState::from_config`] and passed by reference.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod ai;
pub mod apikey;
pub mod audit;
pub mod auth;
pub mod error;
pub mod extract;
pub mod incidents;
pub mod ingest;
pub mod limits;
pub mod realtime;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod webhooks;
pub mod workers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use apikey::ApiKeyAuthenticator;
pub use apikey::ApiKeyError;
pub use apikey::IngestContext;
pub use audit::AuthAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use auth::AuthedUser;
pub use auth::Claims;
pub use auth::JwtKeys;
pub use error::ApiError;
pub use limits::RateLimitDecision;
pub use limits::RateLimiter;
pub use realtime::SessionRegistry;
pub use routes::build_router;
pub use routes::serve;
pub use state::GatewayError;
pub use state::GatewayState;
pub use workers::EnrichmentSpawner;
pub use workers::EvaluatorWorker;
