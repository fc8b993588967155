// faultline-gateway/src/routes.rs
// ============================================================================
// Module: Gateway Routes
// Description: Router assembly, edge middleware, and the serve loop.
// Purpose: Terminate external traffic and wire handlers to the state.
// Dependencies: axum, tower-http, faultline-config
// ============================================================================

//! ## Overview
//! The router mounts the ingest plane, the JWT-gated incident and AI
//! surfaces, CI/CD webhooks, the realtime endpoint, and health/internal
//! endpoints. Edge concerns run as layers: CORS from configuration, a body
//! size cap, and a token-bucket rate limiter keyed by the authenticated user
//! when a valid bearer token is present, else the peer IP. Rate-limit header
//! values ride on every limited surface's responses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use faultline_contract::ErrorBody;
use faultline_contract::ErrorCode;
use serde_json::json;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use crate::ai;
use crate::auth::verify_internal_secret;
use crate::error::ApiError;
use crate::incidents;
use crate::ingest;
use crate::limits::RateLimitDecision;
use crate::realtime;
use crate::state::GatewayError;
use crate::state::GatewayState;
use crate::webhooks;
use crate::workers::EvaluatorWorker;

// ============================================================================
// SECTION: Router Assembly
// ============================================================================

/// Builds the full application router.
#[must_use]
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let ingest_routes = Router::new()
        .route("/ingest/metrics", post(ingest::ingest_metrics))
        .route("/ingest/transactions", post(ingest::ingest_transactions))
        .route("/ingest/traces", post(ingest::ingest_traces))
        .route("/ingest/errors", post(ingest::ingest_errors))
        .route("/ingest/logs", post(ingest::ingest_logs))
        .route("/ingest/infrastructure", post(ingest::ingest_infrastructure))
        .route("/ingest/browser", post(ingest::ingest_browser))
        .route("/ingest/vulnerabilities", post(ingest::ingest_vulnerabilities));

    let api_routes = Router::new()
        .route("/incidents", get(incidents::list_incidents).post(incidents::create_incident))
        .route("/incidents-stats", get(incidents::incident_stats))
        .route("/incidents/{incident_id}", get(incidents::get_incident))
        .route("/incidents/{incident_id}/state", patch(incidents::update_state))
        .route("/incidents/{incident_id}/severity", patch(incidents::update_severity))
        .route("/incidents/{incident_id}/comments", post(incidents::add_comment))
        .route("/incidents/{incident_id}/activities", get(incidents::list_activities))
        .route("/incidents/{incident_id}/hypotheses", get(incidents::list_hypotheses))
        .route("/incidents/{incident_id}/workflow", get(incidents::list_workflow))
        .route("/ai/generate-hypotheses", post(ai::generate_hypotheses))
        .route("/ai/generate-hypotheses-batch", post(ai::generate_hypotheses_batch));

    let webhook_routes = Router::new()
        .route("/webhooks/{connection_id}/github", post(webhooks::github_webhook))
        .route("/webhooks/{connection_id}/azure-devops", post(webhooks::azure_devops_webhook));

    let limited = ingest_routes
        .merge(api_routes)
        .merge(webhook_routes)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), rate_limit_middleware));

    Router::new()
        .merge(limited)
        .route("/ws", get(realtime::ws_endpoint))
        .route("/health", get(health))
        .route("/internal/stats", get(internal_stats))
        .layer(RequestBodyLimitLayer::new(state.config.server.max_body_bytes))
        .layer(cors_layer(&state))
        .with_state(state)
}

/// Builds the CORS layer from the configured origin list.
fn cors_layer(state: &GatewayState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
}

// ============================================================================
// SECTION: Rate Limiting Middleware
// ============================================================================

/// Applies the token-bucket limiter, attaching rate-limit headers.
async fn rate_limit_middleware(
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let key = limiter_key(&state, request.headers(), peer);
    match state.limiter.check(&key) {
        RateLimitDecision::Allowed { limit, remaining, reset_secs } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            insert_header(headers, "x-ratelimit-limit", limit.to_string());
            insert_header(headers, "x-ratelimit-remaining", remaining.to_string());
            insert_header(headers, "x-ratelimit-reset", reset_secs.to_string());
            response
        }
        RateLimitDecision::Limited { limit, retry_after_secs } => {
            let body = ErrorBody::new("Rate limit exceeded", ErrorCode::RateLimited);
            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            let headers = response.headers_mut();
            insert_header(headers, "x-ratelimit-limit", limit.to_string());
            insert_header(headers, "x-ratelimit-remaining", "0".to_string());
            insert_header(headers, "x-ratelimit-reset", retry_after_secs.to_string());
            insert_header(headers, "retry-after", retry_after_secs.to_string());
            response
        }
    }
}

/// Chooses the limiter key: authenticated user id, else peer IP.
fn limiter_key(state: &GatewayState, headers: &HeaderMap, peer: SocketAddr) -> String {
    state
        .jwt
        .authenticate(headers)
        .map_or_else(|_| format!("ip:{}", peer.ip()), |user| format!("user:{}", user.user_id))
}

/// Inserts a header, ignoring invalid values.
fn insert_header(headers: &mut HeaderMap, name: &'static str, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(name, value);
    }
}

// ============================================================================
// SECTION: Health / Internal
// ============================================================================

/// `GET /health`.
async fn health(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "faultline-gateway",
        "connections": state.realtime.connection_count(),
        "timestamp": faultline_core::Timestamp::now(),
    }))
}

/// `GET /internal/stats`, gated by the internal service secret.
async fn internal_stats(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !verify_internal_secret(&headers, &state.config.auth.internal_secret) {
        return Err(ApiError::forbidden("internal endpoint"));
    }
    Ok(Json(json!({
        "total_connections": state.realtime.connection_count(),
        "timestamp": faultline_core::Timestamp::now(),
    })))
}

// ============================================================================
// SECTION: Serve
// ============================================================================

/// Runs the gateway until ctrl-c: binds the listener, starts the fan-out
/// tasks and the supervised evaluator, and serves the router.
///
/// # Errors
///
/// Returns [`GatewayError`] when binding or serving fails.
pub async fn serve(state: Arc<GatewayState>) -> Result<(), GatewayError> {
    let addr: SocketAddr = state
        .config
        .server
        .bind
        .parse()
        .map_err(|_| GatewayError::Config("invalid bind address".to_string()))?;

    realtime::spawn_fanout(&state.bus, Arc::clone(&state.realtime));
    let evaluator = EvaluatorWorker::start(
        Arc::clone(&state.evaluator),
        Duration::from_secs(state.config.alerting.tick_interval_secs),
    );

    let router = build_router(Arc::clone(&state));
    let result = if let Some(tls) = &state.config.server.tls {
        let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            &tls.cert_path,
            &tls.key_path,
        )
        .await
        .map_err(|err| GatewayError::Config(err.to_string()))?;
        info!(%addr, "faultline gateway listening (tls)");
        axum_server::bind_rustls(addr, rustls)
            .serve(router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))
    } else {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        info!(%addr, "faultline gateway listening");
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .map_err(|err| GatewayError::Transport(err.to_string()))
    };

    evaluator.stop().await;
    result
}
