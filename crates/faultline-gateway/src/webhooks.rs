// faultline-gateway/src/webhooks.rs
// ============================================================================
// Module: CI/CD Webhook Handlers
// Description: Signed webhook intake creating deployment records.
// Purpose: Verify provider signatures and persist accepted events.
// Dependencies: axum, hmac, sha2, subtle, faultline-core
// ============================================================================

//! ## Overview
//! GitHub deliveries verify `X-Hub-Signature-256` as
//! `sha256=HMAC_SHA256(secret, body)`; Azure DevOps deliveries verify the
//! `X-Webhook-Secret` header by constant-time compare. Both resolve the
//! connection from the URL, require it active, and create a Deployment row
//! for accepted events (`deployment`, `workflow_run`, `push`,
//! `build.complete`). Everything else acknowledges without persisting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use faultline_core::ConnectionId;
use faultline_core::Deployment;
use faultline_core::Timestamp;
use faultline_core::WebhookConnection;
use faultline_core::WebhookProvider;
use hmac::Hmac;
use hmac::Mac;
use serde_json::Value;
use serde_json::json;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::audit::AuthAuditEvent;
use crate::error::ApiError;
use crate::state::GatewayState;

// ============================================================================
// SECTION: Signature Verification
// ============================================================================

/// Verifies a GitHub `X-Hub-Signature-256` header against the body.
#[must_use]
pub fn verify_github_signature(body: &[u8], signature: Option<&str>, secret: &str) -> bool {
    let Some(signature) = signature else {
        return false;
    };
    if secret.is_empty() || !signature.starts_with("sha256=") {
        return false;
    }
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    let mut expected = String::with_capacity(7 + digest.len() * 2);
    expected.push_str("sha256=");
    for byte in digest {
        let _ = std::fmt::Write::write_fmt(&mut expected, format_args!("{byte:02x}"));
    }
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Verifies an Azure DevOps `X-Webhook-Secret` header in constant time.
#[must_use]
pub fn verify_shared_secret(presented: Option<&str>, secret: &str) -> bool {
    let Some(presented) = presented else {
        return false;
    };
    if secret.is_empty() {
        return false;
    }
    presented.as_bytes().ct_eq(secret.as_bytes()).into()
}

// ============================================================================
// SECTION: Shared Plumbing
// ============================================================================

/// Loads an active connection for the expected provider.
fn load_connection(
    state: &GatewayState,
    raw_id: &str,
    provider: WebhookProvider,
) -> Result<WebhookConnection, ApiError> {
    let connection = state
        .identity
        .get_webhook_connection(&ConnectionId::new(raw_id))?
        .ok_or_else(|| ApiError::not_found("Connection not found"))?;
    if connection.provider != provider {
        return Err(ApiError::not_found("Connection not found"));
    }
    if !connection.is_active {
        return Err(ApiError::validation("Connection is inactive"));
    }
    Ok(connection)
}

/// Persists a deployment row for an accepted event.
#[allow(clippy::too_many_arguments, reason = "Deployment rows carry this many fields.")]
fn create_deployment(
    state: &GatewayState,
    connection: &WebhookConnection,
    service: String,
    version: String,
    commit_sha: Option<String>,
    description: String,
    deployed_by: String,
    status: String,
) -> Result<Value, ApiError> {
    let deployment = Deployment {
        tenant_id: connection.tenant_id.clone(),
        project_id: connection.project_id.clone(),
        service: service.clone(),
        version: version.clone(),
        environment: "production".to_string(),
        commit_sha: commit_sha.clone(),
        description,
        deployed_by,
        status: status.clone(),
        source: connection.provider.as_str().to_string(),
        completed_at: Timestamp::now(),
    };
    state.telemetry.insert_deployment(&deployment)?;
    Ok(json!({
        "service": service,
        "version": version,
        "commit_sha": commit_sha,
        "status": status,
    }))
}

/// Reads a nested string field, empty when absent.
fn str_at<'a>(value: &'a Value, path: &[&str]) -> &'a str {
    let mut current = value;
    for key in path {
        let Some(next) = current.get(key) else {
            return "";
        };
        current = next;
    }
    current.as_str().unwrap_or("")
}

// ============================================================================
// SECTION: GitHub
// ============================================================================

/// `POST /webhooks/{connection_id}/github`.
pub async fn github_webhook(
    State(state): State<Arc<GatewayState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let connection = load_connection(&state, &raw_id, WebhookProvider::Github)?;
    let signature = headers.get("x-hub-signature-256").and_then(|value| value.to_str().ok());
    if !verify_github_signature(&body, signature, &connection.webhook_secret) {
        state.audit.record(&AuthAuditEvent::denied("webhook", raw_id, "invalid signature"));
        return Err(ApiError::unauthorized("Invalid webhook signature"));
    }
    state.audit.record(&AuthAuditEvent::allowed("webhook", &raw_id, Some("github".to_string())));

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::validation("Invalid JSON payload"))?;
    let event = headers
        .get("x-github-event")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let repo_name = {
        let full = str_at(&payload, &["repository", "full_name"]);
        if full.is_empty() { str_at(&payload, &["repository", "name"]) } else { full }
    };
    let deployment = match event {
        "deployment" => {
            let sha = str_at(&payload, &["deployment", "sha"]);
            let reference = str_at(&payload, &["deployment", "ref"]);
            let version = if reference.is_empty() {
                sha.chars().take(7).collect::<String>()
            } else {
                reference.to_string()
            };
            Some(create_deployment(
                &state,
                &connection,
                fallback_service(repo_name),
                if version.is_empty() { "unknown".to_string() } else { version },
                (!sha.is_empty()).then(|| sha.chars().take(40).collect()),
                str_at(&payload, &["deployment", "description"]).to_string(),
                actor_login(&payload),
                "success".to_string(),
            )?)
        }
        "workflow_run" => {
            let conclusion = str_at(&payload, &["workflow_run", "conclusion"]);
            let status = match conclusion {
                "success" => "success",
                "failure" => "failed",
                _ => "in_progress",
            };
            let sha = str_at(&payload, &["workflow_run", "head_sha"]);
            Some(create_deployment(
                &state,
                &connection,
                fallback_service(repo_name),
                str_at(&payload, &["workflow_run", "head_branch"]).to_string(),
                (!sha.is_empty()).then(|| sha.chars().take(40).collect()),
                str_at(&payload, &["workflow_run", "name"]).to_string(),
                actor_login(&payload),
                status.to_string(),
            )?)
        }
        "push" => {
            let sha = str_at(&payload, &["after"]);
            Some(create_deployment(
                &state,
                &connection,
                fallback_service(repo_name),
                str_at(&payload, &["ref"]).to_string(),
                (!sha.is_empty()).then(|| sha.chars().take(40).collect()),
                str_at(&payload, &["head_commit", "message"]).to_string(),
                str_at(&payload, &["pusher", "name"]).to_string(),
                "success".to_string(),
            )?)
        }
        _ => None,
    };

    Ok(Json(json!({
        "status": "accepted",
        "event": event,
        "deployment": deployment,
    })))
}

/// Returns the sender login, defaulting to the provider label.
fn actor_login(payload: &Value) -> String {
    let login = str_at(payload, &["sender", "login"]);
    if login.is_empty() { "github".to_string() } else { login.to_string() }
}

/// Defaults an empty repository name.
fn fallback_service(repo_name: &str) -> String {
    if repo_name.is_empty() { "unknown".to_string() } else { repo_name.to_string() }
}

// ============================================================================
// SECTION: Azure DevOps
// ============================================================================

/// `POST /webhooks/{connection_id}/azure-devops`.
pub async fn azure_devops_webhook(
    State(state): State<Arc<GatewayState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let connection = load_connection(&state, &raw_id, WebhookProvider::AzureDevops)?;
    let presented = headers.get("x-webhook-secret").and_then(|value| value.to_str().ok());
    if !verify_shared_secret(presented, &connection.webhook_secret) {
        state.audit.record(&AuthAuditEvent::denied("webhook", raw_id, "invalid secret"));
        return Err(ApiError::unauthorized("Invalid webhook secret"));
    }
    state
        .audit
        .record(&AuthAuditEvent::allowed("webhook", &raw_id, Some("azure_devops".to_string())));

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::validation("Invalid JSON payload"))?;
    let event = str_at(&payload, &["eventType"]);

    let deployment = if event == "build.complete" {
        let result = str_at(&payload, &["resource", "result"]);
        let status = if result == "succeeded" { "success" } else { "failed" };
        let definition = str_at(&payload, &["resource", "definition", "name"]);
        let sha = str_at(&payload, &["resource", "sourceVersion"]);
        Some(create_deployment(
            &state,
            &connection,
            fallback_service(definition),
            str_at(&payload, &["resource", "buildNumber"]).to_string(),
            (!sha.is_empty()).then(|| sha.chars().take(40).collect()),
            str_at(&payload, &["message", "text"]).to_string(),
            str_at(&payload, &["resource", "requestedFor", "displayName"]).to_string(),
            status.to_string(),
        )?)
    } else {
        None
    };

    Ok(Json(json!({
        "status": "accepted",
        "event": event,
        "deployment": deployment,
    })))
}
