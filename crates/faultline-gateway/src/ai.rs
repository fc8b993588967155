// faultline-gateway/src/ai.rs
// ============================================================================
// Module: AI Endpoint Handlers
// Description: Hypothesis generation endpoints with single-flight semantics.
// Purpose: Expose the hypothesis engine over HTTP.
// Dependencies: axum, faultline-contract, faultline-core
// ============================================================================

//! ## Overview
//! The single endpoint generates (or returns cached) hypotheses for one
//! incident; a single-flight collision answers 409 and the caller must not
//! retry within the lock TTL. The batch endpoint accepts up to ten incidents
//! and reports cached and processed counts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use faultline_contract::ApiEnvelope;
use faultline_contract::GenerateHypothesesBatchRequest;
use faultline_contract::GenerateHypothesesRequest;
use faultline_core::IncidentId;
use faultline_core::is_valid_uuid;
use faultline_core::runtime::BatchOutcome;
use faultline_core::runtime::GenerationOutcome;
use serde::Serialize;

use crate::error::ApiError;
use crate::extract::Body;
use crate::incidents::ProjectQuery;
use crate::state::GatewayState;

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Single-incident generation payload.
#[derive(Debug, Serialize)]
pub struct GenerationView {
    /// Incident the hypotheses belong to.
    pub incident_id: String,
    /// Number of hypotheses available.
    pub hypotheses_generated: usize,
    /// Hypotheses in rank order.
    pub hypotheses: Vec<faultline_core::Hypothesis>,
    /// True when the persisted cache served the result.
    pub cached: bool,
    /// True when the mock generator produced the result.
    pub using_mock: bool,
    /// Token usage; absent for mock and cached results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsageView>,
}

/// Token usage payload.
#[derive(Debug, Serialize)]
pub struct TokenUsageView {
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Completion tokens produced.
    pub output_tokens: u64,
    /// Total tokens.
    pub total_tokens: u64,
}

/// Batch generation payload.
#[derive(Debug, Serialize)]
pub struct BatchView {
    /// Requested batch size.
    pub batch_size: usize,
    /// Incidents processed through the model.
    pub processed: usize,
    /// Cache hits.
    pub cached: usize,
    /// Per-incident results.
    pub results: Vec<GenerationView>,
}

impl From<GenerationOutcome> for GenerationView {
    fn from(outcome: GenerationOutcome) -> Self {
        let token_usage = (!outcome.mock && !outcome.cached).then(|| TokenUsageView {
            input_tokens: outcome.usage.input_tokens,
            output_tokens: outcome.usage.output_tokens,
            total_tokens: outcome.usage.input_tokens + outcome.usage.output_tokens,
        });
        Self {
            incident_id: outcome.incident_id.to_string(),
            hypotheses_generated: outcome.hypotheses.len(),
            hypotheses: outcome.hypotheses,
            cached: outcome.cached,
            using_mock: outcome.mock,
            token_usage,
        }
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /ai/generate-hypotheses`.
pub async fn generate_hypotheses(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(query): Query<ProjectQuery>,
    Body(request): Body<GenerateHypothesesRequest>,
) -> Result<Json<ApiEnvelope<GenerationView>>, ApiError> {
    let (_user, project_id) =
        crate::incidents::resolve_scope(&state, &headers, query.project_id.as_deref())?;
    if !is_valid_uuid(&request.incident_id) {
        return Err(ApiError::invalid_uuid("incident_id", &request.incident_id));
    }
    let incident_id = IncidentId::new(request.incident_id);
    let outcome = state.enrichment.generate(&project_id, &incident_id).await?;
    Ok(Json(ApiEnvelope::ok(outcome.into())))
}

/// `POST /ai/generate-hypotheses-batch`.
pub async fn generate_hypotheses_batch(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(query): Query<ProjectQuery>,
    Body(request): Body<GenerateHypothesesBatchRequest>,
) -> Result<Json<ApiEnvelope<BatchView>>, ApiError> {
    let (_user, project_id) =
        crate::incidents::resolve_scope(&state, &headers, query.project_id.as_deref())?;
    if request.incident_ids.is_empty() {
        return Err(ApiError::validation("No incidents provided"));
    }
    for raw in &request.incident_ids {
        if !is_valid_uuid(raw) {
            return Err(ApiError::invalid_uuid("incident_ids", raw));
        }
    }
    let requests: Vec<_> = request
        .incident_ids
        .iter()
        .map(|raw| (project_id.clone(), IncidentId::new(raw.clone())))
        .collect();
    let batch_size = requests.len();
    let BatchOutcome { results, cached, processed } =
        state.enrichment.generate_batch(&requests).await?;
    let body = BatchView {
        batch_size,
        processed,
        cached,
        results: results.into_iter().map(GenerationView::from).collect(),
    };
    Ok(Json(ApiEnvelope::ok(body)))
}
