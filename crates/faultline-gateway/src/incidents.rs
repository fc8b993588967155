// faultline-gateway/src/incidents.rs
// ============================================================================
// Module: Incident API Handlers
// Description: JWT-gated incident surface in the standard envelope.
// Purpose: Expose the orchestrator over HTTP with strict validation.
// Dependencies: axum, faultline-contract, faultline-core
// ============================================================================

//! ## Overview
//! Every handler authenticates the bearer token, validates the `project_id`
//! query parameter as a UUID belonging to the caller's tenant, and delegates
//! to the orchestrator or the store. Responses use the standard
//! `{status, data, total?}` envelope; guard violations surface as 400 with
//! `INVALID_FIELD_VALUE`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use faultline_contract::AddCommentRequest;
use faultline_contract::ApiEnvelope;
use faultline_contract::CreateIncidentRequest;
use faultline_contract::IncidentPage;
use faultline_contract::UpdateSeverityRequest;
use faultline_contract::UpdateStateRequest;
use faultline_contract::incidents::BODY_LIMIT;
use faultline_contract::incidents::TITLE_LIMIT;
use faultline_core::Activity;
use faultline_core::AnalysisStep;
use faultline_core::Hypothesis;
use faultline_core::Incident;
use faultline_core::IncidentId;
use faultline_core::IncidentSeverity;
use faultline_core::IncidentState;
use faultline_core::NewIncident;
use faultline_core::ProjectId;
use faultline_core::interfaces::IncidentFilter;
use faultline_core::interfaces::IncidentStats;
use faultline_core::is_valid_uuid;
use serde::Deserialize;

use crate::auth::AuthedUser;
use crate::extract::Body;
use crate::error::ApiError;
use crate::state::GatewayState;

// ============================================================================
// SECTION: Query Parameters
// ============================================================================

/// Common project-scoped query parameters.
#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size, capped at 100.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Severity filter.
    #[serde(default)]
    pub severity: Option<String>,
    /// State filter.
    #[serde(default)]
    pub state: Option<String>,
    /// Substring search over title/description/service.
    #[serde(default)]
    pub search: Option<String>,
}

// ============================================================================
// SECTION: Shared Plumbing
// ============================================================================

/// Authenticates the bearer token and resolves the project scope.
///
/// The project must exist and belong to the caller's tenant; anything else
/// is indistinguishable from a missing project.
pub(crate) fn resolve_scope(
    state: &GatewayState,
    headers: &HeaderMap,
    project_id: Option<&str>,
) -> Result<(AuthedUser, ProjectId), ApiError> {
    let user = state
        .jwt
        .authenticate(headers)
        .map_err(|err| ApiError::unauthorized(err.to_string()))?;
    let raw = project_id.map(str::trim).filter(|value| !value.is_empty());
    let Some(raw) = raw else {
        return Err(ApiError::missing_project_id());
    };
    if !is_valid_uuid(raw) {
        return Err(ApiError::invalid_uuid("project_id", raw));
    }
    let project_id = ProjectId::new(raw);
    let project = state
        .identity
        .get_project(&project_id)?
        .filter(|project| project.tenant_id == user.tenant_id)
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok((user, project.id))
}

/// Validates an incident path segment as a UUID.
fn incident_id(raw: &str) -> Result<IncidentId, ApiError> {
    if is_valid_uuid(raw) {
        Ok(IncidentId::new(raw))
    } else {
        Err(ApiError::invalid_uuid("incident_id", raw))
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /incidents`.
pub async fn list_incidents(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiEnvelope<IncidentPage>>, ApiError> {
    let (_user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let severity = query
        .severity
        .as_deref()
        .map(|raw| {
            IncidentSeverity::parse(raw)
                .ok_or_else(|| ApiError::invalid_field(format!("invalid severity: {raw}")))
        })
        .transpose()?;
    let incident_state = query
        .state
        .as_deref()
        .map(|raw| {
            IncidentState::parse(raw)
                .ok_or_else(|| ApiError::invalid_field(format!("invalid state: {raw}")))
        })
        .transpose()?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let filter = IncidentFilter {
        severity,
        state: incident_state,
        search: query.search.clone(),
        page,
        limit,
    };
    let (items, total) = state.incidents.list_incidents(&project_id, &filter)?;
    let pages = total.div_ceil(u64::from(limit));
    let body = IncidentPage { items, total, page, limit, pages };
    Ok(Json(ApiEnvelope::ok_with_total(body, total)))
}

/// `POST /incidents`.
pub async fn create_incident(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(query): Query<ProjectQuery>,
    Body(request): Body<CreateIncidentRequest>,
) -> Result<Json<ApiEnvelope<Incident>>, ApiError> {
    let (user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    if title.chars().count() > TITLE_LIMIT {
        return Err(ApiError::validation(format!("title exceeds {TITLE_LIMIT} characters")));
    }
    if request.description.chars().count() > BODY_LIMIT {
        return Err(ApiError::validation(format!(
            "description exceeds {BODY_LIMIT} characters"
        )));
    }
    if request.service_name.trim().is_empty() {
        return Err(ApiError::validation("service_name is required"));
    }
    let incident = state.orchestrator.create_incident(NewIncident {
        tenant_id: user.tenant_id.clone(),
        project_id,
        title: title.to_string(),
        description: request.description,
        service_name: request.service_name.trim().to_string(),
        severity: request.severity,
    })?;
    Ok(Json(ApiEnvelope::ok(incident)))
}

/// `GET /incidents/{incident_id}`.
pub async fn get_incident(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ApiEnvelope<Incident>>, ApiError> {
    let (_user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let incident_id = incident_id(&raw_id)?;
    let incident = state
        .incidents
        .get_incident(&project_id, &incident_id)?
        .ok_or_else(|| ApiError::not_found("Incident not found"))?;
    Ok(Json(ApiEnvelope::ok(incident)))
}

/// `PATCH /incidents/{incident_id}/state`.
pub async fn update_state(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Query(query): Query<ProjectQuery>,
    Body(request): Body<UpdateStateRequest>,
) -> Result<Json<ApiEnvelope<Incident>>, ApiError> {
    let (user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let incident_id = incident_id(&raw_id)?;
    let incident = state.orchestrator.update_state(
        &project_id,
        &incident_id,
        request.state,
        &user.actor(),
        request.comment.as_deref(),
    )?;
    Ok(Json(ApiEnvelope::ok(incident)))
}

/// `PATCH /incidents/{incident_id}/severity`.
pub async fn update_severity(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Query(query): Query<ProjectQuery>,
    Body(request): Body<UpdateSeverityRequest>,
) -> Result<Json<ApiEnvelope<Incident>>, ApiError> {
    let (user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let incident_id = incident_id(&raw_id)?;
    let incident = state.orchestrator.update_severity(
        &project_id,
        &incident_id,
        request.severity,
        &user.actor(),
        request.comment.as_deref(),
    )?;
    Ok(Json(ApiEnvelope::ok(incident)))
}

/// `POST /incidents/{incident_id}/comments`.
pub async fn add_comment(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Query(query): Query<ProjectQuery>,
    Body(request): Body<AddCommentRequest>,
) -> Result<Json<ApiEnvelope<Activity>>, ApiError> {
    let (user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let incident_id = incident_id(&raw_id)?;
    let content = request.content.trim();
    if content.is_empty() {
        return Err(ApiError::validation("content is required"));
    }
    if content.chars().count() > BODY_LIMIT {
        return Err(ApiError::validation(format!("content exceeds {BODY_LIMIT} characters")));
    }
    let activity =
        state.orchestrator.add_comment(&project_id, &incident_id, content, &user.actor())?;
    Ok(Json(ApiEnvelope::ok(activity)))
}

/// `GET /incidents/{incident_id}/activities`.
pub async fn list_activities(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ApiEnvelope<Vec<Activity>>>, ApiError> {
    let (_user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let incident_id = incident_id(&raw_id)?;
    ensure_incident(&state, &project_id, &incident_id)?;
    let activities = state.incidents.list_activities(&incident_id)?;
    let total = activities.len() as u64;
    Ok(Json(ApiEnvelope::ok_with_total(activities, total)))
}

/// `GET /incidents/{incident_id}/hypotheses`.
pub async fn list_hypotheses(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ApiEnvelope<Vec<Hypothesis>>>, ApiError> {
    let (_user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let incident_id = incident_id(&raw_id)?;
    ensure_incident(&state, &project_id, &incident_id)?;
    let hypotheses = state.incidents.hypotheses_for_incident(&incident_id)?;
    let total = hypotheses.len() as u64;
    Ok(Json(ApiEnvelope::ok_with_total(hypotheses, total)))
}

/// `GET /incidents/{incident_id}/workflow`.
pub async fn list_workflow(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ApiEnvelope<Vec<AnalysisStep>>>, ApiError> {
    let (_user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let incident_id = incident_id(&raw_id)?;
    ensure_incident(&state, &project_id, &incident_id)?;
    let steps = state.incidents.steps_for_incident(&incident_id)?;
    let total = steps.len() as u64;
    Ok(Json(ApiEnvelope::ok_with_total(steps, total)))
}

/// `GET /incidents-stats`.
pub async fn incident_stats(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ApiEnvelope<IncidentStats>>, ApiError> {
    let (_user, project_id) = resolve_scope(&state, &headers, query.project_id.as_deref())?;
    let stats = state.incidents.incident_stats(&project_id)?;
    Ok(Json(ApiEnvelope::ok(stats)))
}

/// Verifies the incident exists within the project scope.
fn ensure_incident(
    state: &GatewayState,
    project_id: &ProjectId,
    incident_id: &IncidentId,
) -> Result<(), ApiError> {
    state
        .incidents
        .get_incident(project_id, incident_id)?
        .map(|_| ())
        .ok_or_else(|| ApiError::not_found("Incident not found"))
}
