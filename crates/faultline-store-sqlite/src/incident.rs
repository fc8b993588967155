// faultline-store-sqlite/src/incident.rs
// ============================================================================
// Module: SQLite Incident Repository
// Description: Incidents and their owned children over SQLite.
// Purpose: Implement the IncidentStore interface.
// Dependencies: faultline-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Incidents serialize row-per-aggregate with activities, analysis steps,
//! hypotheses, and AI request rows as cascade-deleted children. The store
//! serializes writes per connection, which gives each incident's activity
//! timeline a total order. The `(incident_id, rank)` uniqueness on
//! hypotheses keeps rank runs free of duplicates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::ActivityId;
use faultline_core::ActivityKind;
use faultline_core::Actor;
use faultline_core::Activity;
use faultline_core::AiRequest;
use faultline_core::AnalysisStep;
use faultline_core::Hypothesis;
use faultline_core::HypothesisId;
use faultline_core::Incident;
use faultline_core::IncidentId;
use faultline_core::IncidentSeverity;
use faultline_core::IncidentState;
use faultline_core::ProjectId;
use faultline_core::StepId;
use faultline_core::StepKind;
use faultline_core::StepStatus;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_core::interfaces::IncidentFilter;
use faultline_core::interfaces::IncidentStats;
use faultline_core::interfaces::IncidentStore;
use faultline_core::interfaces::StoreError;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;

use crate::store::SqliteStore;
use crate::store::i64_from_u64;
use crate::store::map_db_error;
use crate::store::ts;
use crate::store::ts_from;
use crate::store::ts_opt;
use crate::store::ts_opt_from;
use crate::store::u64_from_i64;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Columns selected for incident queries.
const INCIDENT_COLUMNS: &str = "id, tenant_id, project_id, title, description, service_name, \
     state, severity, detected_at, acknowledged_at, resolved_at, created_at";

/// Maps an incident row.
fn map_incident(row: &Row<'_>) -> rusqlite::Result<RawIncident> {
    Ok(RawIncident {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        project_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        service_name: row.get(5)?,
        state: row.get(6)?,
        severity: row.get(7)?,
        detected_at: row.get(8)?,
        acknowledged_at: row.get(9)?,
        resolved_at: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Incident row before enum parsing.
struct RawIncident {
    /// Incident identifier.
    id: String,
    /// Owning tenant.
    tenant_id: String,
    /// Owning project.
    project_id: String,
    /// Title.
    title: String,
    /// Description.
    description: String,
    /// Service.
    service_name: String,
    /// State label.
    state: String,
    /// Severity label.
    severity: String,
    /// Detection stamp.
    detected_at: i64,
    /// Acknowledge stamp.
    acknowledged_at: Option<i64>,
    /// Resolve stamp.
    resolved_at: Option<i64>,
    /// Creation stamp.
    created_at: i64,
}

impl RawIncident {
    /// Converts the raw row into the record type.
    fn build(self) -> Result<Incident, StoreError> {
        Ok(Incident {
            id: IncidentId::new(self.id),
            tenant_id: TenantId::new(self.tenant_id),
            project_id: ProjectId::new(self.project_id),
            title: self.title,
            description: self.description,
            service_name: self.service_name,
            state: IncidentState::parse(&self.state)
                .ok_or_else(|| StoreError::Invalid(format!("unknown state: {}", self.state)))?,
            severity: IncidentSeverity::parse(&self.severity).ok_or_else(|| {
                StoreError::Invalid(format!("unknown severity: {}", self.severity))
            })?,
            detected_at: ts_from(self.detected_at)?,
            acknowledged_at: ts_opt_from(self.acknowledged_at)?,
            resolved_at: ts_opt_from(self.resolved_at)?,
            created_at: ts_from(self.created_at)?,
        })
    }
}

/// Parses a step row shared by the step queries.
fn map_step(row: &Row<'_>) -> rusqlite::Result<RawStep> {
    Ok(RawStep {
        id: row.get(0)?,
        incident_id: row.get(1)?,
        kind: row.get(2)?,
        step_number: row.get(3)?,
        status: row.get(4)?,
        input: row.get(5)?,
        output: row.get(6)?,
        input_tokens: row.get(7)?,
        output_tokens: row.get(8)?,
        cost_usd: row.get(9)?,
        duration_ms: row.get(10)?,
        error_message: row.get(11)?,
        started_at: row.get(12)?,
        completed_at: row.get(13)?,
    })
}

/// Step row before enum parsing.
struct RawStep {
    /// Step identifier.
    id: String,
    /// Owning incident.
    incident_id: String,
    /// Kind label.
    kind: String,
    /// Workflow position.
    step_number: u32,
    /// Status label.
    status: String,
    /// Input JSON.
    input: Option<String>,
    /// Output JSON.
    output: Option<String>,
    /// Input tokens.
    input_tokens: Option<i64>,
    /// Output tokens.
    output_tokens: Option<i64>,
    /// Cost in USD.
    cost_usd: Option<f64>,
    /// Duration in milliseconds.
    duration_ms: Option<i64>,
    /// Error message.
    error_message: Option<String>,
    /// Start stamp.
    started_at: Option<i64>,
    /// Completion stamp.
    completed_at: Option<i64>,
}

impl RawStep {
    /// Converts the raw row into the record type.
    fn build(self) -> Result<AnalysisStep, StoreError> {
        Ok(AnalysisStep {
            id: StepId::new(self.id),
            incident_id: IncidentId::new(self.incident_id),
            kind: StepKind::parse(&self.kind)
                .ok_or_else(|| StoreError::Invalid(format!("unknown step kind: {}", self.kind)))?,
            step_number: self.step_number,
            status: StepStatus::parse(&self.status).ok_or_else(|| {
                StoreError::Invalid(format!("unknown step status: {}", self.status))
            })?,
            input: self.input.as_deref().map(crate::store::json_from),
            output: self.output.as_deref().map(crate::store::json_from),
            input_tokens: self.input_tokens.map(u64_from_i64),
            output_tokens: self.output_tokens.map(u64_from_i64),
            cost_usd: self.cost_usd,
            duration_ms: self.duration_ms,
            error_message: self.error_message,
            started_at: ts_opt_from(self.started_at)?,
            completed_at: ts_opt_from(self.completed_at)?,
        })
    }
}

/// Columns selected for step queries.
const STEP_COLUMNS: &str = "id, incident_id, kind, step_number, status, input, output, \
     input_tokens, output_tokens, cost_usd, duration_ms, error_message, started_at, completed_at";

// ============================================================================
// SECTION: IncidentStore
// ============================================================================

impl IncidentStore for SqliteStore {
    fn insert_incident(&self, incident: &Incident) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO incidents (id, tenant_id, project_id, title, description,
                    service_name, state, severity, detected_at, acknowledged_at, resolved_at,
                    created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    incident.id.as_str(),
                    incident.tenant_id.as_str(),
                    incident.project_id.as_str(),
                    incident.title,
                    incident.description,
                    incident.service_name,
                    incident.state.as_str(),
                    incident.severity.as_str(),
                    ts(incident.detected_at),
                    ts_opt(incident.acknowledged_at),
                    ts_opt(incident.resolved_at),
                    ts(incident.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn get_incident(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
    ) -> Result<Option<Incident>, StoreError> {
        let guard = self.lock()?;
        let sql =
            format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?1 AND project_id = ?2");
        let row = guard
            .query_row(&sql, params![incident_id.as_str(), project_id.as_str()], map_incident)
            .optional()
            .map_err(|err| map_db_error(&err))?;
        row.map(RawIncident::build).transpose()
    }

    fn list_incidents(
        &self,
        project_id: &ProjectId,
        filter: &IncidentFilter,
    ) -> Result<(Vec<Incident>, u64), StoreError> {
        let guard = self.lock()?;
        let severity = filter.severity.map(|severity| severity.as_str().to_string());
        let state = filter.state.map(|state| state.as_str().to_string());
        let search = filter.search.as_ref().map(|needle| format!("%{}%", needle.to_lowercase()));
        let where_clause = "project_id = ?1
            AND (?2 IS NULL OR severity = ?2)
            AND (?3 IS NULL OR state = ?3)
            AND (?4 IS NULL OR LOWER(title) LIKE ?4 OR LOWER(description) LIKE ?4
                 OR LOWER(service_name) LIKE ?4)";

        let total: i64 = guard
            .query_row(
                &format!("SELECT COUNT(*) FROM incidents WHERE {where_clause}"),
                params![project_id.as_str(), severity, state, search],
                |row| row.get(0),
            )
            .map_err(|err| map_db_error(&err))?;
        let total = u64_from_i64(total);

        let limit = i64::from(filter.limit.max(1));
        let offset = i64::from(filter.page.max(1) - 1) * limit;
        let sql = format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE {where_clause}
             ORDER BY detected_at DESC LIMIT ?5 OFFSET ?6"
        );
        let mut statement = guard.prepare(&sql).map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(
                params![project_id.as_str(), severity, state, search, limit, offset],
                map_incident,
            )
            .map_err(|err| map_db_error(&err))?;
        let mut incidents = Vec::new();
        for row in rows {
            incidents.push(row.map_err(|err| map_db_error(&err))?.build()?);
        }
        Ok((incidents, total))
    }

    fn set_incident_state(
        &self,
        incident_id: &IncidentId,
        state: IncidentState,
        acknowledged_at: Option<Timestamp>,
        resolved_at: Option<Timestamp>,
    ) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE incidents SET state = ?1, acknowledged_at = ?2, resolved_at = ?3
                 WHERE id = ?4",
                params![
                    state.as_str(),
                    ts_opt(acknowledged_at),
                    ts_opt(resolved_at),
                    incident_id.as_str()
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        if changed == 0 {
            return Err(StoreError::NotFound(incident_id.to_string()));
        }
        Ok(())
    }

    fn set_incident_severity(
        &self,
        incident_id: &IncidentId,
        severity: IncidentSeverity,
    ) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE incidents SET severity = ?1 WHERE id = ?2",
                params![severity.as_str(), incident_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        if changed == 0 {
            return Err(StoreError::NotFound(incident_id.to_string()));
        }
        Ok(())
    }

    fn delete_incident(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
    ) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "DELETE FROM incidents WHERE id = ?1 AND project_id = ?2",
                params![incident_id.as_str(), project_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_activity(&self, activity: &Activity) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO activities (id, incident_id, kind, content, old_value, new_value,
                    user_id, user_name, user_email, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    activity.id.as_str(),
                    activity.incident_id.as_str(),
                    activity.kind.as_str(),
                    activity.content,
                    activity.old_value,
                    activity.new_value,
                    activity.actor.user_id,
                    activity.actor.user_name,
                    activity.actor.user_email,
                    ts(activity.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn list_activities(&self, incident_id: &IncidentId) -> Result<Vec<Activity>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT id, incident_id, kind, content, old_value, new_value, user_id,
                        user_name, user_email, created_at
                 FROM activities WHERE incident_id = ?1 ORDER BY created_at, id",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![incident_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, i64>(9)?,
                ))
            })
            .map_err(|err| map_db_error(&err))?;
        let mut activities = Vec::new();
        for row in rows {
            let (
                id,
                incident,
                kind,
                content,
                old_value,
                new_value,
                user_id,
                user_name,
                user_email,
                created_at,
            ) = row.map_err(|err| map_db_error(&err))?;
            activities.push(Activity {
                id: ActivityId::new(id),
                incident_id: IncidentId::new(incident),
                kind: parse_activity_kind(&kind)?,
                content,
                old_value,
                new_value,
                actor: Actor { user_id, user_name, user_email },
                created_at: ts_from(created_at)?,
            });
        }
        Ok(activities)
    }

    fn insert_steps(&self, steps: &[AnalysisStep]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for step in steps {
            tx.execute(
                "INSERT INTO analysis_steps (id, incident_id, kind, step_number, status,
                    input, output, input_tokens, output_tokens, cost_usd, duration_ms,
                    error_message, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    step.id.as_str(),
                    step.incident_id.as_str(),
                    step.kind.as_str(),
                    step.step_number,
                    step.status.as_str(),
                    step.input.as_ref().map(crate::store::json_col),
                    step.output.as_ref().map(crate::store::json_col),
                    step.input_tokens.map(i64_from_u64),
                    step.output_tokens.map(i64_from_u64),
                    step.cost_usd,
                    step.duration_ms,
                    step.error_message,
                    ts_opt(step.started_at),
                    ts_opt(step.completed_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn update_step(&self, step: &AnalysisStep) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE analysis_steps SET status = ?2, input = ?3, output = ?4,
                    input_tokens = ?5, output_tokens = ?6, cost_usd = ?7, duration_ms = ?8,
                    error_message = ?9, started_at = ?10, completed_at = ?11
                 WHERE id = ?1",
                params![
                    step.id.as_str(),
                    step.status.as_str(),
                    step.input.as_ref().map(crate::store::json_col),
                    step.output.as_ref().map(crate::store::json_col),
                    step.input_tokens.map(i64_from_u64),
                    step.output_tokens.map(i64_from_u64),
                    step.cost_usd,
                    step.duration_ms,
                    step.error_message,
                    ts_opt(step.started_at),
                    ts_opt(step.completed_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        if changed == 0 {
            return Err(StoreError::NotFound(step.id.to_string()));
        }
        Ok(())
    }

    fn steps_for_incident(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Vec<AnalysisStep>, StoreError> {
        let guard = self.lock()?;
        let sql = format!(
            "SELECT {STEP_COLUMNS} FROM analysis_steps WHERE incident_id = ?1
             ORDER BY step_number"
        );
        let mut statement = guard.prepare(&sql).map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![incident_id.as_str()], map_step)
            .map_err(|err| map_db_error(&err))?;
        let mut steps = Vec::new();
        for row in rows {
            steps.push(row.map_err(|err| map_db_error(&err))?.build()?);
        }
        Ok(steps)
    }

    fn step_by_kind(
        &self,
        incident_id: &IncidentId,
        kind: StepKind,
    ) -> Result<Option<AnalysisStep>, StoreError> {
        let guard = self.lock()?;
        let sql = format!(
            "SELECT {STEP_COLUMNS} FROM analysis_steps
             WHERE incident_id = ?1 AND kind = ?2"
        );
        let row = guard
            .query_row(&sql, params![incident_id.as_str(), kind.as_str()], map_step)
            .optional()
            .map_err(|err| map_db_error(&err))?;
        row.map(RawStep::build).transpose()
    }

    fn insert_hypothesis(&self, hypothesis: &Hypothesis) -> Result<(), StoreError> {
        let evidence = serde_json::to_string(&hypothesis.supporting_evidence)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO hypotheses (id, incident_id, claim, description,
                    confidence_score, supporting_evidence, rank, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    hypothesis.id.as_str(),
                    hypothesis.incident_id.as_str(),
                    hypothesis.claim,
                    hypothesis.description,
                    hypothesis.confidence_score,
                    evidence,
                    hypothesis.rank,
                    ts(hypothesis.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn hypotheses_for_incident(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Vec<Hypothesis>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT id, incident_id, claim, description, confidence_score,
                        supporting_evidence, rank, created_at
                 FROM hypotheses WHERE incident_id = ?1 ORDER BY rank",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![incident_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, u32>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })
            .map_err(|err| map_db_error(&err))?;
        let mut hypotheses = Vec::new();
        for row in rows {
            let (id, incident, claim, description, confidence_score, evidence, rank, created_at) =
                row.map_err(|err| map_db_error(&err))?;
            let supporting_evidence: Vec<String> = serde_json::from_str(&evidence)
                .map_err(|err| StoreError::Invalid(err.to_string()))?;
            hypotheses.push(Hypothesis {
                id: HypothesisId::new(id),
                incident_id: IncidentId::new(incident),
                claim,
                description,
                confidence_score,
                supporting_evidence,
                rank,
                created_at: ts_from(created_at)?,
            });
        }
        Ok(hypotheses)
    }

    fn insert_ai_request(&self, request: &AiRequest) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO ai_requests (id, incident_id, kind, input_tokens, output_tokens,
                    cost_usd, duration_ms, model, prompt_summary, response_summary, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    request.id.as_str(),
                    request.incident_id.as_str(),
                    request.kind.as_str(),
                    i64_from_u64(request.input_tokens),
                    i64_from_u64(request.output_tokens),
                    request.cost_usd,
                    request.duration_ms,
                    request.model,
                    request.prompt_summary,
                    request.response_summary,
                    ts(request.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn incident_stats(&self, project_id: &ProjectId) -> Result<IncidentStats, StoreError> {
        let guard = self.lock()?;
        let total: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM incidents WHERE project_id = ?1",
                params![project_id.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| map_db_error(&err))?;
        let mut stats = IncidentStats { total: u64_from_i64(total), ..IncidentStats::default() };
        let mut by_severity = guard
            .prepare(
                "SELECT severity, COUNT(*) FROM incidents WHERE project_id = ?1
                 GROUP BY severity",
            )
            .map_err(|err| map_db_error(&err))?;
        let severity_rows = by_severity
            .query_map(params![project_id.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|err| map_db_error(&err))?;
        for row in severity_rows {
            let (severity, count) = row.map_err(|err| map_db_error(&err))?;
            stats.by_severity.insert(severity, u64_from_i64(count));
        }
        let mut by_state = guard
            .prepare(
                "SELECT state, COUNT(*) FROM incidents WHERE project_id = ?1 GROUP BY state",
            )
            .map_err(|err| map_db_error(&err))?;
        let state_rows = by_state
            .query_map(params![project_id.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|err| map_db_error(&err))?;
        for row in state_rows {
            let (state, count) = row.map_err(|err| map_db_error(&err))?;
            stats.by_state.insert(state, u64_from_i64(count));
        }
        Ok(stats)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses an activity kind label.
fn parse_activity_kind(label: &str) -> Result<ActivityKind, StoreError> {
    match label {
        "created" => Ok(ActivityKind::Created),
        "state_changed" => Ok(ActivityKind::StateChanged),
        "severity_changed" => Ok(ActivityKind::SeverityChanged),
        "comment" => Ok(ActivityKind::Comment),
        other => Err(StoreError::Invalid(format!("unknown activity kind: {other}"))),
    }
}
