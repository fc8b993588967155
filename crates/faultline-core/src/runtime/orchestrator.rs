// faultline-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Faultline Incident Orchestrator
// Description: Incident creation and guarded lifecycle mutation.
// Purpose: Drive incidents through the state machine with a complete
//          activity timeline.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The orchestrator owns every incident mutation: creation seeds the incident
//! in `investigating` with the five-step analysis workflow and triggers AI
//! enrichment fire-and-forget; state changes are guarded by the lifecycle
//! transition table; severity changes are unconstrained. Every mutation
//! writes an [`Activity`] row and publishes on the `incidents` channel.
//! Publish and trigger failures never fail the primary operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use crate::core::event::Channel;
use crate::core::event::EventMessage;
use crate::core::identifiers::ActivityId;
use crate::core::identifiers::IncidentId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TenantId;
use crate::core::incident::Activity;
use crate::core::incident::ActivityKind;
use crate::core::incident::Actor;
use crate::core::incident::Incident;
use crate::core::incident::IncidentSeverity;
use crate::core::incident::IncidentState;
use crate::core::incident::seed_workflow;
use crate::core::time::Timestamp;
use crate::interfaces::EnrichmentTrigger;
use crate::interfaces::EventBus;
use crate::interfaces::IncidentStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Orchestrator errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Incident does not exist within the project scope.
    #[error("incident not found: {0}")]
    NotFound(String),
    /// Requested transition is not in the lifecycle graph.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state label.
        from: &'static str,
        /// Requested state label.
        to: &'static str,
    },
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Incident creation payload.
#[derive(Debug, Clone)]
pub struct NewIncident {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Affected service.
    pub service_name: String,
    /// Initial severity.
    pub severity: IncidentSeverity,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Incident lifecycle engine.
pub struct IncidentOrchestrator {
    /// Incident repository.
    incidents: Arc<dyn IncidentStore>,
    /// Event publisher for the `incidents` channel.
    bus: Arc<dyn EventBus>,
    /// Fire-and-forget AI enrichment seam.
    trigger: Arc<dyn EnrichmentTrigger>,
}

impl IncidentOrchestrator {
    /// Builds an orchestrator over the provided seams.
    #[must_use]
    pub fn new(
        incidents: Arc<dyn IncidentStore>,
        bus: Arc<dyn EventBus>,
        trigger: Arc<dyn EnrichmentTrigger>,
    ) -> Self {
        Self { incidents, bus, trigger }
    }

    /// Creates an incident, seeds its workflow, publishes `incident.created`,
    /// and triggers AI enrichment.
    ///
    /// Enrichment trigger failure is invisible here by contract; the seam is
    /// fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Store`] when persistence fails.
    pub fn create_incident(&self, request: NewIncident) -> Result<Incident, OrchestratorError> {
        let now = Timestamp::now();
        let incident = Incident {
            id: IncidentId::generate(),
            tenant_id: request.tenant_id,
            project_id: request.project_id,
            title: request.title,
            description: request.description,
            service_name: request.service_name,
            state: IncidentState::Investigating,
            severity: request.severity,
            detected_at: now,
            acknowledged_at: None,
            resolved_at: None,
            created_at: now,
        };
        self.incidents.insert_incident(&incident)?;
        self.incidents.insert_steps(&seed_workflow(&incident, now))?;
        self.record_activity(
            &incident,
            ActivityKind::Created,
            format!("Incident created: {}", incident.title),
            None,
            None,
            &Actor::system(),
            now,
        );
        self.publish_incident_event("incident.created", &incident);
        self.trigger.trigger(&incident);
        Ok(incident)
    }

    /// Transitions an incident's lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidTransition`] when the lifecycle
    /// graph forbids the move, [`OrchestratorError::NotFound`] when the
    /// incident is missing.
    pub fn update_state(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
        next: IncidentState,
        actor: &Actor,
        comment: Option<&str>,
    ) -> Result<Incident, OrchestratorError> {
        let incident = self.load(project_id, incident_id)?;
        let previous = incident.state;
        if !previous.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition {
                from: previous.as_str(),
                to: next.as_str(),
            });
        }
        let now = Timestamp::now();
        let acknowledged_at = match (next, incident.acknowledged_at) {
            (IncidentState::Acknowledged, None) => Some(now),
            (_, existing) => existing,
        };
        let resolved_at = match (next, incident.resolved_at) {
            (IncidentState::Resolved, None) => Some(now),
            (_, existing) => existing,
        };
        self.incidents.set_incident_state(incident_id, next, acknowledged_at, resolved_at)?;
        let updated = Incident {
            state: next,
            acknowledged_at,
            resolved_at,
            ..incident
        };
        let content = comment.map_or_else(
            || format!("State changed from {} to {}", previous.as_str(), next.as_str()),
            ToString::to_string,
        );
        self.record_activity(
            &updated,
            ActivityKind::StateChanged,
            content,
            Some(previous.as_str().to_string()),
            Some(next.as_str().to_string()),
            actor,
            now,
        );
        self.publish_incident_event("incident.updated", &updated);
        Ok(updated)
    }

    /// Updates an incident's severity. Severity moves are unconstrained.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] when the incident is missing.
    pub fn update_severity(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
        severity: IncidentSeverity,
        actor: &Actor,
        comment: Option<&str>,
    ) -> Result<Incident, OrchestratorError> {
        let incident = self.load(project_id, incident_id)?;
        let now = Timestamp::now();
        self.incidents.set_incident_severity(incident_id, severity)?;
        let updated = Incident { severity, ..incident };
        let content = comment.map_or_else(
            || format!("Severity changed to {}", severity.as_str()),
            ToString::to_string,
        );
        self.record_activity(
            &updated,
            ActivityKind::SeverityChanged,
            content,
            Some(incident.severity.as_str().to_string()),
            Some(severity.as_str().to_string()),
            actor,
            now,
        );
        self.publish_incident_event("incident.updated", &updated);
        Ok(updated)
    }

    /// Adds a free-form comment to the incident timeline.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] when the incident is missing.
    pub fn add_comment(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
        content: &str,
        actor: &Actor,
    ) -> Result<Activity, OrchestratorError> {
        let incident = self.load(project_id, incident_id)?;
        let now = Timestamp::now();
        let activity = Activity {
            id: ActivityId::generate(),
            incident_id: incident.id.clone(),
            kind: ActivityKind::Comment,
            content: content.to_string(),
            old_value: None,
            new_value: None,
            actor: actor.clone(),
            created_at: now,
        };
        self.incidents.insert_activity(&activity)?;
        Ok(activity)
    }

    /// Loads an incident or maps absence to `NotFound`.
    fn load(
        &self,
        project_id: &ProjectId,
        incident_id: &IncidentId,
    ) -> Result<Incident, OrchestratorError> {
        self.incidents
            .get_incident(project_id, incident_id)?
            .ok_or_else(|| OrchestratorError::NotFound(incident_id.to_string()))
    }

    /// Writes a timeline activity; failures surface nowhere (the primary
    /// mutation already succeeded) except through the store's own logs.
    #[allow(clippy::too_many_arguments, reason = "Activity rows carry this many fields.")]
    fn record_activity(
        &self,
        incident: &Incident,
        kind: ActivityKind,
        content: String,
        old_value: Option<String>,
        new_value: Option<String>,
        actor: &Actor,
        now: Timestamp,
    ) {
        let activity = Activity {
            id: ActivityId::generate(),
            incident_id: incident.id.clone(),
            kind,
            content,
            old_value,
            new_value,
            actor: actor.clone(),
            created_at: now,
        };
        let _ = self.incidents.insert_activity(&activity);
    }

    /// Publishes an incident lifecycle event; failures are swallowed.
    fn publish_incident_event(&self, event_type: &str, incident: &Incident) {
        let data = match serde_json::to_value(incident) {
            Ok(value) => value,
            Err(_) => json!({ "id": incident.id.as_str() }),
        };
        let message = EventMessage::new(event_type, data, incident.tenant_id.clone());
        let _ = self.bus.publish(Channel::Incidents, &message);
    }
}
