// faultline-store-sqlite/src/alerting.rs
// ============================================================================
// Module: SQLite Alerting Repository
// Description: Alert configuration and live alert state over SQLite.
// Purpose: Implement the AlertStore interface.
// Dependencies: faultline-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Alerting rows cover conditions, policies, channels (with sealed config
//! columns), muting rules, and active alerts. The partial unique index on
//! `(condition_id) WHERE status = 'firing'` turns a duplicate fire into a
//! conflict at the storage layer, so the at-most-one-firing invariant holds
//! even under concurrent evaluator instances.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use faultline_core::ActiveAlert;
use faultline_core::AlertCondition;
use faultline_core::AlertId;
use faultline_core::AlertPolicy;
use faultline_core::AlertStatus;
use faultline_core::ChannelId;
use faultline_core::ChannelKind;
use faultline_core::CompareOp;
use faultline_core::ConditionId;
use faultline_core::IncidentSeverity;
use faultline_core::MutingRule;
use faultline_core::NotificationChannel;
use faultline_core::PolicyId;
use faultline_core::ProjectId;
use faultline_core::RuleId;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_core::interfaces::AlertStore;
use faultline_core::interfaces::StoreError;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;

use crate::store::SqliteStore;
use crate::store::map_db_error;
use crate::store::ts;
use crate::store::ts_from;
use crate::store::ts_opt_from;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Maps a condition row into the record type.
fn map_condition(row: &Row<'_>) -> rusqlite::Result<RawCondition> {
    Ok(RawCondition {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        project_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        metric_name: row.get(5)?,
        service_name: row.get(6)?,
        operator: row.get(7)?,
        threshold: row.get(8)?,
        duration_minutes: row.get(9)?,
        severity: row.get(10)?,
        is_enabled: row.get(11)?,
        policy_id: row.get(12)?,
        created_at: row.get(13)?,
    })
}

/// Condition row before enum parsing.
struct RawCondition {
    /// Condition identifier.
    id: String,
    /// Owning tenant.
    tenant_id: String,
    /// Owning project.
    project_id: String,
    /// Display name.
    name: String,
    /// Description.
    description: String,
    /// Metric name.
    metric_name: String,
    /// Optional service restriction.
    service_name: Option<String>,
    /// Operator symbol.
    operator: String,
    /// Threshold value.
    threshold: f64,
    /// Window length in minutes.
    duration_minutes: u32,
    /// Severity label.
    severity: String,
    /// Enabled flag.
    is_enabled: bool,
    /// Optional policy reference.
    policy_id: Option<String>,
    /// Creation stamp.
    created_at: i64,
}

impl RawCondition {
    /// Converts the raw row into the record type.
    fn build(self) -> Result<AlertCondition, StoreError> {
        Ok(AlertCondition {
            id: ConditionId::new(self.id),
            tenant_id: TenantId::new(self.tenant_id),
            project_id: ProjectId::new(self.project_id),
            name: self.name,
            description: self.description,
            metric_name: self.metric_name,
            service_name: self.service_name,
            operator: CompareOp::parse(&self.operator).ok_or_else(|| {
                StoreError::Invalid(format!("unknown operator: {}", self.operator))
            })?,
            threshold: self.threshold,
            duration_minutes: self.duration_minutes,
            severity: IncidentSeverity::parse(&self.severity).ok_or_else(|| {
                StoreError::Invalid(format!("unknown severity: {}", self.severity))
            })?,
            is_enabled: self.is_enabled,
            policy_id: self.policy_id.map(PolicyId::new),
            created_at: ts_from(self.created_at)?,
        })
    }
}

/// Maps an active-alert row into the record type.
fn map_alert(row: &Row<'_>) -> rusqlite::Result<RawAlert> {
    Ok(RawAlert {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        project_id: row.get(2)?,
        condition_id: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        severity: row.get(6)?,
        status: row.get(7)?,
        service_name: row.get(8)?,
        metric_value: row.get(9)?,
        fired_at: row.get(10)?,
        acknowledged_at: row.get(11)?,
        resolved_at: row.get(12)?,
    })
}

/// Active-alert row before enum parsing.
struct RawAlert {
    /// Alert identifier.
    id: String,
    /// Owning tenant.
    tenant_id: String,
    /// Owning project.
    project_id: String,
    /// Condition reference.
    condition_id: String,
    /// Title.
    title: String,
    /// Description.
    description: String,
    /// Severity label.
    severity: String,
    /// Status label.
    status: String,
    /// Optional service scope.
    service_name: Option<String>,
    /// Observed value.
    metric_value: Option<f64>,
    /// Fire stamp.
    fired_at: i64,
    /// Acknowledge stamp.
    acknowledged_at: Option<i64>,
    /// Resolve stamp.
    resolved_at: Option<i64>,
}

impl RawAlert {
    /// Converts the raw row into the record type.
    fn build(self) -> Result<ActiveAlert, StoreError> {
        Ok(ActiveAlert {
            id: AlertId::new(self.id),
            tenant_id: TenantId::new(self.tenant_id),
            project_id: ProjectId::new(self.project_id),
            condition_id: ConditionId::new(self.condition_id),
            title: self.title,
            description: self.description,
            severity: IncidentSeverity::parse(&self.severity).ok_or_else(|| {
                StoreError::Invalid(format!("unknown severity: {}", self.severity))
            })?,
            status: AlertStatus::parse(&self.status).ok_or_else(|| {
                StoreError::Invalid(format!("unknown alert status: {}", self.status))
            })?,
            service_name: self.service_name,
            metric_value: self.metric_value,
            fired_at: ts_from(self.fired_at)?,
            acknowledged_at: ts_opt_from(self.acknowledged_at)?,
            resolved_at: ts_opt_from(self.resolved_at)?,
        })
    }
}

/// Columns selected for condition queries.
const CONDITION_COLUMNS: &str = "id, tenant_id, project_id, name, description, metric_name, \
     service_name, operator, threshold, duration_minutes, severity, is_enabled, policy_id, \
     created_at";

/// Columns selected for active-alert queries.
const ALERT_COLUMNS: &str = "id, tenant_id, project_id, condition_id, title, description, \
     severity, status, service_name, metric_value, fired_at, acknowledged_at, resolved_at";

// ============================================================================
// SECTION: AlertStore
// ============================================================================

impl AlertStore for SqliteStore {
    fn insert_condition(&self, condition: &AlertCondition) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO alert_conditions (id, tenant_id, project_id, name, description,
                    metric_name, service_name, operator, threshold, duration_minutes,
                    severity, is_enabled, policy_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    condition.id.as_str(),
                    condition.tenant_id.as_str(),
                    condition.project_id.as_str(),
                    condition.name,
                    condition.description,
                    condition.metric_name,
                    condition.service_name,
                    condition.operator.as_str(),
                    condition.threshold,
                    condition.duration_minutes,
                    condition.severity.as_str(),
                    condition.is_enabled,
                    condition.policy_id.as_ref().map(PolicyId::as_str),
                    ts(condition.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn get_condition(
        &self,
        condition_id: &ConditionId,
    ) -> Result<Option<AlertCondition>, StoreError> {
        let guard = self.lock()?;
        let sql = format!("SELECT {CONDITION_COLUMNS} FROM alert_conditions WHERE id = ?1");
        let row = guard
            .query_row(&sql, params![condition_id.as_str()], map_condition)
            .optional()
            .map_err(|err| map_db_error(&err))?;
        row.map(RawCondition::build).transpose()
    }

    fn list_enabled_conditions(&self) -> Result<Vec<AlertCondition>, StoreError> {
        let guard = self.lock()?;
        let sql = format!(
            "SELECT {CONDITION_COLUMNS} FROM alert_conditions WHERE is_enabled = 1
             ORDER BY created_at"
        );
        let mut statement = guard.prepare(&sql).map_err(|err| map_db_error(&err))?;
        let rows = statement.query_map([], map_condition).map_err(|err| map_db_error(&err))?;
        let mut conditions = Vec::new();
        for row in rows {
            conditions.push(row.map_err(|err| map_db_error(&err))?.build()?);
        }
        Ok(conditions)
    }

    fn insert_policy(&self, policy: &AlertPolicy) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO alert_policies (id, tenant_id, project_id, name, description,
                    is_enabled, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    policy.id.as_str(),
                    policy.tenant_id.as_str(),
                    policy.project_id.as_str(),
                    policy.name,
                    policy.description,
                    policy.is_enabled,
                    ts(policy.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_channel(&self, channel: &NotificationChannel) -> Result<(), StoreError> {
        let sealed = self
            .secrets
            .seal_json(&channel.config)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO notification_channels (id, tenant_id, project_id, name, kind,
                    config_sealed, is_enabled, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    channel.id.as_str(),
                    channel.tenant_id.as_str(),
                    channel.project_id.as_str(),
                    channel.name,
                    channel.kind.as_str(),
                    sealed,
                    channel.is_enabled,
                    ts(channel.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn bind_channel(
        &self,
        channel_id: &ChannelId,
        policy_id: &PolicyId,
    ) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT OR IGNORE INTO channel_policies (channel_id, policy_id)
                 VALUES (?1, ?2)",
                params![channel_id.as_str(), policy_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn channels_for_policy(
        &self,
        policy_id: &PolicyId,
    ) -> Result<Vec<NotificationChannel>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT c.id, c.tenant_id, c.project_id, c.name, c.kind, c.config_sealed,
                        c.is_enabled, c.created_at
                 FROM notification_channels c
                 JOIN channel_policies cp ON cp.channel_id = c.id
                 WHERE cp.policy_id = ?1 AND c.is_enabled = 1
                 ORDER BY c.created_at",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![policy_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, bool>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })
            .map_err(|err| map_db_error(&err))?;
        let mut channels = Vec::new();
        for row in rows {
            let (id, tenant, project, name, kind, sealed, is_enabled, created_at) =
                row.map_err(|err| map_db_error(&err))?;
            let config = self
                .secrets
                .open_json(&sealed)
                .map_err(|err| StoreError::Invalid(err.to_string()))?;
            channels.push(NotificationChannel {
                id: ChannelId::new(id),
                tenant_id: TenantId::new(tenant),
                project_id: ProjectId::new(project),
                name,
                kind: ChannelKind::parse(&kind)
                    .ok_or_else(|| StoreError::Invalid(format!("unknown channel kind: {kind}")))?,
                config,
                is_enabled,
                created_at: ts_from(created_at)?,
            });
        }
        Ok(channels)
    }

    fn insert_muting_rule(&self, rule: &MutingRule) -> Result<(), StoreError> {
        let matchers = serde_json::to_string(&rule.matchers)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO muting_rules (id, tenant_id, project_id, name, matchers,
                    starts_at, ends_at, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    rule.id.as_str(),
                    rule.tenant_id.as_str(),
                    rule.project_id.as_str(),
                    rule.name,
                    matchers,
                    ts(rule.starts_at),
                    ts(rule.ends_at),
                    rule.is_active,
                    ts(rule.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn active_muting_rules(&self, project_id: &ProjectId) -> Result<Vec<MutingRule>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT id, tenant_id, project_id, name, matchers, starts_at, ends_at,
                        is_active, created_at
                 FROM muting_rules WHERE project_id = ?1 AND is_active = 1",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![project_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, bool>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })
            .map_err(|err| map_db_error(&err))?;
        let mut rules = Vec::new();
        for row in rows {
            let (id, tenant, project, name, matchers, starts_at, ends_at, is_active, created_at) =
                row.map_err(|err| map_db_error(&err))?;
            let matchers: BTreeMap<String, String> = serde_json::from_str(&matchers)
                .map_err(|err| StoreError::Invalid(err.to_string()))?;
            rules.push(MutingRule {
                id: RuleId::new(id),
                tenant_id: TenantId::new(tenant),
                project_id: ProjectId::new(project),
                name,
                matchers,
                starts_at: ts_from(starts_at)?,
                ends_at: ts_from(ends_at)?,
                is_active,
                created_at: ts_from(created_at)?,
            });
        }
        Ok(rules)
    }

    fn firing_alert(
        &self,
        condition_id: &ConditionId,
    ) -> Result<Option<ActiveAlert>, StoreError> {
        let guard = self.lock()?;
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM active_alerts
             WHERE condition_id = ?1 AND status = 'firing'"
        );
        let row = guard
            .query_row(&sql, params![condition_id.as_str()], map_alert)
            .optional()
            .map_err(|err| map_db_error(&err))?;
        row.map(RawAlert::build).transpose()
    }

    fn insert_alert(&self, alert: &ActiveAlert) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO active_alerts (id, tenant_id, project_id, condition_id, title,
                    description, severity, status, service_name, metric_value, fired_at,
                    acknowledged_at, resolved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    alert.id.as_str(),
                    alert.tenant_id.as_str(),
                    alert.project_id.as_str(),
                    alert.condition_id.as_str(),
                    alert.title,
                    alert.description,
                    alert.severity.as_str(),
                    alert.status.as_str(),
                    alert.service_name,
                    alert.metric_value,
                    ts(alert.fired_at),
                    alert.acknowledged_at.map(|value| value.unix_millis()),
                    alert.resolved_at.map(|value| value.unix_millis())
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn resolve_alert(
        &self,
        alert_id: &AlertId,
        resolved_at: Timestamp,
    ) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE active_alerts SET status = 'resolved', resolved_at = ?1 WHERE id = ?2",
                params![ts(resolved_at), alert_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        if changed == 0 {
            return Err(StoreError::NotFound(alert_id.to_string()));
        }
        Ok(())
    }

    fn list_alerts(&self, project_id: &ProjectId) -> Result<Vec<ActiveAlert>, StoreError> {
        let guard = self.lock()?;
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM active_alerts WHERE project_id = ?1
             ORDER BY fired_at DESC"
        );
        let mut statement = guard.prepare(&sql).map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![project_id.as_str()], map_alert)
            .map_err(|err| map_db_error(&err))?;
        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row.map_err(|err| map_db_error(&err))?.build()?);
        }
        Ok(alerts)
    }
}
