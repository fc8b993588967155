// faultline-store-sqlite/src/telemetry.rs
// ============================================================================
// Module: SQLite Telemetry Repository
// Description: Append-only telemetry rows and windowed aggregates.
// Purpose: Implement the TelemetryStore interface.
// Dependencies: faultline-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Telemetry writes are batch inserts inside one transaction per request.
//! Window aggregates run as SQL `AVG`/`COUNT` over the indexed
//! `(project, service, timestamp)` columns so the alert evaluator reads means
//! rather than point samples. Error events upsert their fingerprint group and
//! prune occurrences past the retention cap in the same transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::BrowserEvent;
use faultline_core::Deployment;
use faultline_core::ErrorEvent;
use faultline_core::ErrorGroup;
use faultline_core::GroupId;
use faultline_core::HostSample;
use faultline_core::LogEntry;
use faultline_core::MetricKind;
use faultline_core::MetricPoint;
use faultline_core::ProjectId;
use faultline_core::ServiceRegistration;
use faultline_core::Span;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_core::Trace;
use faultline_core::Transaction;
use faultline_core::TriageStatus;
use faultline_core::Vulnerability;
use faultline_core::errorgroup::OCCURRENCES_RETAINED;
use faultline_core::fingerprint;
use faultline_core::interfaces::HostField;
use faultline_core::interfaces::LatencyPercentiles;
use faultline_core::interfaces::StoreError;
use faultline_core::interfaces::TelemetryStore;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::store::SqliteStore;
use crate::store::json_col;
use crate::store::map_db_error;
use crate::store::ts;
use crate::store::ts_from;

// ============================================================================
// SECTION: Percentiles
// ============================================================================

/// Nearest-rank percentile over pre-sorted durations.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "Rank math stays within the sample count."
    )]
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil().max(1.0) as usize;
    sorted[rank.min(sorted.len()) - 1]
}

// ============================================================================
// SECTION: TelemetryStore
// ============================================================================

impl TelemetryStore for SqliteStore {
    fn insert_metric_points(&self, points: &[MetricPoint]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for point in points {
            tx.execute(
                "INSERT INTO metric_points (tenant_id, project_id, service_name, metric_name,
                    value, kind, tags, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    point.tenant_id.as_str(),
                    point.project_id.as_str(),
                    point.service_name,
                    point.metric_name,
                    point.value,
                    point.kind.as_str(),
                    json_col(&point.tags),
                    ts(point.timestamp)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for transaction in transactions {
            tx.execute(
                "INSERT INTO transactions (tenant_id, project_id, service_name, endpoint,
                    method, status_code, duration_ms, db_duration_ms, external_duration_ms,
                    error, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    transaction.tenant_id.as_str(),
                    transaction.project_id.as_str(),
                    transaction.service_name,
                    transaction.endpoint,
                    transaction.method,
                    transaction.status_code,
                    transaction.duration_ms,
                    transaction.db_duration_ms,
                    transaction.external_duration_ms,
                    transaction.error,
                    ts(transaction.timestamp)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_trace(&self, trace: &Trace, spans: &[Span]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        tx.execute(
            "INSERT INTO traces (tenant_id, project_id, trace_id, root_service,
                root_operation, duration_ms, span_count, has_error, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (project_id, trace_id) DO UPDATE SET
                duration_ms = MAX(traces.duration_ms, excluded.duration_ms),
                span_count = traces.span_count + excluded.span_count,
                has_error = MAX(traces.has_error, excluded.has_error)",
            params![
                trace.tenant_id.as_str(),
                trace.project_id.as_str(),
                trace.trace_id,
                trace.root_service,
                trace.root_operation,
                trace.duration_ms,
                i64_from_u64(trace.span_count),
                trace.has_error,
                ts(trace.timestamp)
            ],
        )
        .map_err(|err| map_db_error(&err))?;
        for span in spans {
            tx.execute(
                "INSERT INTO spans (tenant_id, project_id, trace_id, span_id, parent_span_id,
                    service_name, operation, duration_ms, status, attributes, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    span.tenant_id.as_str(),
                    span.project_id.as_str(),
                    span.trace_id,
                    span.span_id,
                    span.parent_span_id,
                    span.service_name,
                    span.operation,
                    span.duration_ms,
                    span.status,
                    json_col(&span.attributes),
                    ts(span.timestamp)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_logs(&self, entries: &[LogEntry]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for entry in entries {
            tx.execute(
                "INSERT INTO log_entries (tenant_id, project_id, level, service_name, message,
                    attributes, trace_id, span_id, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.tenant_id.as_str(),
                    entry.project_id.as_str(),
                    entry.level,
                    entry.service_name,
                    entry.message,
                    json_col(&entry.attributes),
                    entry.trace_id,
                    entry.span_id,
                    ts(entry.timestamp)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_host_samples(&self, samples: &[HostSample]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for sample in samples {
            tx.execute(
                "INSERT INTO host_samples (tenant_id, project_id, hostname, cpu_percent,
                    memory_percent, disk_usage, network_io, load_avg, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    sample.tenant_id.as_str(),
                    sample.project_id.as_str(),
                    sample.hostname,
                    sample.cpu_percent,
                    sample.memory_percent,
                    json_col(&sample.disk_usage),
                    json_col(&sample.network_io),
                    json_col(&sample.load_avg),
                    ts(sample.timestamp)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_browser_events(&self, events: &[BrowserEvent]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for event in events {
            tx.execute(
                "INSERT INTO browser_events (tenant_id, project_id, page_url, event_kind,
                    load_time_ms, user_agent, attributes, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    event.tenant_id.as_str(),
                    event.project_id.as_str(),
                    event.page_url,
                    event.event_kind,
                    event.load_time_ms,
                    event.user_agent,
                    json_col(&event.attributes),
                    ts(event.timestamp)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_vulnerabilities(&self, findings: &[Vulnerability]) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for finding in findings {
            tx.execute(
                "INSERT INTO vulnerabilities (tenant_id, project_id, cve_id, title,
                    description, severity, service_name, package_name, installed_version,
                    fixed_version, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    finding.tenant_id.as_str(),
                    finding.project_id.as_str(),
                    finding.cve_id,
                    finding.title,
                    finding.description,
                    finding.severity,
                    finding.service_name,
                    finding.package_name,
                    finding.installed_version,
                    finding.fixed_version,
                    ts(finding.timestamp)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn record_error_event(
        &self,
        tenant_id: &TenantId,
        project_id: &ProjectId,
        event: &ErrorEvent,
        now: Timestamp,
    ) -> Result<ErrorGroup, StoreError> {
        let occurred_at = event.timestamp.unwrap_or(now);
        let digest = fingerprint(&event.service_name, &event.error_class, &event.message);
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;

        let existing: Option<(String, i64)> = tx
            .query_row(
                "SELECT id, occurrence_count FROM error_groups
                 WHERE project_id = ?1 AND fingerprint = ?2",
                params![project_id.as_str(), digest],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .map_err(|err| map_db_error(&err))?;

        let group_id = match existing {
            Some((id, _)) => {
                tx.execute(
                    "UPDATE error_groups SET occurrence_count = occurrence_count + 1,
                        last_seen = ?1 WHERE id = ?2",
                    params![ts(occurred_at), id],
                )
                .map_err(|err| map_db_error(&err))?;
                id
            }
            None => {
                let id = GroupId::generate().to_string();
                tx.execute(
                    "INSERT INTO error_groups (id, tenant_id, project_id, fingerprint,
                        service_name, error_class, message, occurrence_count, first_seen,
                        last_seen, status, assignee)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8, ?9, NULL)",
                    params![
                        id,
                        tenant_id.as_str(),
                        project_id.as_str(),
                        digest,
                        event.service_name,
                        event.error_class,
                        event.message,
                        ts(occurred_at),
                        TriageStatus::Unresolved.as_str()
                    ],
                )
                .map_err(|err| map_db_error(&err))?;
                id
            }
        };

        tx.execute(
            "INSERT INTO error_occurrences (group_id, stack_trace, attributes, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![group_id, event.stack_trace, json_col(&event.attributes), ts(occurred_at)],
        )
        .map_err(|err| map_db_error(&err))?;
        // Retention: keep only the newest occurrences for the group.
        tx.execute(
            "DELETE FROM error_occurrences WHERE rowid IN (
                SELECT rowid FROM error_occurrences WHERE group_id = ?1
                ORDER BY timestamp DESC LIMIT -1 OFFSET ?2)",
            params![group_id, i64_from_u64(OCCURRENCES_RETAINED as u64)],
        )
        .map_err(|err| map_db_error(&err))?;

        let group = tx
            .query_row(
                "SELECT id, tenant_id, project_id, fingerprint, service_name, error_class,
                        message, occurrence_count, first_seen, last_seen, status, assignee
                 FROM error_groups WHERE id = ?1",
                params![group_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, u64>(7)?,
                        row.get::<_, i64>(8)?,
                        row.get::<_, i64>(9)?,
                        row.get::<_, String>(10)?,
                        row.get::<_, Option<String>>(11)?,
                    ))
                },
            )
            .map_err(|err| map_db_error(&err))?;
        tx.commit().map_err(|err| map_db_error(&err))?;

        let (
            id,
            tenant,
            project,
            digest,
            service_name,
            error_class,
            message,
            occurrence_count,
            first_seen,
            last_seen,
            status,
            assignee,
        ) = group;
        Ok(ErrorGroup {
            id: GroupId::new(id),
            tenant_id: TenantId::new(tenant),
            project_id: ProjectId::new(project),
            fingerprint: digest,
            service_name,
            error_class,
            message,
            occurrence_count,
            first_seen: ts_from(first_seen)?,
            last_seen: ts_from(last_seen)?,
            status: TriageStatus::parse(&status)
                .ok_or_else(|| StoreError::Invalid(format!("unknown triage status: {status}")))?,
            assignee,
        })
    }

    fn upsert_service(&self, registration: &ServiceRegistration) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO services (tenant_id, project_id, service_name, source, kind,
                    last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (project_id, service_name) DO UPDATE SET
                    source = excluded.source, last_seen = excluded.last_seen",
                params![
                    registration.tenant_id.as_str(),
                    registration.project_id.as_str(),
                    registration.service_name,
                    registration.source,
                    registration.kind,
                    ts(registration.last_seen)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_deployment(&self, deployment: &Deployment) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO deployments (tenant_id, project_id, service, version,
                    environment, commit_sha, description, deployed_by, status, source,
                    completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    deployment.tenant_id.as_str(),
                    deployment.project_id.as_str(),
                    deployment.service,
                    deployment.version,
                    deployment.environment,
                    deployment.commit_sha,
                    deployment.description,
                    deployment.deployed_by,
                    deployment.status,
                    deployment.source,
                    ts(deployment.completed_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn list_metric_points(
        &self,
        project_id: &ProjectId,
        metric_name: Option<&str>,
        service_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MetricPoint>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT tenant_id, project_id, service_name, metric_name, value, kind, tags,
                        timestamp
                 FROM metric_points
                 WHERE project_id = ?1
                   AND (?2 IS NULL OR metric_name = ?2)
                   AND (?3 IS NULL OR service_name = ?3)
                 ORDER BY timestamp DESC LIMIT ?4",
            )
            .map_err(|err| map_db_error(&err))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement
            .query_map(params![project_id.as_str(), metric_name, service_name, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })
            .map_err(|err| map_db_error(&err))?;
        let mut points = Vec::new();
        for row in rows {
            let (tenant, project, service_name, metric_name, value, kind, tags, timestamp) =
                row.map_err(|err| map_db_error(&err))?;
            points.push(MetricPoint {
                tenant_id: TenantId::new(tenant),
                project_id: ProjectId::new(project),
                service_name,
                metric_name,
                value,
                kind: MetricKind::parse(&kind)
                    .ok_or_else(|| StoreError::Invalid(format!("unknown metric kind: {kind}")))?,
                tags: crate::store::json_from(&tags),
                timestamp: ts_from(timestamp)?,
            });
        }
        Ok(points)
    }

    fn metric_window_avg(
        &self,
        project_id: &ProjectId,
        metric_name: &str,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let guard = self.lock()?;
        guard
            .query_row(
                "SELECT AVG(value) FROM metric_points
                 WHERE project_id = ?1 AND metric_name = ?2 AND timestamp >= ?3
                   AND (?4 IS NULL OR service_name = ?4)",
                params![project_id.as_str(), metric_name, ts(since), service_name],
                |row| row.get::<_, Option<f64>>(0),
            )
            .map_err(|err| map_db_error(&err))
    }

    fn transaction_error_rate(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let guard = self.lock()?;
        let (total, errored): (i64, i64) = guard
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(error), 0) FROM transactions
                 WHERE project_id = ?1 AND timestamp >= ?2
                   AND (?3 IS NULL OR service_name = ?3)",
                params![project_id.as_str(), ts(since), service_name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|err| map_db_error(&err))?;
        if total == 0 {
            return Ok(None);
        }
        #[allow(clippy::cast_precision_loss, reason = "Row counts fit f64 precision.")]
        let rate = 100.0 * errored as f64 / total as f64;
        Ok(Some(rate))
    }

    fn transaction_avg_duration(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let guard = self.lock()?;
        guard
            .query_row(
                "SELECT AVG(duration_ms) FROM transactions
                 WHERE project_id = ?1 AND timestamp >= ?2
                   AND (?3 IS NULL OR service_name = ?3)",
                params![project_id.as_str(), ts(since), service_name],
                |row| row.get::<_, Option<f64>>(0),
            )
            .map_err(|err| map_db_error(&err))
    }

    fn transaction_percentiles(
        &self,
        project_id: &ProjectId,
        service_name: Option<&str>,
        since: Timestamp,
    ) -> Result<Option<LatencyPercentiles>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT duration_ms FROM transactions
                 WHERE project_id = ?1 AND timestamp >= ?2
                   AND (?3 IS NULL OR service_name = ?3)
                 ORDER BY duration_ms",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![project_id.as_str(), ts(since), service_name], |row| {
                row.get::<_, f64>(0)
            })
            .map_err(|err| map_db_error(&err))?;
        let mut durations = Vec::new();
        for row in rows {
            durations.push(row.map_err(|err| map_db_error(&err))?);
        }
        if durations.is_empty() {
            return Ok(None);
        }
        Ok(Some(LatencyPercentiles {
            p50: percentile(&durations, 50.0),
            p95: percentile(&durations, 95.0),
            p99: percentile(&durations, 99.0),
        }))
    }

    fn host_window_avg(
        &self,
        project_id: &ProjectId,
        field: HostField,
        since: Timestamp,
    ) -> Result<Option<f64>, StoreError> {
        let column = match field {
            HostField::CpuPercent => "cpu_percent",
            HostField::MemoryPercent => "memory_percent",
        };
        let sql = format!(
            "SELECT AVG({column}) FROM host_samples WHERE project_id = ?1 AND timestamp >= ?2"
        );
        let guard = self.lock()?;
        guard
            .query_row(&sql, params![project_id.as_str(), ts(since)], |row| {
                row.get::<_, Option<f64>>(0)
            })
            .map_err(|err| map_db_error(&err))
    }
}
