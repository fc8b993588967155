// faultline-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Store Core
// Description: Connection management, pragmas, and schema for the durable
//              store.
// Purpose: Persist every Faultline entity under tenant/project scope.
// Dependencies: faultline-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! [`SqliteStore`] is the single durable store behind all four repository
//! interfaces. It opens one `SQLite` connection in WAL mode guarded by a
//! mutex, initializes the schema inside a transaction, and enforces the
//! platform invariants structurally: `(tenant_id, slug)` uniqueness,
//! unique API-key digests, a partial unique index allowing at most one
//! `firing` alert per condition, and cascade deletes from incidents and
//! error groups to everything they own. Timestamps are stored as unix epoch
//! milliseconds so window queries compare integers. Sensitive notification
//! channel configuration is sealed before it reaches a row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use faultline_core::SealedBox;
use faultline_core::Timestamp;
use faultline_core::interfaces::StoreError;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    /// Builds a config with the default busy timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Constraint violation.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
    /// Invalid stored data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Store(message)
            }
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a `rusqlite` error, classifying constraint violations as conflicts.
pub(crate) fn map_db_error(error: &rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(inner, message) = error {
        if inner.code == ErrorCode::ConstraintViolation {
            return StoreError::Conflict(
                message.clone().unwrap_or_else(|| "constraint violation".to_string()),
            );
        }
    }
    StoreError::Store(error.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed store implementing every repository interface.
#[derive(Clone)]
pub struct SqliteStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Sealing key for sensitive configuration columns.
    pub(crate) secrets: SealedBox,
}

impl SqliteStore {
    /// Opens the store, applying pragmas and initializing the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn open(config: &SqliteStoreConfig, secrets: SealedBox) -> Result<Self, SqliteStoreError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
            }
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let mut connection = Connection::open_with_flags(&config.path, flags)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        apply_pragmas(&connection, config)?;
        initialize_schema(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)), secrets })
    }

    /// Opens an in-memory store for tests and tooling.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when initialization fails.
    pub fn open_in_memory(secrets: SealedBox) -> Result<Self, SqliteStoreError> {
        let mut connection =
            Connection::open_in_memory().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        initialize_schema(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)), secrets })
    }

    /// Locks the shared connection.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::Store("store mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Pragmas / Schema
// ============================================================================

/// Applies pragmas required for durability and concurrency.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = wal;
             PRAGMA synchronous = normal;",
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the schema or validates an existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = {
        use rusqlite::OptionalExtension as _;
        tx.query_row("SELECT version FROM store_meta LIMIT 1", [], |row| row.get(0))
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?
    };
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", [SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(SCHEMA_DDL).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Full schema for a fresh store.
const SCHEMA_DDL: &str = "
CREATE TABLE IF NOT EXISTS tenants (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    slug TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (tenant_id, slug)
);
CREATE TABLE IF NOT EXISTS api_keys (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    key_prefix TEXT NOT NULL,
    key_hash TEXT NOT NULL UNIQUE,
    scopes TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    last_used_at INTEGER,
    created_at INTEGER NOT NULL,
    expires_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_api_keys_project ON api_keys (project_id, is_active);

CREATE TABLE IF NOT EXISTS webhook_connections (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    provider TEXT NOT NULL,
    secret_sealed TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS metric_points (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    service_name TEXT NOT NULL,
    metric_name TEXT NOT NULL,
    value REAL NOT NULL,
    kind TEXT NOT NULL,
    tags TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_metric_points_service
    ON metric_points (project_id, service_name, timestamp);
CREATE INDEX IF NOT EXISTS idx_metric_points_name
    ON metric_points (project_id, metric_name, timestamp);

CREATE TABLE IF NOT EXISTS transactions (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    service_name TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    method TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    duration_ms REAL NOT NULL,
    db_duration_ms REAL NOT NULL,
    external_duration_ms REAL NOT NULL,
    error INTEGER NOT NULL,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_service
    ON transactions (project_id, service_name, timestamp);

CREATE TABLE IF NOT EXISTS traces (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    trace_id TEXT NOT NULL,
    root_service TEXT NOT NULL,
    root_operation TEXT NOT NULL,
    duration_ms REAL NOT NULL,
    span_count INTEGER NOT NULL,
    has_error INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    PRIMARY KEY (project_id, trace_id)
);
CREATE TABLE IF NOT EXISTS spans (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    trace_id TEXT NOT NULL,
    span_id TEXT NOT NULL,
    parent_span_id TEXT,
    service_name TEXT NOT NULL,
    operation TEXT NOT NULL,
    duration_ms REAL NOT NULL,
    status TEXT NOT NULL,
    attributes TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_spans_trace ON spans (project_id, trace_id);
CREATE INDEX IF NOT EXISTS idx_spans_service
    ON spans (project_id, service_name, timestamp);

CREATE TABLE IF NOT EXISTS log_entries (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    level TEXT NOT NULL,
    service_name TEXT NOT NULL,
    message TEXT NOT NULL,
    attributes TEXT NOT NULL,
    trace_id TEXT,
    span_id TEXT,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_log_entries_service
    ON log_entries (project_id, service_name, timestamp);

CREATE TABLE IF NOT EXISTS host_samples (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    hostname TEXT NOT NULL,
    cpu_percent REAL NOT NULL,
    memory_percent REAL NOT NULL,
    disk_usage TEXT NOT NULL,
    network_io TEXT NOT NULL,
    load_avg TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_host_samples_project
    ON host_samples (project_id, timestamp);

CREATE TABLE IF NOT EXISTS browser_events (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    page_url TEXT NOT NULL,
    event_kind TEXT NOT NULL,
    load_time_ms REAL,
    user_agent TEXT,
    attributes TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_browser_events_project
    ON browser_events (project_id, timestamp);

CREATE TABLE IF NOT EXISTS vulnerabilities (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    cve_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    severity TEXT NOT NULL,
    service_name TEXT NOT NULL,
    package_name TEXT NOT NULL,
    installed_version TEXT NOT NULL,
    fixed_version TEXT,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_vulnerabilities_service
    ON vulnerabilities (project_id, service_name, timestamp);

CREATE TABLE IF NOT EXISTS deployments (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    service TEXT NOT NULL,
    version TEXT NOT NULL,
    environment TEXT NOT NULL,
    commit_sha TEXT,
    description TEXT NOT NULL,
    deployed_by TEXT NOT NULL,
    status TEXT NOT NULL,
    source TEXT NOT NULL,
    completed_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_deployments_project
    ON deployments (project_id, completed_at);

CREATE TABLE IF NOT EXISTS services (
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    service_name TEXT NOT NULL,
    source TEXT NOT NULL,
    kind TEXT NOT NULL,
    last_seen INTEGER NOT NULL,
    PRIMARY KEY (project_id, service_name)
);

CREATE TABLE IF NOT EXISTS error_groups (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    service_name TEXT NOT NULL,
    error_class TEXT NOT NULL,
    message TEXT NOT NULL,
    occurrence_count INTEGER NOT NULL,
    first_seen INTEGER NOT NULL,
    last_seen INTEGER NOT NULL,
    status TEXT NOT NULL,
    assignee TEXT,
    UNIQUE (project_id, fingerprint)
);
CREATE TABLE IF NOT EXISTS error_occurrences (
    group_id TEXT NOT NULL REFERENCES error_groups(id) ON DELETE CASCADE,
    stack_trace TEXT,
    attributes TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_error_occurrences_group
    ON error_occurrences (group_id, timestamp);

CREATE TABLE IF NOT EXISTS incidents (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    service_name TEXT NOT NULL,
    state TEXT NOT NULL,
    severity TEXT NOT NULL,
    detected_at INTEGER NOT NULL,
    acknowledged_at INTEGER,
    resolved_at INTEGER,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_incidents_project
    ON incidents (project_id, detected_at);
CREATE INDEX IF NOT EXISTS idx_incidents_state ON incidents (project_id, state);

CREATE TABLE IF NOT EXISTS activities (
    id TEXT PRIMARY KEY,
    incident_id TEXT NOT NULL REFERENCES incidents(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    content TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    user_id TEXT,
    user_name TEXT NOT NULL,
    user_email TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_activities_incident
    ON activities (incident_id, created_at);

CREATE TABLE IF NOT EXISTS analysis_steps (
    id TEXT PRIMARY KEY,
    incident_id TEXT NOT NULL REFERENCES incidents(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    step_number INTEGER NOT NULL,
    status TEXT NOT NULL,
    input TEXT,
    output TEXT,
    input_tokens INTEGER,
    output_tokens INTEGER,
    cost_usd REAL,
    duration_ms INTEGER,
    error_message TEXT,
    started_at INTEGER,
    completed_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_analysis_steps_incident
    ON analysis_steps (incident_id, step_number);

CREATE TABLE IF NOT EXISTS hypotheses (
    id TEXT PRIMARY KEY,
    incident_id TEXT NOT NULL REFERENCES incidents(id) ON DELETE CASCADE,
    claim TEXT NOT NULL,
    description TEXT NOT NULL,
    confidence_score REAL NOT NULL,
    supporting_evidence TEXT NOT NULL,
    rank INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (incident_id, rank)
);

CREATE TABLE IF NOT EXISTS ai_requests (
    id TEXT PRIMARY KEY,
    incident_id TEXT NOT NULL REFERENCES incidents(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    input_tokens INTEGER NOT NULL,
    output_tokens INTEGER NOT NULL,
    cost_usd REAL NOT NULL,
    duration_ms INTEGER NOT NULL,
    model TEXT NOT NULL,
    prompt_summary TEXT NOT NULL,
    response_summary TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS alert_policies (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    is_enabled INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS alert_conditions (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    metric_name TEXT NOT NULL,
    service_name TEXT,
    operator TEXT NOT NULL,
    threshold REAL NOT NULL,
    duration_minutes INTEGER NOT NULL,
    severity TEXT NOT NULL,
    is_enabled INTEGER NOT NULL,
    policy_id TEXT REFERENCES alert_policies(id) ON DELETE SET NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alert_conditions_enabled
    ON alert_conditions (is_enabled);

CREATE TABLE IF NOT EXISTS notification_channels (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    config_sealed TEXT NOT NULL,
    is_enabled INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS channel_policies (
    channel_id TEXT NOT NULL REFERENCES notification_channels(id) ON DELETE CASCADE,
    policy_id TEXT NOT NULL REFERENCES alert_policies(id) ON DELETE CASCADE,
    PRIMARY KEY (channel_id, policy_id)
);

CREATE TABLE IF NOT EXISTS muting_rules (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    name TEXT NOT NULL,
    matchers TEXT NOT NULL,
    starts_at INTEGER NOT NULL,
    ends_at INTEGER NOT NULL,
    is_active INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS active_alerts (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    condition_id TEXT NOT NULL REFERENCES alert_conditions(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    severity TEXT NOT NULL,
    status TEXT NOT NULL,
    service_name TEXT,
    metric_value REAL,
    fired_at INTEGER NOT NULL,
    acknowledged_at INTEGER,
    resolved_at INTEGER
);
CREATE UNIQUE INDEX IF NOT EXISTS ux_active_alerts_firing
    ON active_alerts (condition_id) WHERE status = 'firing';
CREATE INDEX IF NOT EXISTS idx_active_alerts_project
    ON active_alerts (project_id, fired_at);
";

// ============================================================================
// SECTION: Column Helpers
// ============================================================================

/// Stores a timestamp as unix epoch milliseconds.
pub(crate) fn ts(value: Timestamp) -> i64 {
    value.unix_millis()
}

/// Stores an optional timestamp.
pub(crate) fn ts_opt(value: Option<Timestamp>) -> Option<i64> {
    value.map(|value| value.unix_millis())
}

/// Reads a timestamp from unix epoch milliseconds.
pub(crate) fn ts_from(millis: i64) -> Result<Timestamp, StoreError> {
    Timestamp::from_unix_millis(millis).map_err(|err| StoreError::Invalid(err.to_string()))
}

/// Reads an optional timestamp.
pub(crate) fn ts_opt_from(millis: Option<i64>) -> Result<Option<Timestamp>, StoreError> {
    millis.map(ts_from).transpose()
}

/// Serializes a JSON value column.
pub(crate) fn json_col(value: &serde_json::Value) -> String {
    value.to_string()
}

/// Stores a `u64` as a SQLite-native `i64` column.
pub(crate) fn i64_from_u64(value: u64) -> i64 {
    i64::from_ne_bytes(value.to_ne_bytes())
}

/// Reads a `u64` back from a SQLite-native `i64` column.
pub(crate) fn u64_from_i64(value: i64) -> u64 {
    u64::from_ne_bytes(value.to_ne_bytes())
}

/// Parses a JSON value column.
pub(crate) fn json_from(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or(serde_json::Value::Null)
}
