// faultline-store-sqlite/src/identity.rs
// ============================================================================
// Module: SQLite Identity Repository
// Description: Tenants, projects, and API keys over SQLite.
// Purpose: Implement the IdentityStore interface.
// Dependencies: faultline-core, rusqlite
// ============================================================================

//! ## Overview
//! Identity rows back the auth plane. API-key lookups go through the unique
//! digest column; the raw key is never stored. Scope sets serialize as JSON
//! arrays of domain labels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use faultline_core::ApiKey;
use faultline_core::ApiKeyId;
use faultline_core::ConnectionId;
use faultline_core::IngestDomain;
use faultline_core::Project;
use faultline_core::ProjectId;
use faultline_core::Tenant;
use faultline_core::TenantId;
use faultline_core::Timestamp;
use faultline_core::WebhookConnection;
use faultline_core::WebhookProvider;
use faultline_core::interfaces::IdentityStore;
use faultline_core::interfaces::StoreError;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::store::SqliteStore;
use crate::store::map_db_error;
use crate::store::ts;
use crate::store::ts_from;
use crate::store::ts_opt;
use crate::store::ts_opt_from;

// ============================================================================
// SECTION: Scope Serialization
// ============================================================================

/// Serializes a scope set as a JSON array of domain labels.
fn scopes_col(scopes: &[IngestDomain]) -> Result<String, StoreError> {
    serde_json::to_string(scopes).map_err(|err| StoreError::Invalid(err.to_string()))
}

/// Parses a scope set column.
fn scopes_from(raw: &str) -> Result<Vec<IngestDomain>, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::Invalid(err.to_string()))
}

// ============================================================================
// SECTION: IdentityStore
// ============================================================================

impl IdentityStore for SqliteStore {
    fn insert_tenant(&self, tenant: &Tenant) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![tenant.id.as_str(), tenant.name, ts(tenant.created_at)],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO projects (id, tenant_id, name, slug, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    project.id.as_str(),
                    project.tenant_id.as_str(),
                    project.name,
                    project.slug,
                    ts(project.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn get_project(&self, project_id: &ProjectId) -> Result<Option<Project>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT id, tenant_id, name, slug, created_at FROM projects WHERE id = ?1",
                params![project_id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| map_db_error(&err))?;
        row.map(|(id, tenant_id, name, slug, created_at)| {
            Ok(Project {
                id: ProjectId::new(id),
                tenant_id: TenantId::new(tenant_id),
                name,
                slug,
                created_at: ts_from(created_at)?,
            })
        })
        .transpose()
    }

    fn insert_api_key(&self, key: &ApiKey) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO api_keys (id, tenant_id, project_id, name, key_prefix, key_hash,
                    scopes, is_active, last_used_at, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    key.id.as_str(),
                    key.tenant_id.as_str(),
                    key.project_id.as_str(),
                    key.name,
                    key.key_prefix,
                    key.key_hash,
                    scopes_col(&key.scopes)?,
                    key.is_active,
                    ts_opt(key.last_used_at),
                    ts(key.created_at),
                    ts_opt(key.expires_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT id, tenant_id, project_id, name, key_prefix, key_hash, scopes,
                        is_active, last_used_at, created_at, expires_at
                 FROM api_keys WHERE key_hash = ?1",
                params![key_hash],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, bool>(7)?,
                        row.get::<_, Option<i64>>(8)?,
                        row.get::<_, i64>(9)?,
                        row.get::<_, Option<i64>>(10)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| map_db_error(&err))?;
        row.map(
            |(
                id,
                tenant_id,
                project_id,
                name,
                key_prefix,
                key_hash,
                scopes,
                is_active,
                last_used_at,
                created_at,
                expires_at,
            )| {
                Ok(ApiKey {
                    id: ApiKeyId::new(id),
                    tenant_id: TenantId::new(tenant_id),
                    project_id: ProjectId::new(project_id),
                    name,
                    key_prefix,
                    key_hash,
                    scopes: scopes_from(&scopes)?,
                    is_active,
                    last_used_at: ts_opt_from(last_used_at)?,
                    created_at: ts_from(created_at)?,
                    expires_at: ts_opt_from(expires_at)?,
                })
            },
        )
        .transpose()
    }

    fn touch_api_key(&self, key_id: &ApiKeyId, used_at: Timestamp) -> Result<(), StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "UPDATE api_keys SET last_used_at = ?1 WHERE id = ?2",
                params![ts(used_at), key_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn set_api_key_active(&self, key_id: &ApiKeyId, is_active: bool) -> Result<(), StoreError> {
        let guard = self.lock()?;
        let changed = guard
            .execute(
                "UPDATE api_keys SET is_active = ?1 WHERE id = ?2",
                params![is_active, key_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        if changed == 0 {
            return Err(StoreError::NotFound(key_id.to_string()));
        }
        Ok(())
    }

    fn insert_webhook_connection(
        &self,
        connection: &WebhookConnection,
    ) -> Result<(), StoreError> {
        let sealed = self
            .secrets
            .seal(connection.webhook_secret.as_bytes())
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO webhook_connections (id, tenant_id, project_id, provider,
                    secret_sealed, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    connection.id.as_str(),
                    connection.tenant_id.as_str(),
                    connection.project_id.as_str(),
                    connection.provider.as_str(),
                    sealed,
                    connection.is_active,
                    ts(connection.created_at)
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    fn get_webhook_connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<WebhookConnection>, StoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT id, tenant_id, project_id, provider, secret_sealed, is_active,
                        created_at
                 FROM webhook_connections WHERE id = ?1",
                params![connection_id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, bool>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| map_db_error(&err))?;
        row.map(|(id, tenant, project, provider, sealed, is_active, created_at)| {
            let secret_bytes = self
                .secrets
                .open(&sealed)
                .map_err(|err| StoreError::Invalid(err.to_string()))?;
            let webhook_secret = String::from_utf8(secret_bytes)
                .map_err(|err| StoreError::Invalid(err.to_string()))?;
            Ok(WebhookConnection {
                id: ConnectionId::new(id),
                tenant_id: TenantId::new(tenant),
                project_id: ProjectId::new(project),
                provider: WebhookProvider::parse(&provider).ok_or_else(|| {
                    StoreError::Invalid(format!("unknown webhook provider: {provider}"))
                })?,
                webhook_secret,
                is_active,
                created_at: ts_from(created_at)?,
            })
        })
        .transpose()
    }
}
