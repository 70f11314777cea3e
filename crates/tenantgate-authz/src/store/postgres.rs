//! Postgres-backed implementation of the tenancy store.
//!
//! # What this module is
//! Implements [`TenancyStore`] over the application database via `sqlx`.
//! Every query is a single `SELECT EXISTS(...)` (or a single-row lookup)
//! filtered by tenant, so a check never reads another tenant's rows.
//!
//! # What this module is NOT
//! It does not manage tenants, users, or documents; the application owns
//! those tables and this store only reads them.
//!
//! # Operational notes
//! - Migrations are embedded with `sqlx::migrate!("./migrations")` and run on
//!   connect unless disabled.
//! - Pool acquisition is bounded by `acquire_timeout_ms`; a timeout surfaces
//!   as a [`StoreError`], which the engine turns into a denial.
//!
//! # Security notes
//! - Database URLs may contain credentials; never log `PostgresConfig::url`.
//! - All values are bound parameters; there is no dynamic SQL.
use super::{StoreResult, TenancyStore};
use crate::{ResourceId, RoleId, TenantId, UserId};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Connection settings for [`PostgresStore`].
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    2_000
}

const CLIENT_IN_TENANT: &str =
    "SELECT EXISTS(SELECT 1 FROM clients WHERE id = $1 AND tenant_id = $2)";
const DOCUMENT_IN_TENANT: &str = r#"SELECT EXISTS(
    SELECT 1 FROM documents d
    JOIN clients c ON c.id = d.client_id
    WHERE d.id = $1 AND c.tenant_id = $2
)"#;
const FILING_IN_TENANT: &str =
    "SELECT EXISTS(SELECT 1 FROM filings WHERE id = $1 AND tenant_id = $2)";
const USER_IN_TENANT: &str = "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND tenant_id = $2)";
const USER_ROLE: &str = "SELECT role FROM users WHERE id = $1";
const IS_MEMBER: &str =
    "SELECT EXISTS(SELECT 1 FROM tenant_memberships WHERE user_id = $1 AND tenant_id = $2)";

/// Durable tenancy store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use tenantgate_authz::store::postgres::{PostgresConfig, PostgresStore};
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect, then apply embedded migrations.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, true).await
    }

    /// Connect against a schema managed elsewhere.
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, false).await
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn connect_internal(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }
        tracing::info!(
            max_connections = pg.max_connections,
            migrations = run_migrations,
            "postgres tenancy store connected"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn exists(&self, query: &'static str, id: String, tenant_id: TenantId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(query)
            .bind(id)
            .bind(tenant_id.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl TenancyStore for PostgresStore {
    async fn client_in_tenant(
        &self,
        client_id: &ResourceId,
        tenant_id: TenantId,
    ) -> StoreResult<bool> {
        self.exists(CLIENT_IN_TENANT, client_id.to_string(), tenant_id)
            .await
    }

    async fn document_in_tenant(
        &self,
        document_id: &ResourceId,
        tenant_id: TenantId,
    ) -> StoreResult<bool> {
        self.exists(DOCUMENT_IN_TENANT, document_id.to_string(), tenant_id)
            .await
    }

    async fn filing_in_tenant(
        &self,
        filing_id: &ResourceId,
        tenant_id: TenantId,
    ) -> StoreResult<bool> {
        self.exists(FILING_IN_TENANT, filing_id.to_string(), tenant_id)
            .await
    }

    async fn user_in_tenant(&self, user_id: &UserId, tenant_id: TenantId) -> StoreResult<bool> {
        self.exists(USER_IN_TENANT, user_id.to_string(), tenant_id)
            .await
    }

    async fn user_role(&self, user_id: &UserId) -> StoreResult<Option<RoleId>> {
        let role: Option<String> = sqlx::query_scalar(USER_ROLE)
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(role.map(RoleId::from))
    }

    async fn is_member(&self, user_id: &UserId, tenant_id: TenantId) -> StoreResult<bool> {
        self.exists(IS_MEMBER, user_id.to_string(), tenant_id).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_apply() {
        let config: PostgresConfig =
            serde_yaml::from_str("url: postgres://localhost/app\n").expect("yaml");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_ms, 2_000);
    }

    #[test]
    fn tenant_queries_always_filter_by_tenant() {
        for query in [
            CLIENT_IN_TENANT,
            DOCUMENT_IN_TENANT,
            FILING_IN_TENANT,
            USER_IN_TENANT,
            IS_MEMBER,
        ] {
            assert!(query.contains("tenant_id = $2"), "{query}");
        }
    }
}
