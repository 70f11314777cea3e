//! Tenant-aware data store contract used for resource and membership checks.
//!
//! # Purpose
//! The engine never owns tenant data; it asks a store narrow existence
//! questions, always filtered by tenant.
//!
//! # Backends
//! - [`memory::InMemoryStore`] for tests, demos, and single-process setups.
//! - [`postgres::PostgresStore`] for the durable application database.
use crate::{ResourceId, RoleId, TenantId, UserId};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;
#[cfg(all(test, feature = "pg-tests"))]
mod postgres_tests;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Existence queries the authorization engine relies on.
///
/// Every resource query takes the actor's tenant and must only answer `true`
/// for rows owned by that tenant.
#[async_trait]
pub trait TenancyStore: Send + Sync {
    async fn client_in_tenant(&self, client_id: &ResourceId, tenant_id: TenantId)
    -> StoreResult<bool>;
    /// Documents are owned through their client.
    async fn document_in_tenant(
        &self,
        document_id: &ResourceId,
        tenant_id: TenantId,
    ) -> StoreResult<bool>;
    async fn filing_in_tenant(&self, filing_id: &ResourceId, tenant_id: TenantId)
    -> StoreResult<bool>;
    /// Whether the user's profile belongs to the tenant.
    async fn user_in_tenant(&self, user_id: &UserId, tenant_id: TenantId) -> StoreResult<bool>;
    async fn user_role(&self, user_id: &UserId) -> StoreResult<Option<RoleId>>;
    /// Whether a membership record links the user to the tenant.
    async fn is_member(&self, user_id: &UserId, tenant_id: TenantId) -> StoreResult<bool>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
