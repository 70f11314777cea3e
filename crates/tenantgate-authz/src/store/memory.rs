//! In-memory implementation of the tenancy store.
//!
//! # Purpose
//! Implements [`TenancyStore`] with `HashMap`s guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - tests and demos (no external dependencies)
//! - embedding the engine in processes that already hold tenancy data in memory
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - Reads take read locks only; seeding takes write locks.
//!
//! # Fault injection
//! [`InMemoryStore::set_unavailable`] makes every query fail with
//! [`StoreError::Unavailable`], which is how tests exercise fail-secure paths.
use super::{StoreError, StoreResult, TenancyStore};
use crate::{ResourceId, RoleId, TenantId, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct UserRecord {
    tenant_id: TenantId,
    role: RoleId,
}

/// In-memory tenancy store.
///
/// Resource ids are keyed by their canonical string form so `42` and `"42"`
/// name the same row.
#[derive(Default)]
pub struct InMemoryStore {
    /// User profiles keyed by user id.
    users: Arc<RwLock<HashMap<UserId, UserRecord>>>,
    /// `(user, tenant)` membership records.
    memberships: Arc<RwLock<HashSet<(UserId, TenantId)>>>,
    /// Client id -> owning tenant.
    clients: Arc<RwLock<HashMap<String, TenantId>>>,
    /// Document id -> owning client id.
    documents: Arc<RwLock<HashMap<String, String>>>,
    /// Filing id -> owning tenant.
    filings: Arc<RwLock<HashMap<String, TenantId>>>,
    unavailable: AtomicBool,
    queries: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user profile and its membership in the home tenant.
    pub async fn add_user(&self, user_id: &str, tenant_id: i64, role: impl Into<RoleId>) {
        let user_id = UserId::new(user_id);
        let tenant_id = TenantId::new(tenant_id);
        self.users.write().await.insert(
            user_id.clone(),
            UserRecord {
                tenant_id,
                role: role.into(),
            },
        );
        self.memberships.write().await.insert((user_id, tenant_id));
    }

    /// Link an existing user to an additional tenant.
    pub async fn add_membership(&self, user_id: &str, tenant_id: i64) {
        self.memberships
            .write()
            .await
            .insert((UserId::new(user_id), TenantId::new(tenant_id)));
    }

    pub async fn add_client(&self, client_id: impl Into<ResourceId>, tenant_id: i64) {
        self.clients
            .write()
            .await
            .insert(client_id.into().to_string(), TenantId::new(tenant_id));
    }

    pub async fn add_document(
        &self,
        document_id: impl Into<ResourceId>,
        client_id: impl Into<ResourceId>,
    ) {
        self.documents
            .write()
            .await
            .insert(document_id.into().to_string(), client_id.into().to_string());
    }

    pub async fn add_filing(&self, filing_id: impl Into<ResourceId>, tenant_id: i64) {
        self.filings
            .write()
            .await
            .insert(filing_id.into().to_string(), TenantId::new(tenant_id));
    }

    /// Make every subsequent query fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of queries answered or refused so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    fn begin_query(&self) -> StoreResult<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store offline".into()));
        }
        Ok(())
    }
}

fn resource_key(id: &ResourceId) -> StoreResult<String> {
    let key = id.to_string();
    if key.trim().is_empty() {
        return Err(StoreError::InvalidId("empty resource id".into()));
    }
    Ok(key)
}

#[async_trait]
impl TenancyStore for InMemoryStore {
    async fn client_in_tenant(
        &self,
        client_id: &ResourceId,
        tenant_id: TenantId,
    ) -> StoreResult<bool> {
        self.begin_query()?;
        let key = resource_key(client_id)?;
        Ok(self.clients.read().await.get(&key) == Some(&tenant_id))
    }

    async fn document_in_tenant(
        &self,
        document_id: &ResourceId,
        tenant_id: TenantId,
    ) -> StoreResult<bool> {
        self.begin_query()?;
        let key = resource_key(document_id)?;
        let Some(client_id) = self.documents.read().await.get(&key).cloned() else {
            return Ok(false);
        };
        Ok(self.clients.read().await.get(&client_id) == Some(&tenant_id))
    }

    async fn filing_in_tenant(
        &self,
        filing_id: &ResourceId,
        tenant_id: TenantId,
    ) -> StoreResult<bool> {
        self.begin_query()?;
        let key = resource_key(filing_id)?;
        Ok(self.filings.read().await.get(&key) == Some(&tenant_id))
    }

    async fn user_in_tenant(&self, user_id: &UserId, tenant_id: TenantId) -> StoreResult<bool> {
        self.begin_query()?;
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .is_some_and(|user| user.tenant_id == tenant_id))
    }

    async fn user_role(&self, user_id: &UserId) -> StoreResult<Option<RoleId>> {
        self.begin_query()?;
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .map(|user| user.role.clone()))
    }

    async fn is_member(&self, user_id: &UserId, tenant_id: TenantId) -> StoreResult<bool> {
        self.begin_query()?;
        Ok(self
            .memberships
            .read()
            .await
            .contains(&(user_id.clone(), tenant_id)))
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.begin_query()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resources_are_tenant_scoped() {
        let store = InMemoryStore::new();
        store.add_client(10, 7).await;
        store.add_document("doc-1", 10).await;
        store.add_filing("f-1", 9).await;

        let t7 = TenantId::new(7);
        let t9 = TenantId::new(9);
        assert!(store.client_in_tenant(&ResourceId::from(10), t7).await.expect("query"));
        assert!(!store.client_in_tenant(&ResourceId::from(10), t9).await.expect("query"));
        assert!(store.client_in_tenant(&ResourceId::from("10"), t7).await.expect("query"));
        assert!(store.document_in_tenant(&"doc-1".into(), t7).await.expect("query"));
        assert!(!store.document_in_tenant(&"doc-1".into(), t9).await.expect("query"));
        assert!(!store.document_in_tenant(&"doc-2".into(), t7).await.expect("query"));
        assert!(store.filing_in_tenant(&"f-1".into(), t9).await.expect("query"));
    }

    #[tokio::test]
    async fn users_and_memberships() {
        let store = InMemoryStore::new();
        store.add_user("u1", 7, RoleId::Staff).await;
        store.add_membership("u1", 9).await;

        let u1 = UserId::new("u1");
        assert!(store.user_in_tenant(&u1, TenantId::new(7)).await.expect("query"));
        assert!(!store.user_in_tenant(&u1, TenantId::new(9)).await.expect("query"));
        assert!(store.is_member(&u1, TenantId::new(9)).await.expect("query"));
        assert_eq!(store.user_role(&u1).await.expect("query"), Some(RoleId::Staff));
        assert_eq!(store.user_role(&UserId::new("ghost")).await.expect("query"), None);
    }

    #[tokio::test]
    async fn unavailable_store_fails_queries() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        let err = store
            .client_in_tenant(&ResourceId::from(1), TenantId::new(1))
            .await
            .expect_err("offline");
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.health_check().await.is_err());
        assert_eq!(store.query_count(), 2);

        store.set_unavailable(false);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn empty_ids_are_invalid() {
        let store = InMemoryStore::new();
        let err = store
            .filing_in_tenant(&ResourceId::from(""), TenantId::new(1))
            .await
            .expect_err("empty id");
        assert!(matches!(err, StoreError::InvalidId(_)));
    }
}
