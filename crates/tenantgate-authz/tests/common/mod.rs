#![allow(dead_code)]

use std::sync::Arc;
use tenantgate_authz::store::memory::InMemoryStore;
use tenantgate_authz::{AuthorizationEngine, MemoryAuditSink, PermissionRegistry, RoleId};

/// Two tenants (7 and 9) with a few users, clients, documents, and filings.
pub async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.add_user("root", 1, RoleId::SuperAdmin).await;
    store.add_user("admin7", 7, RoleId::TenantAdmin).await;
    store.add_user("ana", 7, RoleId::Staff).await;
    store.add_user("u2", 7, RoleId::Viewer).await;
    store.add_user("admin9", 9, RoleId::TenantAdmin).await;
    store.add_user("u9", 9, RoleId::Viewer).await;

    store.add_client(10, 7).await;
    store.add_client(20, 9).await;
    store.add_document("doc-a", 10).await;
    store.add_document("doc-b", 20).await;
    store.add_filing(100, 7).await;
    store.add_filing(200, 9).await;
    store
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub engine: AuthorizationEngine,
}

pub async fn harness() -> Harness {
    harness_with(PermissionRegistry::builtin().expect("builtin registry")).await
}

pub async fn harness_with(registry: PermissionRegistry) -> Harness {
    let store = seeded_store().await;
    let audit = Arc::new(MemoryAuditSink::new());
    let engine = AuthorizationEngine::new(registry, store.clone()).with_audit_sink(audit.clone());
    Harness {
        store,
        audit,
        engine,
    }
}
