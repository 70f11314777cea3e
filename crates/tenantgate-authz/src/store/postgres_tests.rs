//! Postgres store tests against a real database.
//!
//! # How to use
//! Point `TENANTGATE_TEST_DATABASE_URL` at a disposable database and run
//! `cargo test -p tenantgate-authz --features pg-tests postgres_store`.
//! Without the variable the tests return early.
//!
//! Tests are serialized because they share and truncate the same tables.
use super::TenancyStore;
use super::postgres::{PostgresConfig, PostgresStore};
use crate::{ResourceId, RoleId, TenantId, UserId};
use serial_test::serial;

async fn connect() -> Option<PostgresStore> {
    let url = std::env::var("TENANTGATE_TEST_DATABASE_URL").ok()?;
    let store = PostgresStore::connect(&PostgresConfig {
        url,
        max_connections: 2,
        acquire_timeout_ms: 5_000,
    })
    .await
    .expect("connect");
    sqlx::query("TRUNCATE tenants, users, tenant_memberships, clients, documents, filings")
        .execute(store.pool())
        .await
        .expect("truncate");
    Some(store)
}

async fn seed(store: &PostgresStore) {
    for statement in [
        "INSERT INTO tenants (id, display_name) VALUES (7, 'Seven'), (9, 'Nine')",
        "INSERT INTO users (id, tenant_id, role) VALUES ('u1', 7, 'Tenant Admin'), ('u2', 7, 'Staff'), ('u3', 9, 'Staff')",
        "INSERT INTO tenant_memberships (user_id, tenant_id) VALUES ('u1', 7), ('u2', 7), ('u3', 9), ('u3', 7)",
        "INSERT INTO clients (id, tenant_id) VALUES ('10', 7), ('20', 9)",
        "INSERT INTO documents (id, client_id) VALUES ('doc-1', '10'), ('doc-2', '20')",
        "INSERT INTO filings (id, tenant_id) VALUES ('f-1', 7)",
    ] {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .expect("seed");
    }
}

#[tokio::test]
#[serial]
async fn postgres_store_resource_queries_are_tenant_scoped() {
    let Some(store) = connect().await else {
        return;
    };
    seed(&store).await;
    let t7 = TenantId::new(7);
    let t9 = TenantId::new(9);

    assert!(store.client_in_tenant(&ResourceId::from(10), t7).await.expect("q"));
    assert!(!store.client_in_tenant(&ResourceId::from(20), t7).await.expect("q"));
    assert!(store.document_in_tenant(&"doc-1".into(), t7).await.expect("q"));
    assert!(!store.document_in_tenant(&"doc-2".into(), t7).await.expect("q"));
    assert!(store.document_in_tenant(&"doc-2".into(), t9).await.expect("q"));
    assert!(store.filing_in_tenant(&"f-1".into(), t7).await.expect("q"));
    assert!(!store.filing_in_tenant(&"f-1".into(), t9).await.expect("q"));
}

#[tokio::test]
#[serial]
async fn postgres_store_user_queries() {
    let Some(store) = connect().await else {
        return;
    };
    seed(&store).await;
    let u3 = UserId::new("u3");

    assert!(!store.user_in_tenant(&u3, TenantId::new(7)).await.expect("q"));
    assert!(store.is_member(&u3, TenantId::new(7)).await.expect("q"));
    assert_eq!(
        store.user_role(&UserId::new("u1")).await.expect("q"),
        Some(RoleId::TenantAdmin)
    );
    assert_eq!(store.user_role(&UserId::new("nobody")).await.expect("q"), None);
    store.health_check().await.expect("health");
    assert_eq!(store.backend_name(), "postgres");
}
