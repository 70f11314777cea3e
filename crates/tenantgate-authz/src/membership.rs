//! Tenant membership validation, independent of module permissions.
use crate::store::{StoreResult, TenancyStore};
use crate::{RoleId, TenantId, UserId};
use std::sync::Arc;

/// Answers whether a user may operate inside a tenant at all.
///
/// Superusers are members of every tenant. Everyone else needs a membership
/// row. Lookup failures deny.
pub struct TenantMembershipValidator {
    store: Arc<dyn TenancyStore>,
}

impl TenantMembershipValidator {
    pub fn new(store: Arc<dyn TenancyStore>) -> Self {
        Self { store }
    }

    pub async fn validate_tenant_access(&self, user_id: &UserId, tenant_id: TenantId) -> bool {
        match self.lookup(user_id, tenant_id).await {
            Ok(allowed) => allowed,
            Err(err) => {
                metrics::counter!("tenantgate_authz_faults_total", "kind" => "store").increment(1);
                tracing::warn!(
                    error = %err,
                    %user_id,
                    tenant_id = tenant_id.get(),
                    "membership lookup failed; denying"
                );
                false
            }
        }
    }

    async fn lookup(&self, user_id: &UserId, tenant_id: TenantId) -> StoreResult<bool> {
        let role = self.store.user_role(user_id).await?;
        if role.as_ref().is_some_and(RoleId::is_superuser) {
            return Ok(true);
        }
        self.store.is_member(user_id, tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    async fn seeded() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.add_user("root", 1, RoleId::SuperAdmin).await;
        store.add_user("ana", 7, RoleId::Staff).await;
        store.add_membership("ana", 8).await;
        store
    }

    #[tokio::test]
    async fn members_and_superusers_pass() {
        let validator = TenantMembershipValidator::new(seeded().await);
        assert!(validator.validate_tenant_access(&UserId::new("ana"), TenantId::new(7)).await);
        assert!(validator.validate_tenant_access(&UserId::new("ana"), TenantId::new(8)).await);
        assert!(validator.validate_tenant_access(&UserId::new("root"), TenantId::new(42)).await);
    }

    #[tokio::test]
    async fn non_members_and_unknown_users_fail() {
        let validator = TenantMembershipValidator::new(seeded().await);
        assert!(!validator.validate_tenant_access(&UserId::new("ana"), TenantId::new(9)).await);
        assert!(!validator.validate_tenant_access(&UserId::new("ghost"), TenantId::new(7)).await);
    }

    #[tokio::test]
    async fn store_failure_denies() {
        let store = seeded().await;
        store.set_unavailable(true);
        let validator = TenantMembershipValidator::new(store);
        assert!(!validator.validate_tenant_access(&UserId::new("root"), TenantId::new(1)).await);
    }
}
