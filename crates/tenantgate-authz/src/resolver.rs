//! Resource ownership resolution for instance-level checks.
//!
//! # Purpose
//! Once a role may perform an action on a module in general, an instance
//! check asks whether *this* resource belongs to the actor's tenant. Each
//! module gets its own [`ResourceOwnershipChecker`]; modules without one have
//! no constraint beyond the module-level grant.
//!
//! # Key invariants
//! - Every checker filters by `ctx.tenant_id`. Only the superuser bypasses it.
//! - Checkers report store failures as `Err`; the engine turns them into
//!   denials.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use tenantgate_authz::{Module, ResourceResolver};
//! use tenantgate_authz::store::memory::InMemoryStore;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let resolver = ResourceResolver::standard(store, ResourceResolver::default_user_managers());
//! assert!(resolver.has_checker(&Module::Clients));
//! assert!(!resolver.has_checker(&Module::Reports));
//! ```
use crate::store::{StoreResult, TenancyStore};
use crate::{ActorContext, Module, ResourceId, RoleId, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Per-module strategy deciding whether one resource is within reach of the
/// actor.
#[async_trait]
pub trait ResourceOwnershipChecker: Send + Sync {
    async fn check(&self, ctx: &ActorContext, resource_id: &ResourceId) -> StoreResult<bool>;
}

/// Outcome of an instance-level check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceVerdict {
    Owned,
    NotOwned,
    /// No checker is registered for the module.
    Unconstrained,
}

/// Tables whose rows are owned by a tenant directly or through a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScopedKind {
    Client,
    Document,
    Filing,
}

/// Tenant-filtered existence check for clients, documents, and filings.
pub struct TenantScopedChecker {
    store: Arc<dyn TenancyStore>,
    kind: TenantScopedKind,
}

impl TenantScopedChecker {
    pub fn new(store: Arc<dyn TenancyStore>, kind: TenantScopedKind) -> Self {
        Self { store, kind }
    }
}

#[async_trait]
impl ResourceOwnershipChecker for TenantScopedChecker {
    async fn check(&self, ctx: &ActorContext, resource_id: &ResourceId) -> StoreResult<bool> {
        if ctx.role.is_superuser() {
            return Ok(true);
        }
        match self.kind {
            TenantScopedKind::Client => {
                self.store.client_in_tenant(resource_id, ctx.tenant_id).await
            }
            TenantScopedKind::Document => {
                self.store
                    .document_in_tenant(resource_id, ctx.tenant_id)
                    .await
            }
            TenantScopedKind::Filing => {
                self.store.filing_in_tenant(resource_id, ctx.tenant_id).await
            }
        }
    }
}

/// Ownership rules for user records.
///
/// Users may always act on their own record. Acting on someone else requires
/// a user-manager role and a target in the same tenant.
pub struct UserRecordChecker {
    store: Arc<dyn TenancyStore>,
    managers: HashSet<RoleId>,
}

impl UserRecordChecker {
    pub fn new(store: Arc<dyn TenancyStore>, managers: impl IntoIterator<Item = RoleId>) -> Self {
        Self {
            store,
            managers: managers.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ResourceOwnershipChecker for UserRecordChecker {
    async fn check(&self, ctx: &ActorContext, resource_id: &ResourceId) -> StoreResult<bool> {
        if resource_id.is_user(&ctx.user_id) {
            return Ok(true);
        }
        if !self.managers.contains(&ctx.role) {
            return Ok(false);
        }
        // The engine answers superusers before resolving; this covers callers
        // that use the resolver directly.
        if ctx.role.is_superuser() {
            return Ok(true);
        }
        let target = UserId::new(resource_id.to_string());
        self.store.user_in_tenant(&target, ctx.tenant_id).await
    }
}

/// Registry of ownership checkers keyed by module.
#[derive(Default, Clone)]
pub struct ResourceResolver {
    checkers: HashMap<Module, Arc<dyn ResourceOwnershipChecker>>,
}

impl ResourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles allowed to act on other users' records by default.
    pub fn default_user_managers() -> Vec<RoleId> {
        vec![RoleId::SuperAdmin, RoleId::TenantAdmin]
    }

    /// Checkers for clients, documents, filings, and users over one store.
    pub fn standard(store: Arc<dyn TenancyStore>, user_managers: Vec<RoleId>) -> Self {
        Self::new()
            .with_checker(
                Module::Clients,
                Arc::new(TenantScopedChecker::new(
                    store.clone(),
                    TenantScopedKind::Client,
                )),
            )
            .with_checker(
                Module::Documents,
                Arc::new(TenantScopedChecker::new(
                    store.clone(),
                    TenantScopedKind::Document,
                )),
            )
            .with_checker(
                Module::Filings,
                Arc::new(TenantScopedChecker::new(
                    store.clone(),
                    TenantScopedKind::Filing,
                )),
            )
            .with_checker(
                Module::Users,
                Arc::new(UserRecordChecker::new(store, user_managers)),
            )
    }

    pub fn with_checker(
        mut self,
        module: Module,
        checker: Arc<dyn ResourceOwnershipChecker>,
    ) -> Self {
        self.register(module, checker);
        self
    }

    /// Add or replace the checker for a module.
    pub fn register(&mut self, module: Module, checker: Arc<dyn ResourceOwnershipChecker>) {
        self.checkers.insert(module, checker);
    }

    pub fn has_checker(&self, module: &Module) -> bool {
        self.checkers.contains_key(module)
    }

    pub async fn resolve(
        &self,
        ctx: &ActorContext,
        module: &Module,
        resource_id: &ResourceId,
    ) -> StoreResult<ResourceVerdict> {
        let Some(checker) = self.checkers.get(module) else {
            return Ok(ResourceVerdict::Unconstrained);
        };
        if checker.check(ctx, resource_id).await? {
            Ok(ResourceVerdict::Owned)
        } else {
            Ok(ResourceVerdict::NotOwned)
        }
    }
}
