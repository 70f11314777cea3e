//! Authorization engine: module-level resolution plus instance checks.
//!
//! # Purpose
//! Answers "may this actor perform this action on this module (and this
//! resource)?" as a plain boolean, never as an error.
//!
//! # Decision order
//! 1. Superuser role: granted, nothing else consulted.
//! 2. Unknown role: denied.
//! 3. Non-superuser role with `global: true`: denied (configuration fault).
//! 4. Direct module/action match, including `"*"` wildcards.
//! 5. Inherited roles, depth first, each role visited at most once.
//! 6. No match: denied.
//! 7. Module access plus a resource id: the resource resolver decides.
//! 8. Module access alone: granted.
//!
//! # Key invariants
//! - The store is never queried unless step 4 or 5 granted module access.
//! - Store failures and configuration faults become denials; they are
//!   logged, counted, and carried in the audit record.
//! - The registry snapshot is swapped atomically on reload; a check in flight
//!   keeps the snapshot it started with.
use crate::audit::{AuditRecord, AuditSink, TracingAuditSink};
use crate::guard::{AuthorizationError, PermissionGuard};
use crate::membership::TenantMembershipValidator;
use crate::registry::PermissionRegistry;
use crate::resolver::{ResourceOwnershipChecker, ResourceResolver, ResourceVerdict, UserRecordChecker};
use crate::store::{StoreError, TenancyStore};
use crate::{Action, ActorContext, Module, PermissionRequest, RoleId, TenantId, UserId};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// Why a decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    Superuser,
    ModuleGrant,
    InheritedGrant { via: RoleId },
    ResourceOwned,
    NoResourceConstraint,
    UnknownRole,
    GlobalFlagMisconfigured,
    NotGranted,
    ResourceNotOwned,
    StoreFault,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Superuser => "superuser",
            DecisionReason::ModuleGrant => "module_grant",
            DecisionReason::InheritedGrant { .. } => "inherited_grant",
            DecisionReason::ResourceOwned => "resource_owned",
            DecisionReason::NoResourceConstraint => "no_resource_constraint",
            DecisionReason::UnknownRole => "unknown_role",
            DecisionReason::GlobalFlagMisconfigured => "global_flag_misconfigured",
            DecisionReason::NotGranted => "not_granted",
            DecisionReason::ResourceNotOwned => "resource_not_owned",
            DecisionReason::StoreFault => "store_fault",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub granted: bool,
    pub reason: DecisionReason,
}

impl AuthorizationDecision {
    pub fn granted(reason: DecisionReason) -> Self {
        Self {
            granted: true,
            reason,
        }
    }

    pub fn denied(reason: DecisionReason) -> Self {
        Self {
            granted: false,
            reason,
        }
    }
}

/// Internal failure on the decision path. Never crosses the public API.
#[derive(Debug)]
enum Fault {
    Configuration(RoleId),
    Store(StoreError),
}

impl Fault {
    fn reason(&self) -> DecisionReason {
        match self {
            Fault::Configuration(_) => DecisionReason::GlobalFlagMisconfigured,
            Fault::Store(_) => DecisionReason::StoreFault,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Fault::Configuration(_) => "configuration",
            Fault::Store(_) => "store",
        }
    }
}

enum ModuleAccess {
    Granted { via: Option<RoleId> },
    Denied(DecisionReason),
}

fn module_access(
    registry: &PermissionRegistry,
    role: &RoleId,
    module: &Module,
    action: Action,
) -> Result<ModuleAccess, Fault> {
    let Some(definition) = registry.get(role) else {
        return Ok(ModuleAccess::Denied(DecisionReason::UnknownRole));
    };
    if definition.global {
        return Err(Fault::Configuration(role.clone()));
    }
    if definition.allows(module, action) {
        return Ok(ModuleAccess::Granted { via: None });
    }

    let mut walk = InheritanceWalk::new(registry, module, action, role);
    for parent in &definition.inherits {
        if walk.grants(parent) {
            return Ok(ModuleAccess::Granted {
                via: Some(parent.clone()),
            });
        }
    }
    // A misconfigured ancestor is why the grant may be missing; say so.
    let reason = if walk.misconfigured {
        DecisionReason::GlobalFlagMisconfigured
    } else {
        DecisionReason::NotGranted
    };
    Ok(ModuleAccess::Denied(reason))
}

/// Depth-first walk over inherited roles, each visited at most once.
struct InheritanceWalk<'a> {
    registry: &'a PermissionRegistry,
    module: &'a Module,
    action: Action,
    visited: HashSet<RoleId>,
    misconfigured: bool,
}

impl<'a> InheritanceWalk<'a> {
    fn new(
        registry: &'a PermissionRegistry,
        module: &'a Module,
        action: Action,
        start: &RoleId,
    ) -> Self {
        Self {
            registry,
            module,
            action,
            visited: HashSet::from([start.clone()]),
            misconfigured: false,
        }
    }

    fn grants(&mut self, role: &RoleId) -> bool {
        if role.is_superuser() {
            return true;
        }
        if !self.visited.insert(role.clone()) {
            tracing::debug!(%role, "inheritance revisits role; skipping");
            return false;
        }
        let registry = self.registry;
        let Some(definition) = registry.get(role) else {
            return false;
        };
        if definition.global {
            self.misconfigured = true;
            metrics::counter!("tenantgate_authz_faults_total", "kind" => "configuration")
                .increment(1);
            tracing::warn!(%role, "inherited role carries the global flag; ignoring it");
            return false;
        }
        if definition.allows(self.module, self.action) {
            return true;
        }
        definition.inherits.iter().any(|parent| self.grants(parent))
    }
}

/// Multi-tenant RBAC engine.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct AuthorizationEngine {
    registry: ArcSwap<PermissionRegistry>,
    store: Arc<dyn TenancyStore>,
    resolver: ResourceResolver,
    membership: TenantMembershipValidator,
    audit: Arc<dyn AuditSink>,
}

impl AuthorizationEngine {
    /// Build an engine with the standard resource checkers over `store`, the
    /// default user-manager roles, and a tracing audit sink.
    pub fn new(registry: PermissionRegistry, store: Arc<dyn TenancyStore>) -> Self {
        let resolver =
            ResourceResolver::standard(store.clone(), ResourceResolver::default_user_managers());
        Self {
            registry: ArcSwap::from_pointee(registry),
            membership: TenantMembershipValidator::new(store.clone()),
            store,
            resolver,
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Replace the roles allowed to act on other users' records.
    pub fn with_user_managers(mut self, roles: Vec<RoleId>) -> Self {
        self.resolver.register(
            Module::Users,
            Arc::new(UserRecordChecker::new(self.store.clone(), roles)),
        );
        self
    }

    /// Add or replace the ownership checker for a module.
    pub fn with_checker(
        mut self,
        module: Module,
        checker: Arc<dyn ResourceOwnershipChecker>,
    ) -> Self {
        self.resolver.register(module, checker);
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Current registry snapshot.
    pub fn registry(&self) -> Arc<PermissionRegistry> {
        self.registry.load_full()
    }

    /// Swap in a new registry. Checks already running finish on the old one.
    pub fn reload_registry(&self, registry: PermissionRegistry) {
        let faults = registry.configuration_faults().len();
        tracing::info!(
            roles = registry.len(),
            version = ?registry.version(),
            faults,
            "permission registry reloaded"
        );
        self.registry.store(Arc::new(registry));
    }

    pub fn effective_permissions(&self, role: &RoleId) -> BTreeMap<Module, BTreeSet<Action>> {
        self.registry.load().effective_permissions(role)
    }

    pub async fn has_permission(&self, ctx: &ActorContext, request: &PermissionRequest) -> bool {
        self.decide(ctx, request).await.granted
    }

    /// True iff every request is granted; stops at the first denial.
    pub async fn has_all_permissions(
        &self,
        ctx: &ActorContext,
        requests: &[PermissionRequest],
    ) -> bool {
        for request in requests {
            if !self.has_permission(ctx, request).await {
                return false;
            }
        }
        true
    }

    /// True on the first granted request; false when all are denied.
    pub async fn has_any_permission(
        &self,
        ctx: &ActorContext,
        requests: &[PermissionRequest],
    ) -> bool {
        for request in requests {
            if self.has_permission(ctx, request).await {
                return true;
            }
        }
        false
    }

    /// Guard bound to one request, checked later against any actor.
    pub fn require_permission(&self, request: PermissionRequest) -> PermissionGuard<'_> {
        PermissionGuard::new(self, request)
    }

    pub async fn require(
        &self,
        ctx: &ActorContext,
        request: &PermissionRequest,
    ) -> Result<(), AuthorizationError> {
        if self.has_permission(ctx, request).await {
            Ok(())
        } else {
            Err(AuthorizationError::new(request.module.clone(), request.action))
        }
    }

    pub async fn validate_tenant_access(&self, user_id: &UserId, tenant_id: TenantId) -> bool {
        self.membership
            .validate_tenant_access(user_id, tenant_id)
            .await
    }

    /// Full decision with its reason. Also writes the audit record.
    pub async fn decide(
        &self,
        ctx: &ActorContext,
        request: &PermissionRequest,
    ) -> AuthorizationDecision {
        let decision = match self.evaluate(ctx, request).await {
            Ok(decision) => decision,
            Err(fault) => {
                metrics::counter!("tenantgate_authz_faults_total", "kind" => fault.kind())
                    .increment(1);
                match &fault {
                    Fault::Configuration(role) => tracing::warn!(
                        %role,
                        "role carries the global flag but is not the superuser role; denying"
                    ),
                    Fault::Store(err) => tracing::warn!(
                        error = %err,
                        module = %request.module,
                        tenant_id = ctx.tenant_id.get(),
                        "resource lookup failed; denying"
                    ),
                }
                AuthorizationDecision::denied(fault.reason())
            }
        };

        let outcome = if decision.granted { "granted" } else { "denied" };
        metrics::counter!("tenantgate_authz_decisions_total", "outcome" => outcome).increment(1);
        tracing::debug!(
            user_id = %ctx.user_id,
            tenant_id = ctx.tenant_id.get(),
            role = %ctx.role,
            request = %request,
            outcome,
            reason = decision.reason.as_str(),
            "authorization decision"
        );

        let record = AuditRecord::new(ctx, request, &decision);
        if let Err(err) = self.audit.record(record).await {
            tracing::warn!(error = %err, "audit record not delivered");
        }
        decision
    }

    async fn evaluate(
        &self,
        ctx: &ActorContext,
        request: &PermissionRequest,
    ) -> Result<AuthorizationDecision, Fault> {
        if ctx.role.is_superuser() {
            return Ok(AuthorizationDecision::granted(DecisionReason::Superuser));
        }

        let access = {
            let registry = self.registry.load();
            module_access(&registry, &ctx.role, &request.module, request.action)?
        };
        let via = match access {
            ModuleAccess::Granted { via } => via,
            ModuleAccess::Denied(reason) => return Ok(AuthorizationDecision::denied(reason)),
        };

        let Some(resource_id) = &request.resource_id else {
            let reason = match via {
                Some(role) => DecisionReason::InheritedGrant { via: role },
                None => DecisionReason::ModuleGrant,
            };
            return Ok(AuthorizationDecision::granted(reason));
        };

        let verdict = self
            .resolver
            .resolve(ctx, &request.module, resource_id)
            .await
            .map_err(Fault::Store)?;
        Ok(match verdict {
            ResourceVerdict::Owned => AuthorizationDecision::granted(DecisionReason::ResourceOwned),
            ResourceVerdict::Unconstrained => {
                AuthorizationDecision::granted(DecisionReason::NoResourceConstraint)
            }
            ResourceVerdict::NotOwned => {
                AuthorizationDecision::denied(DecisionReason::ResourceNotOwned)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditError, MemoryAuditSink};
    use crate::registry::RoleDefinition;
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;

    fn staff_registry() -> PermissionRegistry {
        PermissionRegistry::default()
            .with_role(
                RoleId::Staff,
                RoleDefinition::new()
                    .allow(Module::Clients, [Action::View, Action::Create, Action::Edit])
                    .inherit(RoleId::Viewer),
            )
            .with_role(
                RoleId::Viewer,
                RoleDefinition::new().allow(Module::Reports, [Action::View]),
            )
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _record: AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::Closed)
        }
    }

    #[tokio::test]
    async fn superuser_skips_registry_entirely() {
        let store = Arc::new(InMemoryStore::new());
        let engine = AuthorizationEngine::new(PermissionRegistry::default(), store.clone());
        let ctx = ActorContext::new("root", 1, RoleId::SuperAdmin);
        let request = PermissionRequest::new(Module::Custom("anything".into()), Action::Delete)
            .on("missing");
        let decision = engine.decide(&ctx, &request).await;
        assert_eq!(decision, AuthorizationDecision::granted(DecisionReason::Superuser));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn module_denial_never_queries_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let engine = AuthorizationEngine::new(staff_registry(), store.clone());
        let ctx = ActorContext::new("u1", 7, RoleId::Staff);
        let request = PermissionRequest::new(Module::Clients, Action::Delete).on(10);
        assert!(!engine.has_permission(&ctx, &request).await);
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn inherited_grants_report_the_parent() {
        let engine = AuthorizationEngine::new(staff_registry(), Arc::new(InMemoryStore::new()));
        let ctx = ActorContext::new("u1", 7, RoleId::Staff);
        let decision = engine
            .decide(&ctx, &PermissionRequest::new(Module::Reports, Action::View))
            .await;
        assert_eq!(
            decision,
            AuthorizationDecision::granted(DecisionReason::InheritedGrant {
                via: RoleId::Viewer
            })
        );
    }

    #[tokio::test]
    async fn inheritance_cycles_terminate_and_deny() {
        let registry = PermissionRegistry::default()
            .with_role(
                RoleId::Staff,
                RoleDefinition::new()
                    .allow(Module::Clients, [Action::View])
                    .inherit(RoleId::Viewer),
            )
            .with_role(
                RoleId::Viewer,
                RoleDefinition::new().inherit(RoleId::Staff),
            );
        let engine = AuthorizationEngine::new(registry, Arc::new(InMemoryStore::new()));
        let ctx = ActorContext::new("u1", 7, RoleId::Viewer);
        assert!(
            engine
                .has_permission(&ctx, &PermissionRequest::new(Module::Clients, Action::View))
                .await
        );
        assert!(
            !engine
                .has_permission(&ctx, &PermissionRequest::new(Module::Clients, Action::Delete))
                .await
        );
    }

    #[tokio::test]
    async fn inherited_global_flag_grants_nothing() {
        let registry = PermissionRegistry::default()
            .with_role(RoleId::Staff, RoleDefinition::new().inherit(RoleId::Manager))
            .with_role(
                RoleId::Manager,
                RoleDefinition::global().allow(Module::Any, [Action::Any]),
            );
        let engine = AuthorizationEngine::new(registry, Arc::new(InMemoryStore::new()));
        let ctx = ActorContext::new("u1", 7, RoleId::Staff);
        let decision = engine
            .decide(&ctx, &PermissionRequest::new(Module::Clients, Action::View))
            .await;
        assert_eq!(
            decision,
            AuthorizationDecision::denied(DecisionReason::GlobalFlagMisconfigured)
        );
    }

    #[tokio::test]
    async fn healthy_sibling_still_grants_past_misconfigured_parent() {
        let registry = PermissionRegistry::default()
            .with_role(
                RoleId::Staff,
                RoleDefinition::new()
                    .inherit(RoleId::Manager)
                    .inherit(RoleId::Viewer),
            )
            .with_role(RoleId::Manager, RoleDefinition::global())
            .with_role(
                RoleId::Viewer,
                RoleDefinition::new().allow(Module::Reports, [Action::View]),
            );
        let engine = AuthorizationEngine::new(registry, Arc::new(InMemoryStore::new()));
        let ctx = ActorContext::new("u1", 7, RoleId::Staff);
        let decision = engine
            .decide(&ctx, &PermissionRequest::new(Module::Reports, Action::View))
            .await;
        assert_eq!(
            decision,
            AuthorizationDecision::granted(DecisionReason::InheritedGrant {
                via: RoleId::Viewer
            })
        );
    }

    #[tokio::test]
    async fn store_fault_is_reported_as_reason() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unavailable(true);
        let sink = Arc::new(MemoryAuditSink::new());
        let engine =
            AuthorizationEngine::new(staff_registry(), store).with_audit_sink(sink.clone());
        let ctx = ActorContext::new("u1", 7, RoleId::Staff);
        let decision = engine
            .decide(&ctx, &PermissionRequest::new(Module::Clients, Action::Edit).on(10))
            .await;
        assert_eq!(decision, AuthorizationDecision::denied(DecisionReason::StoreFault));
        assert_eq!(sink.records()[0].reason, DecisionReason::StoreFault);
    }

    #[tokio::test]
    async fn audit_failure_does_not_change_the_decision() {
        let engine = AuthorizationEngine::new(staff_registry(), Arc::new(InMemoryStore::new()))
            .with_audit_sink(Arc::new(FailingSink));
        let ctx = ActorContext::new("u1", 7, RoleId::Staff);
        assert!(
            engine
                .has_permission(&ctx, &PermissionRequest::new(Module::Clients, Action::View))
                .await
        );
    }

    #[tokio::test]
    async fn reload_applies_to_later_checks() {
        let engine = AuthorizationEngine::new(staff_registry(), Arc::new(InMemoryStore::new()));
        let ctx = ActorContext::new("u1", 7, RoleId::Staff);
        let delete = PermissionRequest::new(Module::Clients, Action::Delete);
        assert!(!engine.has_permission(&ctx, &delete).await);

        engine.reload_registry(PermissionRegistry::default().with_role(
            RoleId::Staff,
            RoleDefinition::new().allow(Module::Clients, [Action::Any]),
        ));
        assert!(engine.has_permission(&ctx, &delete).await);
        assert_eq!(engine.registry().len(), 1);
    }

    #[tokio::test]
    async fn custom_checker_replaces_the_default() {
        struct DenyAll;

        #[async_trait]
        impl ResourceOwnershipChecker for DenyAll {
            async fn check(
                &self,
                _ctx: &ActorContext,
                _resource_id: &crate::ResourceId,
            ) -> crate::store::StoreResult<bool> {
                Ok(false)
            }
        }

        let registry = PermissionRegistry::default().with_role(
            RoleId::Staff,
            RoleDefinition::new().allow(Module::Reports, [Action::Export]),
        );
        let engine = AuthorizationEngine::new(registry, Arc::new(InMemoryStore::new()));
        let ctx = ActorContext::new("u1", 7, RoleId::Staff);
        let export = PermissionRequest::new(Module::Reports, Action::Export).on(3);
        assert_eq!(
            engine.decide(&ctx, &export).await.reason,
            DecisionReason::NoResourceConstraint
        );

        let engine = engine.with_checker(Module::Reports, Arc::new(DenyAll));
        assert_eq!(
            engine.decide(&ctx, &export).await.reason,
            DecisionReason::ResourceNotOwned
        );
    }
}
