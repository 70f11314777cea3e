//! Multi-tenant RBAC authorization engine.
//!
//! # Purpose
//! Decides whether an actor, acting inside one tenant, may perform an action
//! on a module and optionally on a specific resource. Decisions are plain
//! booleans; every failure on the way denies.
//!
//! # How it fits
//! Request handlers build an [`ActorContext`] from the authenticated session
//! and ask the [`AuthorizationEngine`]. The engine consults the static
//! [`PermissionRegistry`] first and only then, for instance-level requests,
//! the [`ResourceResolver`] backed by a [`store::TenancyStore`].
//!
//! # Key invariants
//! - Fail secure: unknown roles, misconfigured roles, missing resources and
//!   store errors all deny.
//! - Tenant isolation: every resource lookup is filtered by the actor's
//!   tenant. Only `Super Admin` crosses tenants.
//! - Module access is checked before any store query.
//!
//! # Important configuration
//! - `TENANTGATE_REGISTRY_PATH`, `TENANTGATE_USER_MANAGER_ROLES`,
//!   `TENANTGATE_AUDIT_BUFFER`, `TENANTGATE_CONFIG`; see [`config::AuthzConfig`].
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use tenantgate_authz::store::memory::InMemoryStore;
//! use tenantgate_authz::{
//!     Action, ActorContext, AuthorizationEngine, Module, PermissionRegistry, PermissionRequest,
//!     RoleId,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::new());
//! store.add_client(42, 7).await;
//! let engine = AuthorizationEngine::new(PermissionRegistry::builtin().unwrap(), store);
//!
//! let staff = ActorContext::new("ana", 7, RoleId::Staff);
//! let edit = PermissionRequest::new(Module::Clients, Action::Edit).on(42);
//! assert!(engine.has_permission(&staff, &edit).await);
//!
//! let outsider = ActorContext::new("bo", 9, RoleId::Staff);
//! assert!(!engine.has_permission(&outsider, &edit).await);
//! # }
//! ```
//!
//! # Common pitfalls
//! - Building an [`ActorContext`] from request input instead of the verified
//!   session lets callers pick their own tenant.
//! - `"*"` under `modules` grants every action on every module.

mod action;
pub mod audit;
pub mod config;
mod engine;
mod errors;
mod guard;
mod membership;
pub mod observability;
mod registry;
mod request;
mod resolver;
pub mod store;
mod types;

pub use action::Action;
pub use audit::{AuditError, AuditRecord, AuditSink, BufferedAuditSink, MemoryAuditSink, TracingAuditSink};
pub use config::AuthzConfig;
pub use engine::{AuthorizationDecision, AuthorizationEngine, DecisionReason};
pub use errors::{AuthzError, AuthzResult};
pub use guard::{AuthorizationError, PermissionGuard};
pub use membership::TenantMembershipValidator;
pub use registry::{ConfigurationFault, PermissionRegistry, RoleDefinition};
pub use request::{ActorContext, PermissionRequest};
pub use resolver::{
    ResourceOwnershipChecker, ResourceResolver, ResourceVerdict, TenantScopedChecker,
    TenantScopedKind, UserRecordChecker,
};
pub use types::{Module, ResourceId, RoleId, TenantId, UserId};
