//! Actor and request values evaluated by the engine.
//!
//! # Purpose
//! Captures who is asking (`ActorContext`) and what they ask for
//! (`PermissionRequest`).
//!
//! # Key invariants
//! - An `ActorContext` is produced upstream from an authenticated session and
//!   is trusted as-is.
//! - A request without a resource id is a module-wide check; with one it is an
//!   instance check.
//!
//! # Examples
//! ```rust
//! use tenantgate_authz::{Action, Module, PermissionRequest};
//!
//! let generic = PermissionRequest::new(Module::Clients, Action::View);
//! let instance = PermissionRequest::new(Module::Clients, Action::Edit).on(42);
//! assert!(generic.resource_id.is_none());
//! assert_eq!(instance.to_string(), "clients.edit#42");
//! ```
use crate::{Action, Module, ResourceId, RoleId, TenantId, UserId};
use serde::{Deserialize, Serialize};

/// Identity of the authenticated caller for one authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: RoleId,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>, tenant_id: i64, role: impl Into<RoleId>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            tenant_id: TenantId::new(tenant_id),
            role: role.into(),
        }
    }
}

/// Requested action on a module, optionally narrowed to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub module: Module,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,
}

impl PermissionRequest {
    pub fn new(module: Module, action: Action) -> Self {
        Self {
            module,
            action,
            resource_id: None,
        }
    }

    /// Narrow the request to a single resource instance.
    pub fn on(mut self, resource_id: impl Into<ResourceId>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }
}

impl std::fmt::Display for PermissionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.action)?;
        if let Some(resource_id) = &self.resource_id {
            write!(f, "#{resource_id}")?;
        }
        Ok(())
    }
}
