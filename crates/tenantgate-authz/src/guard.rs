//! Guard entry points for handlers that want an error instead of a boolean.
use crate::engine::AuthorizationEngine;
use crate::{Action, ActorContext, Module, PermissionRequest};
use thiserror::Error;

/// Returned when a guarded check is denied.
///
/// Carries only the module and action. Resource ids, tenant ids, and the
/// denial reason stay in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission denied: {action} on {module}")]
pub struct AuthorizationError {
    pub module: Module,
    pub action: Action,
}

impl AuthorizationError {
    pub fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }
}

/// A permission requirement bound to an engine, checked per actor.
pub struct PermissionGuard<'a> {
    engine: &'a AuthorizationEngine,
    request: PermissionRequest,
}

impl<'a> PermissionGuard<'a> {
    pub(crate) fn new(engine: &'a AuthorizationEngine, request: PermissionRequest) -> Self {
        Self { engine, request }
    }

    pub fn request(&self) -> &PermissionRequest {
        &self.request
    }

    pub async fn check(&self, ctx: &ActorContext) -> Result<(), AuthorizationError> {
        self.engine.require(ctx, &self.request).await
    }
}
