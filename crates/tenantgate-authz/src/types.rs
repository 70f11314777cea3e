//! Strongly typed identifiers for tenants, users, roles, and modules.
//!
//! # Purpose
//! Wraps the raw identifiers handed over by the session layer so tenant ids,
//! user ids, and resource ids cannot be swapped by accident.
//!
//! # How it fits
//! These types flow through the registry, the engine, the resource checkers,
//! and the audit records.
//!
//! # Key invariants
//! - `RoleId::SuperAdmin` is the single designated superuser role.
//! - `Module::Any` is the `"*"` wildcard; every other unknown module name is
//!   preserved as `Module::Custom`.
//!
//! # Examples
//! ```rust
//! use tenantgate_authz::{Module, RoleId};
//!
//! assert_eq!(RoleId::from("Tenant Admin"), RoleId::TenantAdmin);
//! assert_eq!(Module::from("*"), Module::Any);
//! assert_eq!(Module::from("invoices").as_str(), "invoices");
//! ```
//!
//! # Common pitfalls
//! - Role names are case sensitive; `"tenant admin"` is a custom role.
use serde::{Deserialize, Serialize};

/// Tenant identifier wrapper.
///
/// # Example
/// ```rust
/// use tenantgate_authz::TenantId;
///
/// let tenant = TenantId::new(7);
/// assert_eq!(tenant.get(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one resource instance.
///
/// Upstream tables mix integer and string keys, so both are accepted; the
/// canonical form used for store lookups is the `Display` rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl ResourceId {
    /// True when this resource id names the given user.
    pub fn is_user(&self, user_id: &UserId) -> bool {
        match self {
            ResourceId::Text(value) => value == user_id.as_str(),
            ResourceId::Number(value) => value.to_string() == user_id.as_str(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceId::Number(value) => write!(f, "{value}"),
            ResourceId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(value: i64) -> Self {
        ResourceId::Number(value)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        ResourceId::Text(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        ResourceId::Text(value)
    }
}

impl From<&UserId> for ResourceId {
    fn from(value: &UserId) -> Self {
        ResourceId::Text(value.as_str().to_string())
    }
}

/// Named bundle of capabilities assigned to an actor.
///
/// The built-in product roles are enumerated; deployments may define more,
/// which surface as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleId {
    SuperAdmin,
    TenantAdmin,
    Manager,
    Staff,
    Viewer,
    Custom(String),
}

impl RoleId {
    pub fn as_str(&self) -> &str {
        match self {
            RoleId::SuperAdmin => "Super Admin",
            RoleId::TenantAdmin => "Tenant Admin",
            RoleId::Manager => "Manager",
            RoleId::Staff => "Staff",
            RoleId::Viewer => "Viewer",
            RoleId::Custom(name) => name,
        }
    }

    /// Whether this is the designated superuser role.
    pub fn is_superuser(&self) -> bool {
        matches!(self, RoleId::SuperAdmin)
    }
}

impl From<&str> for RoleId {
    fn from(value: &str) -> Self {
        match value {
            "Super Admin" => RoleId::SuperAdmin,
            "Tenant Admin" => RoleId::TenantAdmin,
            "Manager" => RoleId::Manager,
            "Staff" => RoleId::Staff,
            "Viewer" => RoleId::Viewer,
            other => RoleId::Custom(other.to_string()),
        }
    }
}

impl From<String> for RoleId {
    fn from(value: String) -> Self {
        match RoleId::from(value.as_str()) {
            RoleId::Custom(_) => RoleId::Custom(value),
            known => known,
        }
    }
}

impl From<RoleId> for String {
    fn from(value: RoleId) -> Self {
        match value {
            RoleId::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Functional area over which actions are granted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Module {
    Dashboard,
    Clients,
    Documents,
    Filings,
    Reports,
    Forms,
    Users,
    Settings,
    AuditLogs,
    /// The `"*"` wildcard.
    Any,
    Custom(String),
}

impl Module {
    pub fn as_str(&self) -> &str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Clients => "clients",
            Module::Documents => "documents",
            Module::Filings => "filings",
            Module::Reports => "reports",
            Module::Forms => "forms",
            Module::Users => "users",
            Module::Settings => "settings",
            Module::AuditLogs => "audit_logs",
            Module::Any => "*",
            Module::Custom(name) => name,
        }
    }
}

impl From<&str> for Module {
    fn from(value: &str) -> Self {
        match value {
            "dashboard" => Module::Dashboard,
            "clients" => Module::Clients,
            "documents" => Module::Documents,
            "filings" => Module::Filings,
            "reports" => Module::Reports,
            "forms" => Module::Forms,
            "users" => Module::Users,
            "settings" => Module::Settings,
            "audit_logs" => Module::AuditLogs,
            "*" => Module::Any,
            other => Module::Custom(other.to_string()),
        }
    }
}

impl From<String> for Module {
    fn from(value: String) -> Self {
        match Module::from(value.as_str()) {
            Module::Custom(_) => Module::Custom(value),
            known => known,
        }
    }
}

impl From<Module> for String {
    fn from(value: Module) -> Self {
        match value {
            Module::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
