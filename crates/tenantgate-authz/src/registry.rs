//! Permission registry: the static role -> module -> action matrix.
//!
//! # Purpose
//! Holds every role definition the engine evaluates against. Built once at
//! startup (from YAML, JSON, or code) and never mutated afterwards.
//!
//! # How it fits
//! The engine reads the registry on every check; the resource resolver and
//! the membership validator never touch it.
//!
//! # Key invariants
//! - `global: true` is only meaningful on `Super Admin`. Any other role with
//!   the flag is a configuration fault and grants nothing.
//! - Inheritance may be cyclic in a bad file; evaluation tracks visited roles
//!   so a cycle only costs a denial.
//!
//! # Important configuration
//! - The built-in matrix is embedded from `builtin_registry.yaml`.
//!
//! # Examples
//! ```rust
//! use tenantgate_authz::{Action, Module, PermissionRegistry, RoleDefinition, RoleId};
//!
//! let registry = PermissionRegistry::default().with_role(
//!     RoleId::Staff,
//!     RoleDefinition::new().allow(Module::Clients, [Action::View, Action::Edit]),
//! );
//! let staff = registry.get(&RoleId::Staff).expect("staff");
//! assert!(staff.allows(&Module::Clients, Action::Edit));
//! assert!(!staff.allows(&Module::Clients, Action::Delete));
//! ```
//!
//! # Common pitfalls
//! - Quoting: YAML needs `"*"` quoted inside flow sequences.
use crate::{Action, AuthzError, AuthzResult, Module, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

const BUILTIN_REGISTRY: &str = include_str!("builtin_registry.yaml");

/// Capabilities declared for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub modules: HashMap<Module, HashSet<Action>>,
    #[serde(default)]
    pub inherits: Vec<RoleId>,
}

impl RoleDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Self {
        Self {
            global: true,
            ..Self::default()
        }
    }

    pub fn allow(mut self, module: Module, actions: impl IntoIterator<Item = Action>) -> Self {
        self.modules.entry(module).or_default().extend(actions);
        self
    }

    pub fn inherit(mut self, role: RoleId) -> Self {
        self.inherits.push(role);
        self
    }

    /// Module-level match against this definition alone (no inheritance, no
    /// global flag).
    pub fn allows(&self, module: &Module, action: Action) -> bool {
        let granted = self
            .modules
            .get(module)
            .is_some_and(|actions| actions.contains(&action) || actions.contains(&Action::Any));
        if granted {
            return true;
        }
        // A "*" module key grants every action on every module.
        self.modules.contains_key(&Module::Any)
    }
}

/// Invariant violation found while inspecting a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationFault {
    #[error("role {0} carries the global flag but is not the superuser role")]
    GlobalFlagOnRole(RoleId),
    #[error("role {0} is part of an inheritance cycle")]
    InheritanceCycle(RoleId),
    #[error("role {role} inherits undefined role {parent}")]
    UndefinedParent { role: RoleId, parent: RoleId },
}

impl ConfigurationFault {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigurationFault::GlobalFlagOnRole(_) => "global_flag",
            ConfigurationFault::InheritanceCycle(_) => "inheritance_cycle",
            ConfigurationFault::UndefinedParent { .. } => "undefined_parent",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    version: Option<u32>,
    roles: HashMap<RoleId, RoleDefinition>,
}

/// Immutable role registry shared by all checks.
#[derive(Debug, Clone, Default)]
pub struct PermissionRegistry {
    version: Option<u32>,
    roles: HashMap<RoleId, RoleDefinition>,
}

impl PermissionRegistry {
    pub fn new(roles: HashMap<RoleId, RoleDefinition>) -> Self {
        Self {
            version: None,
            roles,
        }
    }

    pub fn with_role(mut self, role: RoleId, definition: RoleDefinition) -> Self {
        self.roles.insert(role, definition);
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// The role matrix embedded in the crate.
    pub fn builtin() -> AuthzResult<Self> {
        Self::from_yaml_str(BUILTIN_REGISTRY)
    }

    /// Parse a registry definition. JSON documents are accepted too.
    ///
    /// # Errors
    /// - [`AuthzError::RegistryFormat`] for malformed documents or unknown
    ///   action names.
    /// - [`AuthzError::InvalidRegistry`] when no roles are defined.
    pub fn from_yaml_str(contents: &str) -> AuthzResult<Self> {
        let document: RegistryDocument = serde_yaml::from_str(contents)?;
        if document.roles.is_empty() {
            return Err(AuthzError::InvalidRegistry(
                "registry defines no roles".to_string(),
            ));
        }
        let registry = Self {
            version: document.version,
            roles: document.roles,
        };
        registry.report_faults();
        Ok(registry)
    }

    pub fn from_path(path: &Path) -> AuthzResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| AuthzError::RegistryIo {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::from_yaml_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            roles = registry.len(),
            version = ?registry.version,
            "loaded permission registry"
        );
        Ok(registry)
    }

    pub fn get(&self, role: &RoleId) -> Option<&RoleDefinition> {
        self.roles.get(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = (&RoleId, &RoleDefinition)> {
        self.roles.iter()
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Inspect the registry for invariant violations without rejecting it.
    ///
    /// Faulty roles still load; the engine denies through them at check time.
    pub fn configuration_faults(&self) -> Vec<ConfigurationFault> {
        let mut faults = Vec::new();
        let mut names: Vec<&RoleId> = self.roles.keys().collect();
        names.sort();

        for role in &names {
            let definition = &self.roles[*role];
            if definition.global && !role.is_superuser() {
                faults.push(ConfigurationFault::GlobalFlagOnRole((*role).clone()));
            }
            for parent in &definition.inherits {
                if !parent.is_superuser() && !self.roles.contains_key(parent) {
                    faults.push(ConfigurationFault::UndefinedParent {
                        role: (*role).clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        for role in names {
            if self.reaches(role, role) {
                faults.push(ConfigurationFault::InheritanceCycle(role.clone()));
            }
        }
        faults
    }

    /// Flattened module -> actions view of a role, inheritance included.
    ///
    /// The superuser maps to `{"*": {"*"}}`; unknown and misconfigured roles
    /// map to an empty set.
    pub fn effective_permissions(&self, role: &RoleId) -> BTreeMap<Module, BTreeSet<Action>> {
        let mut out: BTreeMap<Module, BTreeSet<Action>> = BTreeMap::new();
        let mut visited = HashSet::new();
        self.collect_permissions(role, &mut visited, &mut out);
        out
    }

    fn collect_permissions(
        &self,
        role: &RoleId,
        visited: &mut HashSet<RoleId>,
        out: &mut BTreeMap<Module, BTreeSet<Action>>,
    ) {
        if role.is_superuser() {
            out.entry(Module::Any).or_default().insert(Action::Any);
            return;
        }
        if !visited.insert(role.clone()) {
            return;
        }
        let Some(definition) = self.roles.get(role) else {
            return;
        };
        if definition.global {
            return;
        }
        for (module, actions) in &definition.modules {
            let entry = out.entry(module.clone()).or_default();
            if *module == Module::Any {
                // Matches `allows`: a "*" module key grants every action.
                entry.insert(Action::Any);
            } else {
                entry.extend(actions.iter().copied());
            }
        }
        for parent in &definition.inherits {
            self.collect_permissions(parent, visited, out);
        }
    }

    fn reaches(&self, from: &RoleId, target: &RoleId) -> bool {
        let mut stack: Vec<&RoleId> = match self.roles.get(from) {
            Some(definition) => definition.inherits.iter().collect(),
            None => return false,
        };
        let mut seen: HashSet<&RoleId> = HashSet::new();
        while let Some(role) = stack.pop() {
            if role == target {
                return true;
            }
            if !seen.insert(role) {
                continue;
            }
            if let Some(definition) = self.roles.get(role) {
                stack.extend(definition.inherits.iter());
            }
        }
        false
    }

    fn report_faults(&self) {
        for fault in self.configuration_faults() {
            metrics::counter!("tenantgate_authz_config_faults_total", "kind" => fault.kind())
                .increment(1);
            tracing::warn!(%fault, "permission registry configuration fault");
        }
    }
}
