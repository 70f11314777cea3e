//! Engine configuration sourced from environment variables, with an optional
//! YAML override file.
use crate::registry::PermissionRegistry;
use crate::resolver::ResourceResolver;
use crate::RoleId;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const DEFAULT_AUDIT_BUFFER: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthzConfig {
    // Registry file; the built-in matrix is used when unset.
    pub registry_path: Option<PathBuf>,
    // Roles allowed to act on other users' records.
    pub user_manager_roles: Vec<RoleId>,
    // Capacity of the buffered audit channel.
    pub audit_buffer: usize,
}

#[derive(Debug, Deserialize)]
struct AuthzConfigOverride {
    registry_path: Option<PathBuf>,
    user_manager_roles: Option<Vec<String>>,
    audit_buffer: Option<usize>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            registry_path: None,
            user_manager_roles: ResourceResolver::default_user_managers(),
            audit_buffer: DEFAULT_AUDIT_BUFFER,
        }
    }
}

impl AuthzConfig {
    pub fn from_env() -> Result<Self> {
        let registry_path = std::env::var("TENANTGATE_REGISTRY_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let user_manager_roles = match std::env::var("TENANTGATE_USER_MANAGER_ROLES") {
            Ok(value) => parse_roles(&value),
            Err(_) => ResourceResolver::default_user_managers(),
        };
        let audit_buffer = match std::env::var("TENANTGATE_AUDIT_BUFFER") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .with_context(|| "parse TENANTGATE_AUDIT_BUFFER")?,
            Err(_) => DEFAULT_AUDIT_BUFFER,
        };
        if audit_buffer == 0 {
            anyhow::bail!("TENANTGATE_AUDIT_BUFFER must be greater than zero");
        }
        Ok(Self {
            registry_path,
            user_manager_roles,
            audit_buffer,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("TENANTGATE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read TENANTGATE_CONFIG: {path}"))?;
            let override_cfg: AuthzConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse authz config yaml")?;
            if let Some(value) = override_cfg.registry_path {
                config.registry_path = Some(value);
            }
            if let Some(value) = override_cfg.user_manager_roles {
                config.user_manager_roles = value.into_iter().map(RoleId::from).collect();
            }
            if let Some(value) = override_cfg.audit_buffer
                && value > 0
            {
                config.audit_buffer = value;
            }
        }
        Ok(config)
    }

    /// Registry from `registry_path`, or the built-in matrix.
    pub fn load_registry(&self) -> Result<PermissionRegistry> {
        match &self.registry_path {
            Some(path) => PermissionRegistry::from_path(path)
                .with_context(|| format!("load permission registry {}", path.display())),
            None => PermissionRegistry::builtin().with_context(|| "load builtin registry"),
        }
    }
}

fn parse_roles(value: &str) -> Vec<RoleId> {
    value
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(RoleId::from)
        .collect()
}
