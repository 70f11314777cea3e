use std::fs;
use tenantgate_authz::{
    Action, AuthzError, ConfigurationFault, Module, PermissionRegistry, RoleId,
};

const CUSTOM: &str = r#"
version: 7
roles:
  Super Admin:
    global: true
  Auditor:
    modules:
      audit_logs: [view, export]
      reports: [view]
  Intern:
    inherits: [Auditor]
    modules:
      forms: [view]
"#;

#[test]
fn loads_custom_roles_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("roles.yaml");
    fs::write(&path, CUSTOM).expect("write");

    let registry = PermissionRegistry::from_path(&path).expect("registry");
    assert_eq!(registry.version(), Some(7));
    assert_eq!(registry.len(), 3);

    let intern = RoleId::from("Intern");
    assert_eq!(intern, RoleId::Custom("Intern".to_string()));
    let perms = registry.effective_permissions(&intern);
    assert!(perms[&Module::AuditLogs].contains(&Action::Export));
    assert!(perms[&Module::Forms].contains(&Action::View));
    assert!(registry.configuration_faults().is_empty());
}

#[test]
fn json_documents_are_accepted() {
    let json = r#"{"roles": {"Viewer": {"modules": {"reports": ["view"], "*": ["view"]}}}}"#;
    let registry = PermissionRegistry::from_yaml_str(json).expect("json registry");
    let viewer = registry.get(&RoleId::Viewer).expect("viewer");
    assert!(viewer.allows(&Module::Reports, Action::View));
    assert!(viewer.allows(&Module::Settings, Action::Delete));
}

#[test]
fn unknown_actions_are_rejected() {
    let err = PermissionRegistry::from_yaml_str("roles:\n  Viewer:\n    modules:\n      reports: [peek]\n")
        .expect_err("unknown action");
    assert!(matches!(err, AuthzError::RegistryFormat(_)));
}

#[test]
fn empty_registry_is_rejected() {
    let err = PermissionRegistry::from_yaml_str("roles: {}\n").expect_err("no roles");
    assert!(matches!(err, AuthzError::InvalidRegistry(_)));
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = PermissionRegistry::from_path(&dir.path().join("absent.yaml")).expect_err("missing");
    assert!(matches!(err, AuthzError::RegistryIo { .. }));
}

#[test]
fn faults_are_reported_without_rejecting_the_file() {
    let yaml = r#"
roles:
  Manager:
    global: true
  Staff:
    inherits: [Viewer, Contractor]
  Viewer:
    inherits: [Staff]
"#;
    let registry = PermissionRegistry::from_yaml_str(yaml).expect("loads");
    let faults = registry.configuration_faults();
    assert!(faults.contains(&ConfigurationFault::GlobalFlagOnRole(RoleId::Manager)));
    assert!(faults.iter().any(|fault| matches!(
        fault,
        ConfigurationFault::UndefinedParent { parent, .. } if parent == &RoleId::from("Contractor")
    )));
    assert!(faults.iter().any(|fault| fault.kind() == "inheritance_cycle"));
}

#[test]
fn builtin_matrix_covers_product_roles() {
    let registry = PermissionRegistry::builtin().expect("builtin");
    for role in [
        RoleId::SuperAdmin,
        RoleId::TenantAdmin,
        RoleId::Manager,
        RoleId::Staff,
        RoleId::Viewer,
    ] {
        assert!(registry.get(&role).is_some(), "{role}");
    }
    assert!(registry.configuration_faults().is_empty());
}
