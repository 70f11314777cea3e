//! # Purpose
//! Demonstrate tenant isolation decisions from the authorization engine.
//!
//! # What this demo proves
//! - Staff in tenant 7 can edit tenant 7 clients but not tenant 9 clients.
//! - Tenant admins manage users in their own tenant only.
//! - Module-level denials happen before any store lookup.
//! - A store outage denies instead of granting.
//!
//! # Flow summary
//! 1. Load configuration from the environment (`TENANTGATE_*`).
//! 2. Seed an in-memory store with tenants 7 and 9.
//! 3. Build the engine with a buffered audit sink.
//! 4. Run each scenario and compare against the expected outcome.
//!
//! # Notes
//! - Prints a summary and exits non-zero on any unexpected decision.
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tenantgate_authz::config::AuthzConfig;
use tenantgate_authz::observability::init_tracing;
use tenantgate_authz::store::memory::InMemoryStore;
use tenantgate_authz::{
    Action, ActorContext, AuthorizationEngine, BufferedAuditSink, Module, PermissionRequest,
    RoleId, TenantId, TracingAuditSink, UserId,
};

const TENANT_A: i64 = 7;
const TENANT_B: i64 = 9;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("tenant-isolation-demo");
    let mut report = DemoReport::new();
    let result = run_demo(&mut report).await;
    report.print_summary();
    result
}

async fn run_demo(report: &mut DemoReport) -> Result<()> {
    println!("== tenantgate demo: tenant isolation ==");
    let config = AuthzConfig::from_env_or_yaml().context("load authz config")?;
    let registry = config.load_registry()?;
    tracing::info!(roles = registry.len(), "registry ready");

    let store = seed_store().await;
    let (audit, audit_worker) =
        BufferedAuditSink::spawn(Arc::new(TracingAuditSink), config.audit_buffer);
    let engine = AuthorizationEngine::new(registry, store.clone())
        .with_user_managers(config.user_manager_roles.clone())
        .with_audit_sink(Arc::new(audit));

    let staff = ActorContext::new("ana", TENANT_A, RoleId::Staff);
    let admin = ActorContext::new("admin7", TENANT_A, RoleId::TenantAdmin);
    let root = ActorContext::new("root", 1, RoleId::SuperAdmin);

    let scenarios = [
        (
            "staff edits own-tenant client",
            &staff,
            PermissionRequest::new(Module::Clients, Action::Edit).on(10),
            true,
        ),
        (
            "staff edits foreign client",
            &staff,
            PermissionRequest::new(Module::Clients, Action::Edit).on(20),
            false,
        ),
        (
            "staff deletes own-tenant client",
            &staff,
            PermissionRequest::new(Module::Clients, Action::Delete).on(10),
            false,
        ),
        (
            "admin edits own-tenant user",
            &admin,
            PermissionRequest::new(Module::Users, Action::Edit).on("u2"),
            true,
        ),
        (
            "admin edits foreign user",
            &admin,
            PermissionRequest::new(Module::Users, Action::Edit).on("u9"),
            false,
        ),
        (
            "superuser reads foreign filing",
            &root,
            PermissionRequest::new(Module::Filings, Action::View).on(200),
            true,
        ),
    ];
    for (label, actor, request, expected) in &scenarios {
        let decision = engine.decide(actor, request).await;
        report.check(label, decision.granted, *expected, decision.reason.as_str())?;
    }

    let before = store.query_count();
    let denied = engine
        .has_permission(
            &staff,
            &PermissionRequest::new(Module::Settings, Action::Manage).on("cfg"),
        )
        .await;
    report.check("module denial skips store", denied, false, "not_granted")?;
    if store.query_count() != before {
        bail!("module-level denial queried the store");
    }

    let member = engine
        .validate_tenant_access(&UserId::new("ana"), TenantId::new(TENANT_B))
        .await;
    report.check("staff outside tenant 9", member, false, "not_member")?;

    store.set_unavailable(true);
    let decision = engine
        .decide(
            &staff,
            &PermissionRequest::new(Module::Clients, Action::View).on(10),
        )
        .await;
    report.check(
        "store outage denies",
        decision.granted,
        false,
        decision.reason.as_str(),
    )?;

    drop(engine);
    audit_worker.await.context("audit worker")?;
    Ok(())
}

async fn seed_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.add_user("root", 1, RoleId::SuperAdmin).await;
    store.add_user("admin7", TENANT_A, RoleId::TenantAdmin).await;
    store.add_user("ana", TENANT_A, RoleId::Staff).await;
    store.add_user("u2", TENANT_A, RoleId::Viewer).await;
    store.add_user("u9", TENANT_B, RoleId::Viewer).await;
    store.add_client(10, TENANT_A).await;
    store.add_client(20, TENANT_B).await;
    store.add_filing(200, TENANT_B).await;
    store
}

struct DemoStep {
    label: String,
    status: String,
}

struct DemoReport {
    steps: Vec<DemoStep>,
}

impl DemoReport {
    fn new() -> Self {
        Self { steps: Vec::new() }
    }

    fn check(&mut self, label: &str, granted: bool, expected: bool, reason: &str) -> Result<()> {
        let status = match (granted, expected) {
            (true, true) => format!("PASS (granted: {reason})"),
            (false, false) => format!("PASS (denied: {reason})"),
            (true, false) => format!("FAIL (expected denied, got {reason})"),
            (false, true) => format!("FAIL (expected granted, got {reason})"),
        };
        println!("{label}: {status}");
        self.steps.push(DemoStep {
            label: label.to_string(),
            status,
        });
        if granted != expected {
            bail!("{label} failed");
        }
        Ok(())
    }

    fn print_summary(&self) {
        println!("\nSummary");
        for step in &self.steps {
            println!("- {}: {}", step.label, step.status);
        }
    }
}
