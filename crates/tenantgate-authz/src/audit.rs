//! Audit trail of authorization decisions.
//!
//! # Purpose
//! Every decision, granted or denied, produces one [`AuditRecord`] that is
//! handed to an [`AuditSink`] for compliance logging.
//!
//! # Key invariants
//! - Audit delivery is advisory. A failing sink is logged and never changes
//!   the decision returned to the caller.
//! - [`BufferedAuditSink`] never blocks a check: a full buffer drops the record
//!   and bumps `tenantgate_audit_dropped_total`.
use crate::engine::{AuthorizationDecision, DecisionReason};
use crate::{ActorContext, Action, Module, PermissionRequest, ResourceId, RoleId, TenantId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Structured record of one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: RoleId,
    pub module: Module,
    pub action: Action,
    pub resource_id: Option<ResourceId>,
    pub granted: bool,
    pub reason: DecisionReason,
}

impl AuditRecord {
    pub fn new(
        ctx: &ActorContext,
        request: &PermissionRequest,
        decision: &AuthorizationDecision,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: ctx.user_id.clone(),
            tenant_id: ctx.tenant_id,
            role: ctx.role.clone(),
            module: request.module.clone(),
            action: request.action,
            resource_id: request.resource_id.clone(),
            granted: decision.granted,
            reason: decision.reason.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit buffer full")]
    BufferFull,
    #[error("audit sink closed")]
    Closed,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError>;
}

/// Emits each record as a structured `tracing` event on the
/// `tenantgate::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        tracing::info!(
            target: "tenantgate::audit",
            timestamp = %record.timestamp.to_rfc3339(),
            user_id = %record.user_id,
            tenant_id = record.tenant_id.get(),
            role = %record.role,
            module = %record.module,
            action = %record.action,
            resource_id = ?record.resource_id,
            granted = record.granted,
            reason = record.reason.as_str(),
            "authorization decision"
        );
        Ok(())
    }
}

/// Keeps records in process memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records.lock().push(record);
        Ok(())
    }
}

/// Hands records to a background task through a bounded channel.
///
/// Records are delivered to the inner sink in submission order; delivery
/// failures of the inner sink are logged by the worker.
#[derive(Clone)]
pub struct BufferedAuditSink {
    sender: mpsc::Sender<AuditRecord>,
}

impl BufferedAuditSink {
    /// Spawn the drain task. The task ends once every clone of the returned
    /// sink is dropped and the buffer is empty.
    pub fn spawn(inner: Arc<dyn AuditSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<AuditRecord>(capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                if let Err(err) = inner.record(record).await {
                    tracing::warn!(error = %err, "audit sink delivery failed");
                }
            }
        });
        (Self { sender }, worker)
    }
}

#[async_trait]
impl AuditSink for BufferedAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.sender.try_send(record).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                metrics::counter!("tenantgate_audit_dropped_total").increment(1);
                AuditError::BufferFull
            }
            mpsc::error::TrySendError::Closed(_) => AuditError::Closed,
        })
    }
}
