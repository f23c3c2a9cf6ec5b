//! Audit sinks
//!
//! An [`AuditSink`] is where the audit stage sends its entries. Sinks are
//! append-only: there is no way to amend or remove an entry once recorded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::event::AuditEntry;
use crate::error::{Error, Result};

/// Append-only destination for audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append an entry, assigning its sequence number
    async fn record(&self, entry: AuditEntry) -> Result<()>;
}

/// Sink that keeps entries in memory, in sequence order
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
    sequence: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `record` fail (for exercising the side-effect policy)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of all entries recorded so far
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, mut entry: AuditEntry) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Internal("audit sink unavailable".to_string()));
        }

        let mut entries = self.entries.write().await;
        entry.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        entries.push(entry);
        Ok(())
    }
}

/// Sink that emits each entry as a structured `tracing` event on the `audit` target
///
/// Pair with a JSON subscriber to ship the audit trail with the service logs.
#[derive(Debug, Default)]
pub struct TracingAuditSink {
    sequence: AtomicU64,
}

impl TracingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, mut entry: AuditEntry) -> Result<()> {
        entry.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let payload = serde_json::to_string(&entry.payload)
            .map_err(|e| Error::Internal(format!("failed to encode audit payload: {}", e)))?;

        tracing::info!(
            target: "audit",
            audit_id = %entry.id,
            sequence = entry.sequence,
            service = %entry.service_name,
            version = %entry.version,
            operation = %entry.operation,
            entity_id = %entry.entity_id,
            revision = entry.revision,
            payload = %payload,
            "audit"
        );
        Ok(())
    }
}
