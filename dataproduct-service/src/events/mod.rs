//! Domain events and publishers
//!
//! Every completed write emits one [`DomainEvent`] whose `key` is derived only
//! from the event name, record id and revision. Publishing the same completed
//! write twice therefore produces the same key, and publishers drop the second
//! copy ([`PublishOutcome::Duplicate`]) instead of delivering it again.

#[cfg(feature = "events")]
pub mod nats;

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::model::{DataProduct, DataProductId};
use crate::pipeline::Operation;
use crate::versioning::ApiVersion;

#[cfg(feature = "events")]
pub use nats::NatsEventPublisher;

/// A fact about a completed write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    /// Deterministic idempotency key
    pub key: String,
    /// Subject the event is published on (e.g. "dataproduct.updated")
    pub subject: String,
    pub operation: Operation,
    /// Version whose pipeline performed the write
    pub version: ApiVersion,
    pub entity_id: DataProductId,
    /// Record revision after the write (absent for deletes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    /// For creates and updates this is the record's `updated_at`, so a re-run
    /// yields an identical event. Deletes carry the time the delete was published.
    pub occurred_at: DateTime<Utc>,
    /// Stored record after the write (absent for deletes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<DataProduct>,
}

impl DomainEvent {
    /// Event for a create or update, built from the stored record
    pub fn for_record(
        subject_prefix: &str,
        version: ApiVersion,
        operation: Operation,
        record: &DataProduct,
    ) -> Self {
        let subject = subject_for(subject_prefix, operation);
        Self {
            key: idempotency_key(&subject, &record.id, Some(record.revision)),
            subject,
            operation,
            version,
            entity_id: record.id,
            revision: Some(record.revision),
            occurred_at: record.updated_at,
            record: Some(record.clone()),
        }
    }

    /// Event for a delete
    pub fn for_delete(
        subject_prefix: &str,
        version: ApiVersion,
        id: DataProductId,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let subject = subject_for(subject_prefix, Operation::Delete);
        Self {
            key: idempotency_key(&subject, &id, None),
            subject,
            operation: Operation::Delete,
            version,
            entity_id: id,
            revision: None,
            occurred_at,
            record: None,
        }
    }
}

fn subject_for(prefix: &str, operation: Operation) -> String {
    format!("{}.{}", prefix, operation.event_name())
}

/// `<subject>:<id>[:<revision>]`
pub fn idempotency_key(subject: &str, id: &DataProductId, revision: Option<u64>) -> String {
    match revision {
        Some(revision) => format!("{}:{}:{}", subject, id, revision),
        None => format!("{}:{}", subject, id),
    }
}

/// Result of a publish call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// First delivery of this key
    Enqueued,
    /// Key already seen; nothing was delivered
    Duplicate,
}

/// Destination for domain events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event, deduplicating on `event.key`
    async fn publish(&self, event: &DomainEvent) -> Result<PublishOutcome>;
}

/// Publisher that keeps every delivered event in memory
///
/// Nothing is ever evicted, so this suits tests and short-lived tools. Long-running
/// processes without a broker use [`TracingEventPublisher`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    seen: Arc<DashSet<String>>,
    delivered: Arc<RwLock<Vec<DomainEvent>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `publish` fail (for exercising the side-effect policy)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Events delivered so far, in delivery order
    pub async fn delivered(&self) -> Vec<DomainEvent> {
        self.delivered.read().await.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<PublishOutcome> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Messaging(format!(
                "publisher unavailable for {}",
                event.subject
            )));
        }

        if !self.seen.insert(event.key.clone()) {
            tracing::debug!(key = %event.key, "duplicate event dropped");
            return Ok(PublishOutcome::Duplicate);
        }

        self.delivered.write().await.push(event.clone());
        Ok(PublishOutcome::Enqueued)
    }
}

/// Most recent `capacity` keys, oldest evicted first
#[derive(Debug)]
struct DedupeWindow {
    capacity: usize,
    order: VecDeque<String>,
    keys: HashSet<String>,
}

impl DedupeWindow {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            keys: HashSet::with_capacity(capacity),
        }
    }

    /// `false` when `key` is already inside the window
    fn insert(&mut self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
        self.order.push_back(key.to_string());
        self.keys.insert(key.to_string());
        true
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Publisher that emits each event on the `events` tracing target
///
/// Used when no broker is configured. Duplicates are detected within a bounded
/// window of recent keys, so memory stays flat however long the service runs.
#[derive(Debug)]
pub struct TracingEventPublisher {
    window: Mutex<DedupeWindow>,
}

impl TracingEventPublisher {
    pub fn new(dedupe_window: usize) -> Self {
        Self {
            window: Mutex::new(DedupeWindow::new(dedupe_window)),
        }
    }

    /// Keys currently remembered for duplicate detection
    pub async fn remembered(&self) -> usize {
        self.window.lock().await.len()
    }
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<PublishOutcome> {
        if !self.window.lock().await.insert(&event.key) {
            tracing::debug!(target: "events", key = %event.key, "duplicate event dropped");
            return Ok(PublishOutcome::Duplicate);
        }

        tracing::info!(
            target: "events",
            key = %event.key,
            subject = %event.subject,
            version = %event.version,
            entity_id = %event.entity_id,
            revision = event.revision,
            occurred_at = %event.occurred_at,
            "event"
        );
        Ok(PublishOutcome::Enqueued)
    }
}
