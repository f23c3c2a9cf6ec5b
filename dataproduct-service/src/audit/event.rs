//! Audit entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::DataProductId;
use crate::pipeline::Operation;
use crate::versioning::ApiVersion;

/// A single audit trail entry for one completed write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier
    pub id: Uuid,
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Name of the service that recorded this entry
    pub service_name: String,
    /// Version whose pipeline performed the write
    pub version: ApiVersion,
    /// Kind of write
    pub operation: Operation,
    /// Record the write targeted
    pub entity_id: DataProductId,
    /// Record revision after the write (absent for deletes)
    pub revision: Option<u64>,
    /// Snapshot of the stored record, or of the request for deletes
    pub payload: serde_json::Value,
    /// Monotonically increasing sequence number assigned by the sink
    pub sequence: u64,
}

impl AuditEntry {
    /// Create a new entry; the sink assigns `sequence` on record
    pub fn new(
        service_name: impl Into<String>,
        version: ApiVersion,
        operation: Operation,
        entity_id: DataProductId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            service_name: service_name.into(),
            version,
            operation,
            entity_id,
            revision: None,
            payload: serde_json::Value::Null,
            sequence: 0,
        }
    }

    /// Set the revision after the write
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Set the payload snapshot
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
