//! Audit stage

use std::sync::Arc;

use async_trait::async_trait;

use super::context::{Operation, PipelineContext};
use super::handler::Handler;
use crate::audit::{AuditEntry, AuditSink};
use crate::error::{Error, Result};

/// Record one audit entry for the write the business stage completed
///
/// Wrap in [`SideEffect`](super::SideEffect) so the deployment's failure policy
/// applies.
pub struct AuditStage {
    sink: Arc<dyn AuditSink>,
    service_name: String,
}

impl AuditStage {
    pub fn new(sink: Arc<dyn AuditSink>, service_name: impl Into<String>) -> Self {
        Self {
            sink,
            service_name: service_name.into(),
        }
    }

    fn entry_for(&self, ctx: &PipelineContext) -> Result<AuditEntry> {
        let id = ctx.target_id()?;
        let entry = AuditEntry::new(&self.service_name, ctx.version, ctx.operation, id);

        if ctx.operation == Operation::Delete {
            return Ok(entry.with_payload(serde_json::json!({ "id": id })));
        }

        let record = ctx.record()?;
        let payload = serde_json::to_value(record)
            .map_err(|e| Error::Internal(format!("failed to encode audit payload: {}", e)))?;
        Ok(entry.with_revision(record.revision).with_payload(payload))
    }
}

#[async_trait]
impl Handler for AuditStage {
    fn name(&self) -> &'static str {
        "audit"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<()> {
        let entry = self.entry_for(ctx)?;
        let audit_id = entry.id;
        self.sink.record(entry).await?;

        tracing::debug!(%audit_id, operation = %ctx.operation, "audit entry recorded");
        ctx.annotate("audit_id", serde_json::Value::String(audit_id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::model::{DataProduct, DataProductDto, DataProductId, NewDataProduct};
    use crate::versioning::ApiVersion;
    use chrono::Utc;

    fn completed_create() -> PipelineContext {
        let record = DataProduct::from_new(
            DataProductId::new(),
            NewDataProduct {
                name: "Catalog A".to_string(),
                description: None,
                status: Default::default(),
            },
            Utc::now(),
        );
        let mut ctx = PipelineContext::for_create(ApiVersion::V1, DataProductDto::named("Catalog A"));
        ctx.id = Some(record.id);
        ctx.record = Some(record);
        ctx
    }

    #[tokio::test]
    async fn test_records_completed_write() {
        let sink = InMemoryAuditSink::new();
        let stage = AuditStage::new(Arc::new(sink.clone()), "catalog");
        let mut ctx = completed_create();

        stage.process(&mut ctx).await.unwrap();

        let entries = sink.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[0].revision, Some(1));
        assert_eq!(entries[0].payload["name"], "Catalog A");
        assert!(ctx.annotation("audit_id").is_some());
    }

    #[tokio::test]
    async fn test_delete_needs_only_id() {
        let sink = InMemoryAuditSink::new();
        let stage = AuditStage::new(Arc::new(sink.clone()), "catalog");
        let id = DataProductId::new();
        let mut ctx = PipelineContext::for_delete(ApiVersion::V2, id);

        stage.process(&mut ctx).await.unwrap();
        let entries = sink.entries().await;
        assert_eq!(entries[0].entity_id, id);
        assert_eq!(entries[0].revision, None);
        assert_eq!(entries[0].version, ApiVersion::V2);
    }

    #[tokio::test]
    async fn test_sink_failure_is_returned() {
        let sink = InMemoryAuditSink::new();
        sink.set_failing(true);
        let stage = AuditStage::new(Arc::new(sink), "catalog");
        assert!(stage.process(&mut completed_create()).await.is_err());
    }
}
