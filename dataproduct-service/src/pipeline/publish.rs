//! Publish stage

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::context::{Operation, PipelineContext};
use super::handler::Handler;
use crate::error::Result;
use crate::events::{DomainEvent, EventPublisher, PublishOutcome};

/// Publish one domain event for the write the business stage completed
///
/// The event key depends only on the stored record, so running this stage
/// again on the same context yields a duplicate rather than a second fact.
pub struct PublishStage {
    publisher: Arc<dyn EventPublisher>,
    subject_prefix: String,
}

impl PublishStage {
    pub fn new(publisher: Arc<dyn EventPublisher>, subject_prefix: impl Into<String>) -> Self {
        Self {
            publisher,
            subject_prefix: subject_prefix.into(),
        }
    }

    fn event_for(&self, ctx: &PipelineContext) -> Result<DomainEvent> {
        if ctx.operation == Operation::Delete {
            return Ok(DomainEvent::for_delete(
                &self.subject_prefix,
                ctx.version,
                ctx.target_id()?,
                Utc::now(),
            ));
        }
        Ok(DomainEvent::for_record(
            &self.subject_prefix,
            ctx.version,
            ctx.operation,
            ctx.record()?,
        ))
    }
}

#[async_trait]
impl Handler for PublishStage {
    fn name(&self) -> &'static str {
        "publish"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<()> {
        let event = self.event_for(ctx)?;
        let outcome = self.publisher.publish(&event).await?;

        match outcome {
            PublishOutcome::Enqueued => {
                tracing::debug!(key = %event.key, subject = %event.subject, "event published")
            }
            PublishOutcome::Duplicate => {
                tracing::info!(key = %event.key, "event already published, skipped")
            }
        }
        ctx.annotate("event_key", serde_json::Value::String(event.key));
        Ok(())
    }
}
