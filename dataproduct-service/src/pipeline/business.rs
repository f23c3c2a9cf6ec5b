//! Business stages: the only stages that write through the repository

use std::sync::Arc;

use async_trait::async_trait;

use super::context::PipelineContext;
use super::handler::Handler;
use crate::error::{Error, Result};
use crate::model::{DataProductPatch, NewDataProduct, ENTITY_TYPE};
use crate::repository::DataProductRepository;

/// Persist a new record from the validated DTO
pub struct CreateRecord {
    repository: Arc<dyn DataProductRepository>,
}

impl CreateRecord {
    pub fn new(repository: Arc<dyn DataProductRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Handler for CreateRecord {
    fn name(&self) -> &'static str {
        "create_record"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<()> {
        let name = ctx
            .dto
            .name
            .clone()
            .ok_or_else(|| Error::validation("name is required"))?;

        let record = self
            .repository
            .create(NewDataProduct {
                name,
                description: ctx.dto.description.clone(),
                status: ctx.dto.status.unwrap_or_default(),
            })
            .await?;

        tracing::info!(id = %record.id, version = %ctx.version, "data product created");
        ctx.id = Some(record.id);
        ctx.record = Some(record);
        Ok(())
    }
}

/// v1 update: overwrite whatever fields the DTO carries
pub struct OverwriteUpdate {
    repository: Arc<dyn DataProductRepository>,
}

impl OverwriteUpdate {
    pub fn new(repository: Arc<dyn DataProductRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Handler for OverwriteUpdate {
    fn name(&self) -> &'static str {
        "overwrite_update"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<()> {
        let id = ctx.target_id()?;
        let record = self
            .repository
            .update(&id, DataProductPatch::from(&ctx.dto))
            .await?;

        tracing::info!(%id, revision = record.revision, "data product overwritten");
        ctx.record = Some(record);
        Ok(())
    }
}

/// v2 update: the name is fixed at creation; other fields merge over current state
///
/// The merge is guarded by the revision that was read, so a concurrent writer
/// between the read and the write surfaces as a conflict instead of a lost update.
pub struct ImmutableNameUpdate {
    repository: Arc<dyn DataProductRepository>,
}

impl ImmutableNameUpdate {
    pub fn new(repository: Arc<dyn DataProductRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Handler for ImmutableNameUpdate {
    fn name(&self) -> &'static str {
        "immutable_name_update"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<()> {
        let id = ctx.target_id()?;
        let current = self
            .repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| Error::not_found(ENTITY_TYPE, id))?;

        if let Some(name) = ctx.dto.name.as_deref() {
            if name != current.name {
                return Err(Error::validation("name is immutable in v2"));
            }
        }

        let patch = DataProductPatch {
            name: None,
            description: ctx.dto.description.clone().or(current.description),
            status: Some(ctx.dto.status.unwrap_or(current.status)),
            expected_revision: Some(ctx.dto.expected_revision.unwrap_or(current.revision)),
        };
        let record = self.repository.update(&id, patch).await?;

        tracing::info!(%id, revision = record.revision, "data product merged");
        ctx.record = Some(record);
        Ok(())
    }
}
