//! Baseline strategy

use std::sync::Arc;

use async_trait::async_trait;

use super::{DataProductStrategy, PipelineDeps};
use crate::error::{Error, Result};
use crate::model::{DataProduct, DataProductDto, DataProductId, ENTITY_TYPE};
use crate::pipeline::{
    CreateRecord, HandlerChain, OverwriteUpdate, PipelineContext, ValidateCreate, ValidateUpdate,
};
use crate::repository::DataProductRepository;
use crate::versioning::ApiVersion;

/// v1: full overwrite on update
///
/// | operation | chain |
/// |---|---|
/// | create | validate_create, create_record, audit, publish |
/// | update | validate_update, overwrite_update, audit, publish |
/// | delete | repository delete, then audit, publish |
pub struct V1Strategy {
    repository: Arc<dyn DataProductRepository>,
    create_chain: HandlerChain,
    update_chain: HandlerChain,
    delete_chain: HandlerChain,
}

impl V1Strategy {
    pub fn new(deps: &PipelineDeps) -> Self {
        let create_chain = deps
            .with_side_effects(
                HandlerChain::builder()
                    .then(ValidateCreate::new(deps.rules))
                    .then(CreateRecord::new(Arc::clone(&deps.repository))),
            )
            .build();

        let update_chain = deps
            .with_side_effects(
                HandlerChain::builder()
                    .then(ValidateUpdate::new(deps.rules))
                    .then(OverwriteUpdate::new(Arc::clone(&deps.repository))),
            )
            .build();

        let delete_chain = deps.with_side_effects(HandlerChain::builder()).build();

        Self {
            repository: Arc::clone(&deps.repository),
            create_chain,
            update_chain,
            delete_chain,
        }
    }

    pub fn create_chain(&self) -> &HandlerChain {
        &self.create_chain
    }

    pub fn update_chain(&self) -> &HandlerChain {
        &self.update_chain
    }
}

/// Re-read the canonical record after an update chain
pub(super) async fn reread(
    repository: &dyn DataProductRepository,
    id: &DataProductId,
) -> Result<DataProduct> {
    repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(ENTITY_TYPE, id))
}

#[async_trait]
impl DataProductStrategy for V1Strategy {
    fn version(&self) -> ApiVersion {
        ApiVersion::V1
    }

    async fn create(&self, dto: DataProductDto) -> Result<DataProduct> {
        let mut ctx = PipelineContext::for_create(self.version(), dto);
        self.create_chain.handle(&mut ctx).await?;
        ctx.record
            .ok_or_else(|| Error::Internal("create chain finished without a record".to_string()))
    }

    async fn get(&self, id: &DataProductId) -> Result<Option<DataProduct>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    async fn update(&self, id: DataProductId, dto: DataProductDto) -> Result<DataProduct> {
        let mut ctx = PipelineContext::for_update(self.version(), id, dto);
        self.update_chain.handle(&mut ctx).await?;
        reread(self.repository.as_ref(), &id).await
    }

    async fn delete(&self, id: DataProductId) -> Result<()> {
        self.repository.delete(&id).await?;
        tracing::info!(%id, version = %self.version(), "data product deleted");

        let mut ctx = PipelineContext::for_delete(self.version(), id);
        self.delete_chain.handle(&mut ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataProductStatus;
    use crate::pipeline::{Operation, SideEffectPolicy};
    use crate::strategy::test_support::Harness;

    #[tokio::test]
    async fn test_chain_layout() {
        let strategy = V1Strategy::new(&Harness::new().deps());
        assert_eq!(
            strategy.create_chain().stage_names(),
            vec!["validate_create", "create_record", "audit", "publish"]
        );
        assert_eq!(
            strategy.update_chain().stage_names(),
            vec!["validate_update", "overwrite_update", "audit", "publish"]
        );
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let harness = Harness::new();
        let strategy = V1Strategy::new(&harness.deps());

        let before = chrono::Utc::now();
        let created = strategy
            .create(DataProductDto::named("Catalog A"))
            .await
            .unwrap();

        assert!(created.created_at >= before);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.status, DataProductStatus::Active);
        assert_eq!(strategy.get(&created.id).await.unwrap(), Some(created.clone()));

        let entries = harness.audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(harness.publisher.delivered().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_validation_failure_writes_nothing() {
        let harness = Harness::new();
        let strategy = V1Strategy::new(&harness.deps());

        let err = strategy.create(DataProductDto::named("ab")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(harness.repository.count().await.unwrap(), 0);
        assert!(harness.audit.is_empty().await);
        assert!(harness.publisher.delivered().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_overwrites_name() {
        let harness = Harness::new();
        let strategy = V1Strategy::new(&harness.deps());
        let created = strategy.create(DataProductDto::named("Catalog A")).await.unwrap();

        let updated = strategy
            .update(created.id, DataProductDto::named("Catalog B"))
            .await
            .unwrap();

        assert_eq!(updated.name, "Catalog B");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.revision, 2);
    }

    #[tokio::test]
    async fn test_update_unknown_id_emits_nothing() {
        let harness = Harness::new();
        let strategy = V1Strategy::new(&harness.deps());

        let err = strategy
            .update(DataProductId::new(), DataProductDto::named("Catalog B"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound { .. }));
        assert!(harness.audit.is_empty().await);
        assert!(harness.publisher.delivered().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_expected_revision_conflicts() {
        let harness = Harness::new();
        let strategy = V1Strategy::new(&harness.deps());
        let created = strategy.create(DataProductDto::named("Catalog A")).await.unwrap();

        strategy
            .update(created.id, DataProductDto::named("Catalog B").with_expected_revision(1))
            .await
            .unwrap();
        let err = strategy
            .update(created.id, DataProductDto::named("Catalog C").with_expected_revision(1))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "REVISION_CONFLICT");
        assert_eq!(strategy.get(&created.id).await.unwrap().unwrap().name, "Catalog B");
    }

    #[tokio::test]
    async fn test_delete_then_side_effects() {
        let harness = Harness::new();
        let strategy = V1Strategy::new(&harness.deps());
        let created = strategy.create(DataProductDto::named("Catalog A")).await.unwrap();

        strategy.delete(created.id).await.unwrap();
        assert_eq!(strategy.get(&created.id).await.unwrap(), None);

        let entries = harness.audit.entries().await;
        assert_eq!(entries.last().unwrap().operation, Operation::Delete);

        let err = strategy.delete(created.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(harness.audit.len().await, 2);
    }

    #[tokio::test]
    async fn test_fail_open_keeps_committed_write() {
        let harness = Harness::new();
        harness.audit.set_failing(true);
        harness.publisher.set_failing(true);
        let strategy = V1Strategy::new(&harness.deps());

        let created = strategy.create(DataProductDto::named("Catalog A")).await.unwrap();
        assert_eq!(strategy.get(&created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_fail_closed_surfaces_error_after_commit() {
        let harness = Harness::new();
        harness.publisher.set_failing(true);
        let deps = harness.deps().with_policy(SideEffectPolicy::FailClosed);
        let strategy = V1Strategy::new(&deps);

        let err = strategy.create(DataProductDto::named("Catalog A")).await.unwrap_err();
        assert!(matches!(err, Error::SideEffect { stage: "publish", .. }));
        // No rollback: the record and its audit entry remain
        assert_eq!(harness.repository.count().await.unwrap(), 1);
        assert_eq!(harness.audit.len().await, 1);
    }
}
