//! v2 strategy: immutable names

use std::sync::Arc;

use async_trait::async_trait;

use super::v1::reread;
use super::{DataProductStrategy, PipelineDeps};
use crate::error::Result;
use crate::model::{DataProduct, DataProductDto, DataProductId};
use crate::pipeline::{HandlerChain, ImmutableNameUpdate, PipelineContext, ValidateUpdate};
use crate::repository::DataProductRepository;
use crate::versioning::ApiVersion;

/// v2: the name is fixed at creation, other fields merge over stored state
///
/// Only `update` has its own chain. `create`, `get` and `delete` are delegated
/// to `baseline` unchanged, so their audit entries and events carry the
/// baseline's version.
pub struct V2Strategy {
    baseline: Arc<dyn DataProductStrategy>,
    repository: Arc<dyn DataProductRepository>,
    update_chain: HandlerChain,
}

impl V2Strategy {
    pub fn new(deps: &PipelineDeps, baseline: Arc<dyn DataProductStrategy>) -> Self {
        let update_chain = deps
            .with_side_effects(
                HandlerChain::builder()
                    .then(ValidateUpdate::new(deps.rules))
                    .then(ImmutableNameUpdate::new(Arc::clone(&deps.repository))),
            )
            .build();

        Self {
            baseline,
            repository: Arc::clone(&deps.repository),
            update_chain,
        }
    }

    pub fn baseline(&self) -> &Arc<dyn DataProductStrategy> {
        &self.baseline
    }

    pub fn update_chain(&self) -> &HandlerChain {
        &self.update_chain
    }
}

#[async_trait]
impl DataProductStrategy for V2Strategy {
    fn version(&self) -> ApiVersion {
        ApiVersion::V2
    }

    async fn create(&self, dto: DataProductDto) -> Result<DataProduct> {
        self.baseline.create(dto).await
    }

    async fn get(&self, id: &DataProductId) -> Result<Option<DataProduct>> {
        self.baseline.get(id).await
    }

    async fn update(&self, id: DataProductId, dto: DataProductDto) -> Result<DataProduct> {
        let mut ctx = PipelineContext::for_update(self.version(), id, dto);
        self.update_chain.handle(&mut ctx).await?;
        reread(self.repository.as_ref(), &id).await
    }

    async fn delete(&self, id: DataProductId) -> Result<()> {
        self.baseline.delete(id).await
    }
}
