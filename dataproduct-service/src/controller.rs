//! Version-aware entry point for DataProduct operations
//!
//! The controller knows nothing about how any version behaves. It resolves the
//! version token through the [`StrategyFactory`] and forwards the call.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{DataProduct, DataProductDto, DataProductId, ENTITY_TYPE};
use crate::strategy::StrategyFactory;
use crate::versioning::ApiVersion;

#[derive(Debug, Clone)]
pub struct DataProductController {
    factory: Arc<StrategyFactory>,
}

impl DataProductController {
    pub fn new(factory: Arc<StrategyFactory>) -> Self {
        Self { factory }
    }

    pub async fn create(&self, version: &str, dto: DataProductDto) -> Result<DataProduct> {
        self.factory.resolve(version)?.create(dto).await
    }

    /// Fetch a record; a missing record is `NotFound`
    pub async fn get(&self, version: &str, id: DataProductId) -> Result<DataProduct> {
        self.factory
            .resolve(version)?
            .get(&id)
            .await?
            .ok_or_else(|| Error::not_found(ENTITY_TYPE, id))
    }

    pub async fn update(
        &self,
        version: &str,
        id: DataProductId,
        dto: DataProductDto,
    ) -> Result<DataProduct> {
        self.factory.resolve(version)?.update(id, dto).await
    }

    pub async fn delete(&self, version: &str, id: DataProductId) -> Result<()> {
        self.factory.resolve(version)?.delete(id).await
    }

    pub fn supported_versions(&self) -> Vec<ApiVersion> {
        self.factory.supported_versions()
    }
}
