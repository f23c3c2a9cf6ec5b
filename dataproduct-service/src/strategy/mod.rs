//! Per-version strategies
//!
//! A [`DataProductStrategy`] is the operation contract for one API version. Each
//! strategy builds its handler chains once, at construction, from a shared set
//! of [`PipelineDeps`], and reuses them for every request.
//!
//! [`V1Strategy`] is the baseline. [`V2Strategy`] holds a reference to a baseline
//! and replaces only the update chain; everything else is delegated.
//! [`StrategyFactory`] is the one place a version token is bound to a strategy.

mod factory;
mod v1;
mod v2;

use std::sync::Arc;

use async_trait::async_trait;

use crate::audit::AuditSink;
use crate::config::Config;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::model::{DataProduct, DataProductDto, DataProductId};
use crate::pipeline::{
    AuditStage, ChainBuilder, PublishStage, SideEffect, SideEffectPolicy, ValidationRules,
};
use crate::repository::DataProductRepository;
use crate::versioning::ApiVersion;

pub use factory::{StrategyFactory, StrategyFactoryBuilder, VersionFallback};
pub use v1::V1Strategy;
pub use v2::V2Strategy;

/// Operation contract every version implements
#[async_trait]
pub trait DataProductStrategy: Send + Sync {
    /// Version this strategy serves
    fn version(&self) -> ApiVersion;

    /// Validate, persist, audit and publish a new record
    async fn create(&self, dto: DataProductDto) -> Result<DataProduct>;

    /// Read a record; `Ok(None)` when it does not exist
    async fn get(&self, id: &DataProductId) -> Result<Option<DataProduct>>;

    /// Run this version's update chain, then return the stored record
    async fn update(&self, id: DataProductId, dto: DataProductDto) -> Result<DataProduct>;

    /// Remove a record, then audit and publish the removal
    async fn delete(&self, id: DataProductId) -> Result<()>;
}

impl std::fmt::Debug for dyn DataProductStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProductStrategy")
            .field("version", &self.version())
            .finish()
    }
}

/// Collaborators every strategy's chains are assembled from
#[derive(Clone)]
pub struct PipelineDeps {
    pub repository: Arc<dyn DataProductRepository>,
    pub audit: Arc<dyn AuditSink>,
    pub publisher: Arc<dyn EventPublisher>,
    pub rules: ValidationRules,
    pub policy: SideEffectPolicy,
    pub service_name: String,
    pub subject_prefix: String,
}

impl PipelineDeps {
    /// Collaborators with default rules and the fail-open policy
    pub fn new(
        repository: Arc<dyn DataProductRepository>,
        audit: Arc<dyn AuditSink>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let config = Config::default();
        Self::from_config(&config, repository, audit, publisher)
    }

    /// Collaborators with rules, policy and naming taken from configuration
    pub fn from_config(
        config: &Config,
        repository: Arc<dyn DataProductRepository>,
        audit: Arc<dyn AuditSink>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            audit,
            publisher,
            rules: ValidationRules::from(&config.pipeline),
            policy: config.pipeline.side_effect_policy,
            service_name: config.service.name.clone(),
            subject_prefix: config.events.subject_prefix.clone(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SideEffectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Append the audit and publish stages, both under the configured policy
    fn with_side_effects(&self, chain: ChainBuilder) -> ChainBuilder {
        chain
            .then(SideEffect::new(
                AuditStage::new(Arc::clone(&self.audit), self.service_name.clone()),
                self.policy,
            ))
            .then(SideEffect::new(
                PublishStage::new(Arc::clone(&self.publisher), self.subject_prefix.clone()),
                self.policy,
            ))
    }
}

impl std::fmt::Debug for PipelineDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineDeps")
            .field("rules", &self.rules)
            .field("policy", &self.policy)
            .field("service_name", &self.service_name)
            .field("subject_prefix", &self.subject_prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::events::InMemoryEventPublisher;
    use crate::repository::InMemoryDataProductRepository;

    /// In-memory collaborators with handles kept for assertions
    pub struct Harness {
        pub repository: InMemoryDataProductRepository,
        pub audit: InMemoryAuditSink,
        pub publisher: InMemoryEventPublisher,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                repository: InMemoryDataProductRepository::new(),
                audit: InMemoryAuditSink::new(),
                publisher: InMemoryEventPublisher::new(),
            }
        }

        pub fn deps(&self) -> PipelineDeps {
            PipelineDeps::new(
                Arc::new(self.repository.clone()),
                Arc::new(self.audit.clone()),
                Arc::new(self.publisher.clone()),
            )
        }
    }
}
