//! Handler contract and immutable handler chains
//!
//! A [`Handler`] is one pipeline stage. A [`HandlerChain`] runs its stages in
//! order; each stage runs only if the previous one returned `Ok`, and the first
//! error is returned to the caller untouched.
//!
//! Chains are built once with [`ChainBuilder`] and never rewired afterwards, so a
//! chain can be shared across concurrent requests behind an `Arc`. To change a
//! stage, build a new chain.
//!
//! ```rust,ignore
//! let chain = HandlerChain::builder()
//!     .then(ValidateCreate::new(rules))
//!     .then(CreateRecord::new(repository))
//!     .then(SideEffect::new(AuditStage::new(sink, "catalog"), policy))
//!     .build();
//!
//! let mut ctx = PipelineContext::for_create(ApiVersion::V1, dto);
//! chain.handle(&mut ctx).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use super::context::PipelineContext;
use crate::error::Result;

/// A single-purpose pipeline stage
///
/// `process` is the only extension point. It must reach persistence only through
/// the repository contract, and signals failure by returning an error.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Stage name used in logs, audit annotations and tests
    fn name(&self) -> &'static str;

    /// Run this stage against the shared context
    async fn process(&self, ctx: &mut PipelineContext) -> Result<()>;
}

/// Fluent builder: each `then` links the next stage after the current tail
#[derive(Default)]
pub struct ChainBuilder {
    stages: Vec<Arc<dyn Handler>>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    #[must_use]
    pub fn then<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.stages.push(Arc::new(handler));
        self
    }

    /// Append a stage that is already shared
    #[must_use]
    pub fn then_shared(mut self, handler: Arc<dyn Handler>) -> Self {
        self.stages.push(handler);
        self
    }

    /// Freeze the chain
    pub fn build(self) -> HandlerChain {
        HandlerChain {
            stages: self.stages.into(),
        }
    }
}

/// Ordered, immutable sequence of stages for one (version, operation) pair
#[derive(Clone)]
pub struct HandlerChain {
    stages: Arc<[Arc<dyn Handler>]>,
}

impl HandlerChain {
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, halting at the first failure
    ///
    /// No stage is retried or skipped, and nothing already done is rolled back:
    /// a failure after the business stage leaves the write committed.
    pub async fn handle(&self, ctx: &mut PipelineContext) -> Result<()> {
        let span = tracing::debug_span!(
            "pipeline",
            version = %ctx.version,
            operation = %ctx.operation,
        );

        async {
            for stage in self.stages.iter() {
                tracing::debug!(stage = stage.name(), "running stage");
                if let Err(error) = stage.process(ctx).await {
                    tracing::warn!(stage = stage.name(), %error, "stage failed, halting chain");
                    return Err(error);
                }
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("stages", &self.stage_names())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Recording;
    use super::*;
    use crate::error::Error;
    use crate::model::DataProductDto;
    use crate::versioning::ApiVersion;
    use std::sync::Mutex;

    fn ctx() -> PipelineContext {
        PipelineContext::for_create(ApiVersion::V1, DataProductDto::default())
    }

    #[tokio::test]
    async fn test_stages_run_in_declared_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = HandlerChain::builder()
            .then(Recording::ok("a", &log))
            .then(Recording::ok("b", &log))
            .then(Recording::ok("c", &log))
            .build();

        chain.handle(&mut ctx()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(chain.stage_names(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failure_halts_remaining_stages() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = HandlerChain::builder()
            .then(Recording::ok("a", &log))
            .then(Recording::failing("b", &log))
            .then(Recording::ok("c", &log))
            .build();

        let err = chain.handle(&mut ctx()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("b rejected")));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_chain_is_noop() {
        let chain = ChainBuilder::new().build();
        assert!(chain.is_empty());
        assert!(chain.handle(&mut ctx()).await.is_ok());
    }

    #[tokio::test]
    async fn test_chain_is_reusable_across_invocations() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = HandlerChain::builder()
            .then(Recording::ok("a", &log))
            .then(Recording::ok("b", &log))
            .build();
        let shared = chain.clone();

        let (first, second) = tokio::join!(
            async { chain.handle(&mut ctx()).await },
            async { shared.handle(&mut ctx()).await },
        );
        assert!(first.is_ok() && second.is_ok());
        assert_eq!(log.lock().unwrap().len(), 4);
        assert_eq!(chain.len(), 2);
    }

    #[tokio::test]
    async fn test_shared_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stage: Arc<dyn Handler> = Arc::new(Recording::ok("shared", &log));
        let chain = HandlerChain::builder()
            .then_shared(Arc::clone(&stage))
            .then_shared(stage)
            .build();

        chain.handle(&mut ctx()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["shared", "shared"]);
    }
}
