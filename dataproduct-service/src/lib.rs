//! # dataproduct-service
//!
//! Versioned CRUD service for the DataProduct resource. Each API version is a
//! strategy that runs per-operation handler chains (validate, persist, audit,
//! publish); a new version reuses the stages it keeps and swaps only the ones
//! whose behavior changes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dataproduct_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let repository: Arc<dyn DataProductRepository> =
//!         Arc::new(InMemoryDataProductRepository::new());
//!     let deps = PipelineDeps::from_config(
//!         &config,
//!         Arc::clone(&repository),
//!         Arc::new(TracingAuditSink::new()),
//!         Arc::new(TracingEventPublisher::new(config.events.dedupe_window)),
//!     );
//!     let factory = StrategyFactory::standard(
//!         &deps,
//!         VersionFallback::from(config.versioning.fallback_version),
//!     )?;
//!
//!     let controller = DataProductController::new(Arc::new(factory));
//!     let state = AppState::new(config.clone(), controller, repository);
//!
//!     Server::new(config).serve(router(state)).await
//! }
//! ```

pub mod audit;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod health;
pub mod http;
pub mod middleware;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod repository;
pub mod server;
pub mod state;
pub mod strategy;
pub mod versioning;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditEntry, AuditSink, InMemoryAuditSink, TracingAuditSink};
    pub use crate::config::Config;
    pub use crate::controller::DataProductController;
    pub use crate::error::{Error, Result};
    pub use crate::events::{
        DomainEvent, EventPublisher, InMemoryEventPublisher, PublishOutcome, TracingEventPublisher,
    };
    pub use crate::health::{health, readiness};
    pub use crate::http::router;
    pub use crate::model::{DataProduct, DataProductDto, DataProductId, DataProductStatus};
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{
        Handler, HandlerChain, Operation, PipelineContext, SideEffect, SideEffectPolicy,
    };
    pub use crate::repository::{
        DataProductRepository, InMemoryDataProductRepository, RepositoryError,
        RepositoryErrorKind,
    };
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::strategy::{
        DataProductStrategy, PipelineDeps, StrategyFactory, V1Strategy, V2Strategy,
        VersionFallback,
    };
    pub use crate::versioning::{ApiVersion, DeprecationInfo};

    #[cfg(feature = "events")]
    pub use crate::events::NatsEventPublisher;
}
