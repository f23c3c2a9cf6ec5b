//! dataproduct-service binary
//!
//! Wires the in-memory repository, a tracing-backed audit sink and an event
//! publisher (NATS JetStream when built with `events` and `events.nats_url` is
//! set, logged to the `events` tracing target otherwise) into the v1/v2 strategy registry and serves HTTP.

use std::sync::Arc;

use anyhow::Context;
use dataproduct_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config)?;

    let repository: Arc<dyn DataProductRepository> =
        Arc::new(InMemoryDataProductRepository::new());
    let publisher = event_publisher(&config).await?;

    let deps = PipelineDeps::from_config(
        &config,
        Arc::clone(&repository),
        Arc::new(TracingAuditSink::new()),
        publisher,
    );
    let fallback = VersionFallback::from(config.versioning.fallback_version);
    let factory = StrategyFactory::standard(&deps, fallback)
        .context("failed to build strategy registry")?;

    tracing::info!(
        versions = ?factory.supported_versions(),
        fallback = ?factory.fallback(),
        "strategy registry ready"
    );

    let controller = DataProductController::new(Arc::new(factory));
    let state = AppState::new(config.clone(), controller, repository);

    Server::new(config).serve(router(state)).await?;
    dataproduct_service::observability::shutdown_tracing();
    Ok(())
}

#[cfg(feature = "events")]
async fn event_publisher(config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    if config.events.nats_url.is_some() {
        let publisher = NatsEventPublisher::connect(&config.events, &config.service.name)
            .await
            .context("failed to connect event publisher")?;
        return Ok(Arc::new(publisher));
    }
    tracing::warn!("events.nats_url not set; events are only logged");
    Ok(Arc::new(TracingEventPublisher::new(config.events.dedupe_window)))
}

#[cfg(not(feature = "events"))]
async fn event_publisher(config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    Ok(Arc::new(TracingEventPublisher::new(config.events.dedupe_window)))
}
