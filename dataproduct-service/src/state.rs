//! Application state shared across HTTP handlers

use std::sync::Arc;

use crate::config::Config;
use crate::controller::DataProductController;
use crate::repository::DataProductRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    controller: DataProductController,
    repository: Arc<dyn DataProductRepository>,
}

impl AppState {
    pub fn new(
        config: Config,
        controller: DataProductController,
        repository: Arc<dyn DataProductRepository>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            controller,
            repository,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &DataProductController {
        &self.controller
    }

    /// Repository handle, used by the readiness probe
    pub fn repository(&self) -> &Arc<dyn DataProductRepository> {
        &self.repository
    }
}
