//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: DATAPRODUCT_, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/dataproduct-service/config.toml
//! 4. System directory: /etc/dataproduct-service/config.toml
//! 5. Default values
//!
//! The version registry itself is not configurable at runtime; configuration only
//! selects the fallback policy, deprecation notices and pipeline behavior.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pipeline::SideEffectPolicy;
use crate::versioning::{ApiVersion, DeprecationInfo};

const APP_NAME: &str = "dataproduct-service";
const ENV_PREFIX: &str = "DATAPRODUCT_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Version resolution policy and deprecation notices
    #[serde(default)]
    pub versioning: VersioningConfig,

    /// Handler pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Domain event publishing
    #[serde(default)]
    pub events: EventsConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            port: default_port(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
            environment: default_environment(),
        }
    }
}

/// Version resolution configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Serve unknown or unregistered version tokens with this version instead of
    /// failing. Unset by default: unknown versions are rejected.
    #[serde(default)]
    pub fallback_version: Option<ApiVersion>,

    /// Versions that should carry deprecation headers
    #[serde(default)]
    pub deprecated: Vec<DeprecationInfo>,
}

/// Handler pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Failure policy applied to every audit and publish stage
    #[serde(default)]
    pub side_effect_policy: SideEffectPolicy,

    /// Minimum name length after trimming
    #[serde(default = "default_name_min_len")]
    pub name_min_len: usize,

    /// Maximum name length after trimming
    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,

    /// Maximum description length
    #[serde(default = "default_description_max_len")]
    pub description_max_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            side_effect_policy: SideEffectPolicy::default(),
            name_min_len: default_name_min_len(),
            name_max_len: default_name_max_len(),
            description_max_len: default_description_max_len(),
        }
    }
}

/// Domain event configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Subject prefix for published events (e.g. "dataproduct" -> "dataproduct.created")
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// NATS server URL; only used when built with the `events` feature
    #[serde(default)]
    pub nats_url: Option<String>,

    /// Maximum reconnection attempts once connected
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: usize,

    /// Connection attempts at startup before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between startup connection attempts (doubles each retry)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Most recent keys remembered for duplicate detection by the logging publisher
    #[serde(default = "default_dedupe_window")]
    pub dedupe_window: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            subject_prefix: default_subject_prefix(),
            nats_url: None,
            max_reconnects: default_max_reconnects(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            dedupe_window: default_dedupe_window(),
        }
    }
}

// Default value functions
fn default_dedupe_window() -> usize {
    10_000
}

fn default_service_name() -> String {
    APP_NAME.to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_name_min_len() -> usize {
    3
}

fn default_name_max_len() -> usize {
    100
}

fn default_description_max_len() -> usize {
    1000
}

fn default_subject_prefix() -> String {
    "dataproduct".to_string()
}

fn default_max_reconnects() -> usize {
    10
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Environment variables (DATAPRODUCT_ prefix) override all file-based configs.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so that higher priority files override lower ones
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// This bypasses XDG directories and loads directly from the given path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.into()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject internally inconsistent settings
    pub fn validate(&self) -> Result<()> {
        let pipeline = &self.pipeline;
        if pipeline.name_min_len == 0 {
            return Err(Error::Internal(
                "pipeline.name_min_len must be at least 1".to_string(),
            ));
        }
        if pipeline.name_min_len > pipeline.name_max_len {
            return Err(Error::Internal(format!(
                "pipeline.name_min_len ({}) exceeds pipeline.name_max_len ({})",
                pipeline.name_min_len, pipeline.name_max_len
            )));
        }
        if self.events.subject_prefix.trim().is_empty() {
            return Err(Error::Internal(
                "events.subject_prefix must not be empty".to_string(),
            ));
        }
        if self.events.dedupe_window == 0 {
            return Err(Error::Internal(
                "events.dedupe_window must be at least 1".to_string(),
            ));
        }
        for info in &self.versioning.deprecated {
            if info.version == info.replacement {
                return Err(Error::Internal(format!(
                    "version {} cannot be deprecated in favor of itself",
                    info.version
                )));
            }
        }
        Ok(())
    }

    /// Deprecation notice for `version`, if one is configured
    pub fn deprecation_for(&self, version: ApiVersion) -> Option<&DeprecationInfo> {
        self.versioning
            .deprecated
            .iter()
            .find(|info| info.version == version)
    }

    /// Config file paths in priority order (highest first)
    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME);
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths.push(PathBuf::from("/etc").join(APP_NAME).join("config.toml"));
        paths
    }
}
