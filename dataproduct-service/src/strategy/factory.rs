//! Version token to strategy resolution

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{DataProductStrategy, PipelineDeps, V1Strategy, V2Strategy};
use crate::error::{Error, Result};
use crate::versioning::ApiVersion;

/// What `resolve` does with a token that has no registered strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionFallback {
    /// Fail with `UnsupportedVersion`
    #[default]
    Reject,
    /// Serve the request with this version instead
    To(ApiVersion),
}

impl From<Option<ApiVersion>> for VersionFallback {
    fn from(value: Option<ApiVersion>) -> Self {
        value.map_or(Self::Reject, Self::To)
    }
}

/// Registry of version to strategy bindings, fixed at startup
#[derive(Clone)]
pub struct StrategyFactory {
    strategies: BTreeMap<ApiVersion, Arc<dyn DataProductStrategy>>,
    fallback: VersionFallback,
}

impl StrategyFactory {
    pub fn builder() -> StrategyFactoryBuilder {
        StrategyFactoryBuilder::default()
    }

    /// v1 and v2 over the given collaborators
    pub fn standard(deps: &PipelineDeps, fallback: VersionFallback) -> Result<Self> {
        let v1: Arc<dyn DataProductStrategy> = Arc::new(V1Strategy::new(deps));
        let v2 = Arc::new(V2Strategy::new(deps, Arc::clone(&v1)));

        Self::builder()
            .register(v1)?
            .register(v2)?
            .fallback(fallback)
            .build()
    }

    /// Strategy bound to `token`
    ///
    /// # Errors
    ///
    /// `UnsupportedVersion` when the token is not a canonical version name
    /// (see [`ApiVersion::parse`]) or is unregistered, and no fallback is
    /// configured.
    pub fn resolve(&self, token: &str) -> Result<Arc<dyn DataProductStrategy>> {
        let registered = ApiVersion::parse(token).and_then(|version| self.strategies.get(&version));
        if let Some(strategy) = registered {
            return Ok(Arc::clone(strategy));
        }

        match self.fallback {
            VersionFallback::Reject => Err(Error::UnsupportedVersion(token.to_string())),
            VersionFallback::To(version) => {
                let strategy = self
                    .strategies
                    .get(&version)
                    .ok_or_else(|| Error::UnsupportedVersion(token.to_string()))?;
                tracing::warn!(
                    requested = token,
                    served = %version,
                    "unsupported version served by fallback"
                );
                Ok(Arc::clone(strategy))
            }
        }
    }

    /// Registered versions in ascending order
    pub fn supported_versions(&self) -> Vec<ApiVersion> {
        self.strategies.keys().copied().collect()
    }

    pub fn fallback(&self) -> VersionFallback {
        self.fallback
    }
}

impl std::fmt::Debug for StrategyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyFactory")
            .field("versions", &self.supported_versions())
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Builder for [`StrategyFactory`]
#[derive(Default)]
pub struct StrategyFactoryBuilder {
    strategies: BTreeMap<ApiVersion, Arc<dyn DataProductStrategy>>,
    fallback: VersionFallback,
}

impl std::fmt::Debug for StrategyFactoryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyFactoryBuilder")
            .field("versions", &self.strategies.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl StrategyFactoryBuilder {
    /// Bind a strategy to the version it reports
    ///
    /// # Errors
    ///
    /// Fails when that version is already bound.
    pub fn register(mut self, strategy: Arc<dyn DataProductStrategy>) -> Result<Self> {
        let version = strategy.version();
        if self.strategies.contains_key(&version) {
            return Err(Error::Internal(format!(
                "a strategy for {} is already registered",
                version
            )));
        }
        self.strategies.insert(version, strategy);
        Ok(self)
    }

    #[must_use]
    pub fn fallback(mut self, fallback: VersionFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Freeze the registry
    ///
    /// # Errors
    ///
    /// Fails when the fallback targets a version with no registered strategy.
    pub fn build(self) -> Result<StrategyFactory> {
        if let VersionFallback::To(version) = self.fallback {
            if !self.strategies.contains_key(&version) {
                return Err(Error::Internal(format!(
                    "fallback version {} has no registered strategy",
                    version
                )));
            }
        }

        Ok(StrategyFactory {
            strategies: self.strategies,
            fallback: self.fallback,
        })
    }
}
