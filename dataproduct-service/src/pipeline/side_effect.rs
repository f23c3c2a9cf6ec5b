//! Uniform failure policy for audit and publish stages

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::context::PipelineContext;
use super::handler::Handler;
use crate::error::{Error, Result};

/// What a failing audit or publish stage does to the request
///
/// One policy applies to every side-effect stage in a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffectPolicy {
    /// Log the failure, annotate the context, and let the chain continue
    #[default]
    FailOpen,
    /// Propagate the failure as [`Error::SideEffect`], halting the chain
    FailClosed,
}

/// Wraps an audit or publish stage and applies the configured policy to it
pub struct SideEffect<H> {
    inner: H,
    policy: SideEffectPolicy,
}

impl<H: Handler> SideEffect<H> {
    pub fn new(inner: H, policy: SideEffectPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> SideEffectPolicy {
        self.policy
    }
}

#[async_trait]
impl<H: Handler> Handler for SideEffect<H> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<()> {
        let stage = self.inner.name();
        let Err(error) = self.inner.process(ctx).await else {
            return Ok(());
        };

        match self.policy {
            SideEffectPolicy::FailOpen => {
                tracing::warn!(
                    stage,
                    operation = %ctx.operation,
                    %error,
                    "side effect failed; continuing under fail_open policy"
                );
                ctx.annotate(
                    format!("side_effect_failed.{}", stage),
                    serde_json::Value::String(error.to_string()),
                );
                Ok(())
            }
            SideEffectPolicy::FailClosed => Err(match error {
                already @ Error::SideEffect { .. } => already,
                other => Error::SideEffect {
                    stage,
                    message: other.to_string(),
                },
            }),
        }
    }
}
