//! Handler pipeline
//!
//! Each (version, operation) pair runs an immutable [`HandlerChain`] of
//! single-purpose stages over a shared [`PipelineContext`]:
//!
//! - validation: [`ValidateCreate`], [`ValidateUpdate`]
//! - business: [`CreateRecord`], [`OverwriteUpdate`], [`ImmutableNameUpdate`]
//! - side effects: [`AuditStage`], [`PublishStage`], each wrapped in
//!   [`SideEffect`] so one [`SideEffectPolicy`] governs their failures

mod audit;
mod business;
pub mod context;
pub mod handler;
mod publish;
mod side_effect;
mod validate;

pub use audit::AuditStage;
pub use business::{CreateRecord, ImmutableNameUpdate, OverwriteUpdate};
pub use context::{Operation, PipelineContext};
pub use handler::{ChainBuilder, Handler, HandlerChain};
pub use publish::PublishStage;
pub use side_effect::{SideEffect, SideEffectPolicy};
pub use validate::{ValidateCreate, ValidateUpdate, ValidationRules};
