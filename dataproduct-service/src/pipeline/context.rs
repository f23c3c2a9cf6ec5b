//! The mutable record threaded through a handler chain

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{DataProduct, DataProductDto, DataProductId};
use crate::versioning::ApiVersion;

/// Write operation a chain runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Past-tense event name ("created", "updated", "deleted")
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Per-invocation state passed by `&mut` through every stage
///
/// Validation stages normalise `dto`; the business stage fills `record`; audit
/// and publish stages read both. `annotations` carries anything a stage wants
/// to hand to a later one without widening this struct.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub version: ApiVersion,
    pub operation: Operation,
    pub id: Option<DataProductId>,
    pub dto: DataProductDto,
    pub record: Option<DataProduct>,
    annotations: BTreeMap<String, serde_json::Value>,
}

impl PipelineContext {
    pub fn new(version: ApiVersion, operation: Operation, dto: DataProductDto) -> Self {
        Self {
            version,
            operation,
            id: None,
            dto,
            record: None,
            annotations: BTreeMap::new(),
        }
    }

    pub fn for_create(version: ApiVersion, dto: DataProductDto) -> Self {
        Self::new(version, Operation::Create, dto)
    }

    /// Update context with the target identifier already stamped on it
    pub fn for_update(version: ApiVersion, id: DataProductId, dto: DataProductDto) -> Self {
        let mut ctx = Self::new(version, Operation::Update, dto);
        ctx.id = Some(id);
        ctx
    }

    pub fn for_delete(version: ApiVersion, id: DataProductId) -> Self {
        let mut ctx = Self::new(version, Operation::Delete, DataProductDto::default());
        ctx.id = Some(id);
        ctx
    }

    /// The identifier this invocation targets
    pub fn target_id(&self) -> Result<DataProductId> {
        self.id
            .ok_or_else(|| Error::validation(format!("identifier is required for {}", self.operation)))
    }

    /// The record produced by the business stage
    pub fn record(&self) -> Result<&DataProduct> {
        self.record.as_ref().ok_or_else(|| {
            Error::Internal(format!(
                "{} pipeline reached a stage that needs the stored record before it was produced",
                self.operation
            ))
        })
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.annotations.insert(key.into(), value);
    }

    pub fn annotation(&self, key: &str) -> Option<&serde_json::Value> {
        self.annotations.get(key)
    }

    pub fn annotations(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.annotations
    }
}
