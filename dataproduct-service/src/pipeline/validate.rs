//! Validation stages
//!
//! These enforce business rules beyond the wire shape and normalise the DTO
//! (trimmed name, discarded client id). They never touch the repository.

use async_trait::async_trait;

use super::context::PipelineContext;
use super::handler::Handler;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};

/// Field bounds shared by the create and update validators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub name_min_len: usize,
    pub name_max_len: usize,
    pub description_max_len: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ValidationRules {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            name_min_len: config.name_min_len,
            name_max_len: config.name_max_len,
            description_max_len: config.description_max_len,
        }
    }
}

impl ValidationRules {
    /// Trim and bounds-check a name, returning the normalised value
    fn normalize_name(&self, raw: &str) -> Result<String> {
        let name = raw.trim();
        let len = name.chars().count();
        if len == 0 {
            return Err(Error::validation("name must not be blank"));
        }
        if len < self.name_min_len {
            return Err(Error::validation(format!(
                "name must be at least {} characters",
                self.name_min_len
            )));
        }
        if len > self.name_max_len {
            return Err(Error::validation(format!(
                "name must be at most {} characters",
                self.name_max_len
            )));
        }
        Ok(name.to_string())
    }

    fn check_description(&self, description: Option<&str>) -> Result<()> {
        match description {
            Some(text) if text.chars().count() > self.description_max_len => {
                Err(Error::validation(format!(
                    "description must be at most {} characters",
                    self.description_max_len
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Create validation: name required and bounded, client id discarded
#[derive(Debug, Clone, Default)]
pub struct ValidateCreate {
    rules: ValidationRules,
}

impl ValidateCreate {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Handler for ValidateCreate {
    fn name(&self) -> &'static str {
        "validate_create"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<()> {
        let dto = &mut ctx.dto;

        if let Some(client_id) = dto.id.take() {
            tracing::debug!(%client_id, "discarding client-supplied id on create");
        }
        dto.expected_revision = None;

        let raw = dto
            .name
            .as_deref()
            .ok_or_else(|| Error::validation("name is required"))?;
        let name = self.rules.normalize_name(raw)?;
        self.rules.check_description(dto.description.as_deref())?;

        dto.name = Some(name);
        Ok(())
    }
}

/// Update validation: id required and unchanged, present fields bounded
#[derive(Debug, Clone, Default)]
pub struct ValidateUpdate {
    rules: ValidationRules,
}

impl ValidateUpdate {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Handler for ValidateUpdate {
    fn name(&self) -> &'static str {
        "validate_update"
    }

    async fn process(&self, ctx: &mut PipelineContext) -> Result<()> {
        let id = ctx.target_id()?;
        let dto = &mut ctx.dto;

        if let Some(body_id) = dto.id {
            if body_id != id {
                return Err(Error::validation("identifier is immutable"));
            }
        }
        if !dto.has_changes() {
            return Err(Error::validation(
                "update must set at least one of name, description, status",
            ));
        }

        if let Some(raw) = dto.name.as_deref() {
            let name = self.rules.normalize_name(raw)?;
            dto.name = Some(name);
        }
        self.rules.check_description(dto.description.as_deref())?;
        Ok(())
    }
}
