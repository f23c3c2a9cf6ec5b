//! Error types and HTTP response conversion
//!
//! Every pipeline stage, strategy and controller call returns [`Result`]. Errors
//! pass through the chain unchanged; only the HTTP boundary turns them into a
//! status code and an [`ErrorResponse`] body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::repository::{RepositoryError, RepositoryErrorKind};

/// Result type alias using the service error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
#[derive(Debug, Error)]
pub enum Error {
    /// Client input fails a business rule
    #[error("Validation error: {0}")]
    Validation(String),

    /// The targeted record does not exist
    #[error("Not found: {entity_type} {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The version token has no bound strategy
    #[error("Unsupported API version: {0}")]
    UnsupportedVersion(String),

    /// Repository-layer failure other than not-found
    #[error("{0}")]
    Persistence(RepositoryError),

    /// An audit or publish stage failed under the fail-closed policy
    #[error("Side effect '{stage}' failed: {message}")]
    SideEffect { stage: &'static str, message: String },

    /// Event publishing failed
    #[error("Messaging error: {0}")]
    Messaging(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing record
    pub fn not_found(entity_type: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::UnsupportedVersion(_) => "UNSUPPORTED_VERSION",
            Self::Persistence(e) => match e.kind {
                RepositoryErrorKind::Conflict => "REVISION_CONFLICT",
                RepositoryErrorKind::AlreadyExists => "ALREADY_EXISTS",
                RepositoryErrorKind::ConstraintViolation => "CONSTRAINT_VIOLATION",
                _ => "PERSISTENCE_ERROR",
            },
            Self::SideEffect { .. } => "SIDE_EFFECT_FAILED",
            Self::Messaging(_) => "MESSAGING_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::UnsupportedVersion(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(e) => match e.kind {
                RepositoryErrorKind::Conflict
                | RepositoryErrorKind::AlreadyExists
                | RepositoryErrorKind::ConstraintViolation => StatusCode::CONFLICT,
                RepositoryErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                RepositoryErrorKind::ConnectionFailed => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SideEffect { .. } | Self::Messaging(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        if err.is_not_found() {
            let id = err.entity_id.clone().unwrap_or_default();
            return Self::NotFound {
                entity_type: crate::model::ENTITY_TYPE,
                id,
            };
        }
        Self::Persistence(err)
    }
}

// Manual From implementation for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // User-facing message (don't expose internal details)
        let message = match &self {
            Error::Persistence(e) => {
                tracing::error!(
                    operation = %e.operation,
                    kind = %e.kind,
                    retriable = e.is_retriable(),
                    "Persistence error: {}", e.message
                );
                match e.kind {
                    RepositoryErrorKind::Conflict => e.message.clone(),
                    RepositoryErrorKind::AlreadyExists
                    | RepositoryErrorKind::ConstraintViolation => {
                        "Operation conflicts with existing data".to_string()
                    }
                    _ => "Persistence operation failed".to_string(),
                }
            }
            Error::SideEffect { stage, message } => {
                tracing::error!(stage, "Side effect failed: {}", message);
                format!("Side effect '{}' failed", stage)
            }
            Error::Messaging(_) | Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                "Internal server error".to_string()
            }
            Error::Validation(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = ErrorResponse::with_code(status, code, message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    #[test]
    fn test_repository_not_found_lifts_to_not_found() {
        let err: Error = RepositoryError::not_found("DataProduct", "abc").into();
        assert!(matches!(err, Error::NotFound { id, .. } if id == "abc"));
    }

    #[test]
    fn test_repository_conflict_stays_persistence() {
        let err: Error = RepositoryError::revision_conflict("DataProduct", "abc", 1, 2).into();
        assert!(matches!(err, Error::Persistence(_)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "REVISION_CONFLICT");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::validation("bad").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            Error::not_found("DataProduct", "x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::UnsupportedVersion("v3".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let outage: Error =
            RepositoryError::timeout(RepositoryOperation::Update, "slow").into();
        assert_eq!(outage.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_into_response_status() {
        let response = Error::validation("name is immutable in v2").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = Error::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::not_found("DataProduct", "abc").to_string(),
            "Not found: DataProduct abc"
        );
        assert_eq!(
            Error::UnsupportedVersion("v3".into()).to_string(),
            "Unsupported API version: v3"
        );
    }
}
