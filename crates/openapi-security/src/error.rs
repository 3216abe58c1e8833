//! Error types for security declarations

use crate::validation::ValidationError;
use thiserror::Error;

/// Result type alias for setup-time operations
pub type SpecResult<T> = std::result::Result<T, SpecError>;

/// Errors raised while declaring, resolving or loading security metadata
///
/// Everything except [`SpecError::Request`] is a static authoring defect and
/// should abort startup.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Invalid security scheme `{name}`: {errors}")]
    SchemaShape {
        name: String,
        errors: ValidationError,
    },

    #[error("Security scheme name `{0}` does not match OpenAPI rules [A-Za-z0-9-._]+")]
    NameFormat(String),

    #[error("Security requirement references undefined scheme `{0}`")]
    UndefinedSchemeReference(String),

    #[error("Security scheme `{0}` is already registered")]
    DuplicateScheme(String),

    #[error("Route {method} {path} is already registered")]
    DuplicateRoute { method: String, path: String },

    #[error("Request validation failed: {0}")]
    Request(ValidationError),

    #[error("Invalid configuration: {0}")]
    InvalidFormat(String),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SpecError {
    /// Whether the error happened while serving a request rather than at setup
    pub fn is_request_error(&self) -> bool {
        matches!(self, SpecError::Request(_))
    }

    /// Structured failures carried by the error, if any
    pub fn validation_errors(&self) -> Option<&ValidationError> {
        match self {
            SpecError::SchemaShape { errors, .. } | SpecError::Request(errors) => Some(errors),
            _ => None,
        }
    }
}
