//! Structured error responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use openapi_security::{SpecError, ValidationError, ValidationErrorElement};
use serde_json::{Map, Value};
use tracing::error;

/// A request rejected with a list of validation failures as its JSON body
#[derive(Debug, Clone)]
pub struct ValidationRejection {
    status: StatusCode,
    errors: ValidationError,
}

impl ValidationRejection {
    /// Rejection with the default `422 Unprocessable Entity` status
    pub fn new(errors: impl Into<ValidationError>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            errors: errors.into(),
        }
    }

    /// Rejection for requests that do not carry the credentials a route requires
    pub fn unauthorized(errors: impl Into<ValidationError>) -> Self {
        Self::new(errors).with_status(StatusCode::UNAUTHORIZED)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn errors(&self) -> &ValidationError {
        &self.errors
    }
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.errors)).into_response()
    }
}

impl From<ValidationError> for ValidationRejection {
    fn from(errors: ValidationError) -> Self {
        Self::new(errors)
    }
}

impl From<SpecError> for ValidationRejection {
    fn from(err: SpecError) -> Self {
        match err {
            SpecError::Request(errors) => Self::new(errors),
            other => {
                error!("Security declaration error while serving a request: {}", other);
                Self::new(ValidationErrorElement::new(
                    Vec::<String>::new(),
                    other.to_string(),
                    "internal_error",
                    Value::Null,
                ))
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl From<JsonRejection> for ValidationRejection {
    fn from(rejection: JsonRejection) -> Self {
        let mut ctx = Map::new();
        ctx.insert("status".to_string(), rejection.status().as_u16().into());
        Self::new(
            ValidationErrorElement::new(["body"], rejection.body_text(), "json_invalid", Value::Null)
                .with_ctx(ctx),
        )
    }
}
