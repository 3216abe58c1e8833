//! # openapi-security
//!
//! OpenAPI security declarations for route handlers.
//! Validates security scheme objects and their names, resolves per-route
//! security requirements and assembles the `securitySchemes` and `security`
//! sections of the generated document.
//!
//! Credentials are never verified here; the embedding application owns that.

mod config;
mod document;
mod error;
mod metadata;
mod registry;
mod requirement;
mod route;
mod scheme;
mod security;
mod validation;

pub use config::SpecConfig;
pub use document::{validation_error_schemas, ApiInfo, DocumentBuilder};
pub use error::{SpecError, SpecResult};
pub use metadata::{ExternalDocs, Server, Tag};
pub use registry::SecuritySchemes;
pub use requirement::{requirement, resolve, SecurityRequirement, SecurityResolver};
pub use route::{HttpMethod, RouteConfig};
pub use scheme::{is_valid_scheme_name, RawSecurityScheme, SecurityScheme};
pub use security::{InType, OAuth2Flow, OAuth2Flows, SchemeKind, SecureType, SecuritySchemeData};
pub use validation::{
    ValidationError, ValidationErrorElement, DEFAULT_ERROR_URL, SECURITY_REQUIREMENT_URL,
    SECURITY_SCHEME_URL,
};
