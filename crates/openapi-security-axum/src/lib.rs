//! # openapi-security-axum
//!
//! axum integration for `openapi-security`: serves the generated document,
//! checks that requests carry the credentials their route requires, and
//! renders validation failures as JSON error responses.

mod guard;
mod request;
mod response;
mod server;

pub use guard::{enforce_security, CredentialGuard};
pub use request::{Cookies, MultiDict, QueryParams, RequestCredentials};
pub use response::ValidationRejection;
pub use server::{apidoc_router, SpecServer};
