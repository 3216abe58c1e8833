//! Credential presence checks
//!
//! The guard only verifies that each credential a route requires is carried
//! by the request. Verifying the credential itself is left to the handler.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use openapi_security::{
    DocumentBuilder, RouteConfig, SchemeKind, SecurityRequirement, SecurityResolver,
    SecurityScheme, SecuritySchemes, SpecResult, ValidationError, ValidationErrorElement,
    SECURITY_REQUIREMENT_URL,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::request::RequestCredentials;
use crate::response::ValidationRejection;

/// Effective requirement alternatives of one route
#[derive(Debug, Clone)]
pub struct CredentialGuard {
    schemes: Arc<SecuritySchemes>,
    requirements: Vec<SecurityRequirement>,
}

impl CredentialGuard {
    /// Guard for a route, given its override (if any) of the global list
    pub fn new(
        schemes: Arc<SecuritySchemes>,
        global: &[SecurityRequirement],
        route: Option<&[SecurityRequirement]>,
    ) -> SpecResult<Self> {
        let requirements = SecurityResolver::new(&schemes, global)?.resolve(route)?;
        Ok(Self {
            schemes,
            requirements,
        })
    }

    /// Guard for a route declared on `builder`, sharing its registry
    pub fn for_route(builder: &DocumentBuilder, route: &RouteConfig) -> SpecResult<Self> {
        Ok(Self {
            schemes: builder.shared_schemes(),
            requirements: builder.resolve(route)?,
        })
    }

    pub fn requirements(&self) -> &[SecurityRequirement] {
        &self.requirements
    }

    /// Whether every request passes
    pub fn is_public(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Pass if any one requirement has all of its credentials present
    pub fn check(&self, credentials: &RequestCredentials<'_>) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();

        for requirement in &self.requirements {
            // an unregistered name can never be satisfied
            let missing: Vec<_> = requirement
                .keys()
                .filter_map(|name| match self.schemes.get(name) {
                    Some(scheme) => missing_credential(scheme, credentials),
                    None => Some(unknown_scheme(name)),
                })
                .collect();

            if missing.is_empty() {
                debug!("Security requirement {:?} satisfied", requirement.keys().collect::<Vec<_>>());
                return Ok(());
            }

            for element in missing {
                if !errors.iter().any(|seen| seen.loc == element.loc && seen.ctx == element.ctx) {
                    errors.push(element);
                }
            }
        }

        errors.into_result()
    }
}

fn missing_credential(
    scheme: &SecurityScheme,
    credentials: &RequestCredentials<'_>,
) -> Option<ValidationErrorElement> {
    let (location, name) = match scheme.data().kind() {
        SchemeKind::ApiKey { name, location } => {
            if credentials.lookup(*location, name).is_some() {
                return None;
            }
            (location.as_str(), name.as_str())
        }
        SchemeKind::Http { scheme: auth, .. } => {
            if has_authorization(credentials.authorization(), auth) {
                return None;
            }
            ("header", "Authorization")
        }
        SchemeKind::OAuth2 { .. } | SchemeKind::OpenIdConnect { .. } => {
            if has_authorization(credentials.authorization(), "bearer") {
                return None;
            }
            ("header", "Authorization")
        }
    };

    let mut ctx = Map::new();
    ctx.insert("scheme".to_string(), Value::String(scheme.name().to_string()));
    Some(
        ValidationErrorElement::new(
            [location, name],
            format!("Missing credential for security scheme `{}`", scheme.name()),
            "missing",
            Value::Null,
        )
        .with_ctx(ctx)
        .with_url(SECURITY_REQUIREMENT_URL),
    )
}

fn unknown_scheme(name: &str) -> ValidationErrorElement {
    let mut ctx = Map::new();
    ctx.insert("scheme".to_string(), Value::String(name.to_string()));
    ValidationErrorElement::new(
        ["security", name],
        format!("Security scheme `{}` is not registered", name),
        "missing",
        Value::Null,
    )
    .with_ctx(ctx)
    .with_url(SECURITY_REQUIREMENT_URL)
}

/// `Authorization: <scheme> <credentials>` with a case-insensitive scheme
fn has_authorization(header: Option<&str>, scheme: &str) -> bool {
    header
        .and_then(|value| value.trim().split_once(' '))
        .is_some_and(|(prefix, credentials)| {
            prefix.eq_ignore_ascii_case(scheme) && !credentials.trim().is_empty()
        })
}

/// Middleware rejecting requests that satisfy none of the guard's requirements.
///
/// Install with `axum::middleware::from_fn_with_state(Arc::new(guard), enforce_security)`.
pub async fn enforce_security(
    State(guard): State<Arc<CredentialGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let outcome = guard.check(&RequestCredentials::from_parts(&parts));

    match outcome {
        Ok(()) => next.run(Request::from_parts(parts, body)).await,
        Err(errors) => {
            warn!("Rejected {} {}: {}", parts.method, parts.uri.path(), errors);
            ValidationRejection::unauthorized(errors).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderMap, HeaderValue, Request, StatusCode},
        middleware,
        routing::post,
        Router,
    };
    use openapi_security::{requirement, ApiInfo, HttpMethod, InType, SecuritySchemeData};
    use serde_json::json;
    use tower::ServiceExt;

    fn schemes() -> Arc<SecuritySchemes> {
        Arc::new(
            SecuritySchemes::from_schemes([
                SecurityScheme::new(
                    "PartnerID",
                    SecuritySchemeData::api_key("partner-id", InType::Header).unwrap(),
                )
                .unwrap(),
                SecurityScheme::new(
                    "PartnerToken",
                    SecuritySchemeData::api_key("partner-access-token", InType::Header).unwrap(),
                )
                .unwrap(),
                SecurityScheme::new("test_secure", SecuritySchemeData::http("bearer").unwrap())
                    .unwrap(),
                SecurityScheme::new(
                    "session",
                    SecuritySchemeData::api_key("sid", InType::Cookie).unwrap(),
                )
                .unwrap(),
            ])
            .unwrap(),
        )
    }

    fn global() -> Vec<SecurityRequirement> {
        vec![
            requirement([("test_secure", Vec::<String>::new())]),
            requirement([("PartnerID", Vec::<String>::new()), ("PartnerToken", vec![])]),
        ]
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for &(name, value) in pairs {
            headers.insert(name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_any_alternative_passes() {
        let guard = CredentialGuard::new(schemes(), &global(), None).unwrap();

        let bearer = headers(&[("authorization", "bearer abc")]);
        assert!(guard.check(&RequestCredentials::new(&bearer, None)).is_ok());

        let partner = headers(&[("partner-id", "1"), ("partner-access-token", "t")]);
        assert!(guard.check(&RequestCredentials::new(&partner, None)).is_ok());
    }

    #[test]
    fn test_all_entries_of_a_requirement_needed() {
        let guard = CredentialGuard::new(schemes(), &global(), None).unwrap();
        let partial = headers(&[("partner-id", "1")]);

        let errors = guard.check(&RequestCredentials::new(&partial, None)).unwrap_err();
        let locs: Vec<_> = errors.iter().map(|e| e.loc.join(".")).collect();
        assert_eq!(locs, vec!["header.Authorization", "header.partner-access-token"]);
        assert_eq!(errors.errors()[0].kind, "missing");
        assert_eq!(errors.errors()[0].ctx.as_ref().unwrap()["scheme"], "test_secure");
    }

    #[test]
    fn test_wrong_authorization_scheme_rejected() {
        let guard = CredentialGuard::new(
            schemes(),
            &[requirement([("test_secure", Vec::<String>::new())])],
            None,
        )
        .unwrap();

        for value in ["Basic abc", "Bearer", "Bearer   ", "abc"] {
            let request = headers(&[("authorization", value)]);
            assert!(guard.check(&RequestCredentials::new(&request, None)).is_err(), "{value}");
        }
    }

    #[test]
    fn test_cookie_and_query_locations() {
        let guard = CredentialGuard::new(
            schemes(),
            &[requirement([("session", Vec::<String>::new())])],
            None,
        )
        .unwrap();

        let with_cookie = headers(&[("cookie", "theme=dark; sid=xyz")]);
        assert!(guard.check(&RequestCredentials::new(&with_cookie, None)).is_ok());

        let errors = guard
            .check(&RequestCredentials::new(&HeaderMap::new(), Some("sid=xyz")))
            .unwrap_err();
        assert_eq!(errors.errors()[0].loc, vec!["cookie", "sid"]);
    }

    #[test]
    fn test_route_guard_uses_builder_registry() {
        let builder = DocumentBuilder::new(
            ApiInfo::default(),
            SecuritySchemes::from_schemes([SecurityScheme::new(
                "test_secure",
                SecuritySchemeData::http("bearer").unwrap(),
            )
            .unwrap()])
            .unwrap(),
            vec![requirement([("test_secure", Vec::<String>::new())])],
        )
        .unwrap();
        let route = RouteConfig::new(HttpMethod::Get, "/secret");

        let guard = CredentialGuard::for_route(&builder, &route).unwrap();
        let errors = guard
            .check(&RequestCredentials::new(&HeaderMap::new(), None))
            .unwrap_err();
        assert_eq!(errors.errors()[0].loc, vec!["header", "Authorization"]);

        let bearer = headers(&[("authorization", "Bearer abc")]);
        assert!(guard.check(&RequestCredentials::new(&bearer, None)).is_ok());
    }

    #[test]
    fn test_unregistered_scheme_never_satisfied() {
        let guard = CredentialGuard {
            schemes: Arc::new(SecuritySchemes::new()),
            requirements: vec![requirement([("test_secure", Vec::<String>::new())])],
        };

        let bearer = headers(&[("authorization", "Bearer abc")]);
        let errors = guard.check(&RequestCredentials::new(&bearer, None)).unwrap_err();
        assert_eq!(errors.errors()[0].loc, vec!["security", "test_secure"]);
        assert_eq!(errors.errors()[0].kind, "missing");
    }

    #[test]
    fn test_empty_override_is_public() {
        let guard = CredentialGuard::new(schemes(), &global(), Some(&[][..])).unwrap();
        assert!(guard.is_public());
        assert!(guard.check(&RequestCredentials::new(&HeaderMap::new(), None)).is_ok());
    }

    #[test]
    fn test_undefined_scheme_fails_at_setup() {
        let route = vec![requirement([("Z", Vec::<String>::new())])];
        assert!(CredentialGuard::new(schemes(), &global(), Some(route.as_slice())).is_err());
    }

    fn app(guard: CredentialGuard) -> Router {
        Router::new()
            .route("/ping", post(|| async { "pong" }))
            .layer(middleware::from_fn_with_state(Arc::new(guard), enforce_security))
    }

    #[tokio::test]
    async fn test_middleware_rejects_missing_credentials() {
        let guard = CredentialGuard::new(schemes(), &global(), None).unwrap();

        let response = app(guard)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["loc"], json!(["header", "Authorization"]));
        assert_eq!(body[1]["ctx"], json!({"scheme": "PartnerID"}));
    }

    #[tokio::test]
    async fn test_middleware_passes_satisfied_request() {
        let guard = CredentialGuard::new(schemes(), &global(), None).unwrap();

        let response = app(guard)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ping")
                    .header("partner-id", "1")
                    .header("partner-access-token", "t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"pong");
    }
}
