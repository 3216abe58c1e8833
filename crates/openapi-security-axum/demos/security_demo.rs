//! Partner API demo
//!
//! Run with `cargo run -p openapi-security-axum --example security_demo`, then:
//!
//! ```text
//! curl localhost:8000/apidoc/openapi.json
//! curl -X POST localhost:8000/ping -H 'partner-id: 1' -H 'partner-access-token: t' \
//!      -H 'content-type: application/json' -d '{"name": "demo"}'
//! curl -X POST localhost:8000/ping/oauth -H 'authorization: Bearer token'
//! ```

use axum::{
    extract::rejection::JsonRejection,
    middleware,
    routing::{get, post},
    Json, Router,
};
use openapi_security::{
    requirement, ApiInfo, DocumentBuilder, HttpMethod, RouteConfig, SecurityScheme,
    SecuritySchemes, Server, Tag, ValidationErrorElement,
};
use openapi_security_axum::{apidoc_router, enforce_security, CredentialGuard, ValidationRejection};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct Ping {
    name: String,
}

async fn index() -> &'static str {
    "openapi-security demo"
}

async fn ping(payload: Result<Json<Ping>, JsonRejection>) -> Result<Json<Value>, ValidationRejection> {
    let Json(ping) = payload?;
    if ping.name.trim().is_empty() {
        return Err(ValidationRejection::new(ValidationErrorElement::new(
            ["body", "name"],
            "name must not be blank",
            "value_error",
            json!(ping.name),
        )));
    }
    Ok(Json(json!({ "msg": format!("pong {}", ping.name) })))
}

async fn ping_oauth() -> Json<Value> {
    Json(json!({ "msg": "pong" }))
}

fn partner_schemes() -> anyhow::Result<SecuritySchemes> {
    let definitions = [
        ("PartnerID", json!({"type": "apiKey", "name": "partner-id", "in": "header"})),
        (
            "PartnerToken",
            json!({"type": "apiKey", "name": "partner-access-token", "in": "header"}),
        ),
        ("test_secure", json!({"type": "http", "scheme": "bearer"})),
        (
            "auth_oauth2",
            json!({
                "type": "oauth2",
                "flows": {
                    "authorizationCode": {
                        "authorizationUrl": "https://accounts.google.com/o/oauth2/v2/auth",
                        "tokenUrl": "https://sts.googleapis.com",
                        "scopes": {
                            "https://www.googleapis.com/auth/tasks.readonly": "tasks"
                        }
                    }
                }
            }),
        ),
    ];

    let schemes = definitions
        .iter()
        .map(|(name, data)| SecurityScheme::from_raw(*name, data))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SecuritySchemes::from_schemes(schemes)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let schemes = partner_schemes()?;
    let global = vec![
        requirement([("test_secure", Vec::<String>::new())]),
        requirement([("PartnerID", Vec::<String>::new()), ("PartnerToken", vec![])]),
    ];

    let index_route = RouteConfig::new(HttpMethod::Get, "/").summary("Service index").no_security();
    let ping_route = RouteConfig::new(HttpMethod::Post, "/ping")
        .summary("Partner ping")
        .tag("ping")
        .validated();
    let oauth_route = RouteConfig::new(HttpMethod::Post, "/ping/oauth")
        .summary("OAuth ping")
        .tag("ping")
        .security(vec![requirement([("auth_oauth2", vec!["read"])])]);

    let info = ApiInfo {
        title: "Partner API".to_string(),
        ..ApiInfo::default()
    };
    let builder = DocumentBuilder::new(info, schemes, global)?
        .server(Server::new("http://localhost:8000").description("Local demo"))?
        .tag(Tag::new("ping").description("Liveness checks"))?
        .route(index_route.clone())?
        .route(ping_route.clone())?
        .route(oauth_route.clone())?;

    let guard = |route: &RouteConfig| -> anyhow::Result<Arc<CredentialGuard>> {
        Ok(Arc::new(CredentialGuard::for_route(&builder, route)?))
    };

    let app = Router::new()
        .route(
            "/",
            get(index).layer(middleware::from_fn_with_state(guard(&index_route)?, enforce_security)),
        )
        .route(
            "/ping",
            post(ping).layer(middleware::from_fn_with_state(guard(&ping_route)?, enforce_security)),
        )
        .route(
            "/ping/oauth",
            post(ping_oauth)
                .layer(middleware::from_fn_with_state(guard(&oauth_route)?, enforce_security)),
        )
        .merge(apidoc_router(builder.build(), "/apidoc/openapi.json"));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
    info!("Partner API listening on http://localhost:8000");
    axum::serve(listener, app).await?;

    Ok(())
}
