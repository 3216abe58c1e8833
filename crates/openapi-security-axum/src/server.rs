//! Document serving

use axum::{extract::State, routing::get, Json, Router};
use openapi_security::{SpecConfig, SpecResult};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Router serving `document` as JSON at `route`
pub fn apidoc_router(document: Value, route: &str) -> Router {
    Router::new()
        .route(route, get(serve_document))
        .with_state(Arc::new(document))
}

async fn serve_document(State(document): State<Arc<Value>>) -> Json<Value> {
    Json(document.as_ref().clone())
}

/// Health check endpoint
async fn health() -> &'static str {
    "OK"
}

/// Standalone server for a generated document
pub struct SpecServer {
    document: Value,
    document_route: String,
    port: u16,
}

impl SpecServer {
    pub fn new(document: Value, document_route: impl Into<String>) -> Self {
        Self {
            document,
            document_route: document_route.into(),
            port: 8000,
        }
    }

    /// Build the document described by `config`
    pub fn from_config(config: &SpecConfig) -> SpecResult<Self> {
        Ok(Self::new(config.document()?, config.document_route()))
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn document_route(&self) -> &str {
        &self.document_route
    }

    /// Health routes plus the document route
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(health))
            .route("/health", get(health))
            .merge(apidoc_router(self.document.clone(), &self.document_route))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Run the HTTP server
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        let addr = format!("0.0.0.0:{}", self.port);
        info!("Serving OpenAPI document at http://{}{}", addr, self.document_route);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
