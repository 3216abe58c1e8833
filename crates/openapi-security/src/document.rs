//! OpenAPI document assembly
//!
//! Emits the `securitySchemes` and `security` sections together with the
//! path items of registered routes. Every route's security override is
//! checked when the route is registered, not when the document is built.

use crate::error::{SpecError, SpecResult};
use crate::metadata::{Server, Tag};
use crate::registry::SecuritySchemes;
use crate::requirement::{SecurityRequirement, SecurityResolver};
use crate::route::RouteConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

const VALIDATION_ERROR_REF: &str = "#/components/schemas/ValidationError";

/// Document `info` section plus the OpenAPI version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub openapi_version: String,
}

impl Default for ApiInfo {
    fn default() -> Self {
        Self {
            title: "Service API".to_string(),
            version: "0.1.0".to_string(),
            description: None,
            openapi_version: "3.1.0".to_string(),
        }
    }
}

/// Collects routes and assembles the document
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    info: ApiInfo,
    schemes: Arc<SecuritySchemes>,
    security: Vec<SecurityRequirement>,
    routes: Vec<RouteConfig>,
    tags: Vec<Tag>,
    servers: Vec<Server>,
    validation_error_status: u16,
}

/// Validation errors must be documented with a client or server error code
pub(crate) fn check_validation_error_status(status: u16) -> SpecResult<()> {
    if (400..=599).contains(&status) {
        Ok(())
    } else {
        Err(SpecError::InvalidFormat(format!(
            "validationErrorStatus must be a 4xx or 5xx code, got {}",
            status
        )))
    }
}

impl DocumentBuilder {
    /// Fails when the global requirements reference an unknown scheme
    pub fn new(
        info: ApiInfo,
        schemes: SecuritySchemes,
        security: Vec<SecurityRequirement>,
    ) -> SpecResult<Self> {
        SecurityResolver::new(&schemes, &security)?;
        Ok(Self {
            info,
            schemes: Arc::new(schemes),
            security,
            routes: Vec::new(),
            tags: Vec::new(),
            servers: Vec::new(),
            validation_error_status: 422,
        })
    }

    /// Status code documented for validation failures, 400 to 599
    pub fn validation_error_status(mut self, status: u16) -> SpecResult<Self> {
        check_validation_error_status(status)?;
        self.validation_error_status = status;
        Ok(self)
    }

    /// Declare a top-level tag; names are unique
    pub fn tag(mut self, tag: Tag) -> SpecResult<Self> {
        tag.check()?;
        if self.tags.iter().any(|declared| declared.name == tag.name) {
            return Err(SpecError::InvalidFormat(format!(
                "tag `{}` is declared twice",
                tag.name
            )));
        }
        self.tags.push(tag);
        Ok(self)
    }

    pub fn server(mut self, server: Server) -> SpecResult<Self> {
        server.check()?;
        self.servers.push(server);
        Ok(self)
    }

    /// Register a route, checking its security override
    ///
    /// A second route with the same method and path is rejected.
    pub fn register(&mut self, route: RouteConfig) -> SpecResult<()> {
        if self
            .routes
            .iter()
            .any(|known| known.method == route.method && known.path == route.path)
        {
            return Err(SpecError::DuplicateRoute {
                method: route.method.to_string(),
                path: route.path,
            });
        }
        for tag in &route.tags {
            tag.check()?;
        }
        let effective = self.resolve(&route)?;
        debug!(
            "Registered {} {} with {} security alternative(s)",
            route.method,
            route.path,
            effective.len()
        );
        self.routes.push(route);
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn route(mut self, route: RouteConfig) -> SpecResult<Self> {
        self.register(route)?;
        Ok(self)
    }

    /// Effective requirement list for `route`
    pub fn resolve(&self, route: &RouteConfig) -> SpecResult<Vec<SecurityRequirement>> {
        self.resolver().resolve(route.security.as_deref())
    }

    pub fn resolver(&self) -> SecurityResolver<'_> {
        SecurityResolver::trusted(&self.schemes, &self.security)
    }

    pub fn schemes(&self) -> &SecuritySchemes {
        &self.schemes
    }

    /// Registry shared with request-time guards
    pub fn shared_schemes(&self) -> Arc<SecuritySchemes> {
        Arc::clone(&self.schemes)
    }

    pub fn security(&self) -> &[SecurityRequirement] {
        &self.security
    }

    pub fn routes(&self) -> &[RouteConfig] {
        &self.routes
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Declared tags, then undeclared route tags in registration order
    fn document_tags(&self) -> Vec<&Tag> {
        let mut tags: Vec<&Tag> = self.tags.iter().collect();
        for tag in self.routes.iter().flat_map(|route| &route.tags) {
            if !tags.iter().any(|seen| seen.name == tag.name) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Assemble the OpenAPI document
    pub fn build(&self) -> Value {
        // routes sharing a path merge into one path item
        let mut paths = Map::new();
        for route in &self.routes {
            let item = paths
                .entry(route.path.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(item) = item {
                item.insert(
                    route.method.path_item_key().to_string(),
                    self.operation(route),
                );
            }
        }

        let mut components = Map::new();
        if !self.schemes.is_empty() {
            components.insert(
                "securitySchemes".to_string(),
                Value::Object(self.schemes.to_components()),
            );
        }
        components.insert("schemas".to_string(), validation_error_schemas());

        let mut info = Map::new();
        info.insert("title".to_string(), json!(self.info.title));
        info.insert("version".to_string(), json!(self.info.version));
        if let Some(description) = &self.info.description {
            info.insert("description".to_string(), json!(description));
        }

        let mut document = Map::new();
        document.insert("openapi".to_string(), json!(self.info.openapi_version));
        document.insert("info".to_string(), Value::Object(info));
        if !self.servers.is_empty() {
            document.insert("servers".to_string(), json!(self.servers));
        }
        let tags = self.document_tags();
        if !tags.is_empty() {
            document.insert("tags".to_string(), json!(tags));
        }
        document.insert("paths".to_string(), Value::Object(paths));
        document.insert("components".to_string(), Value::Object(components));
        if !self.security.is_empty() {
            document.insert("security".to_string(), json!(self.security));
        }

        info!(
            "Built OpenAPI document: {} route(s), {} security scheme(s)",
            self.routes.len(),
            self.schemes.len()
        );
        Value::Object(document)
    }

    fn operation(&self, route: &RouteConfig) -> Value {
        let mut operation = Map::new();
        operation.insert(
            "operationId".to_string(),
            json!(route.effective_operation_id()),
        );
        if let Some(summary) = &route.summary {
            operation.insert("summary".to_string(), json!(summary));
        }
        if let Some(description) = &route.description {
            operation.insert("description".to_string(), json!(description));
        }
        if !route.tags.is_empty() {
            let names: Vec<&str> = route.tags.iter().map(|tag| tag.name.as_str()).collect();
            operation.insert("tags".to_string(), json!(names));
        }
        if route.deprecated {
            operation.insert("deprecated".to_string(), json!(true));
        }

        let mut responses = Map::new();
        responses.insert(
            "200".to_string(),
            json!({"description": "Successful Response"}),
        );
        if route.validated {
            responses.insert(
                self.validation_error_status.to_string(),
                json!({
                    "description": "Validation Error",
                    "content": {
                        "application/json": {
                            "schema": {"$ref": VALIDATION_ERROR_REF}
                        }
                    }
                }),
            );
        }
        operation.insert("responses".to_string(), Value::Object(responses));

        if let Some(security) = &route.security {
            operation.insert("security".to_string(), json!(security));
        }
        Value::Object(operation)
    }
}

/// JSON schemas of the validation error body
pub fn validation_error_schemas() -> Value {
    json!({
        "ValidationErrorElement": {
            "title": "ValidationErrorElement",
            "description": "Model of a validation error response element.",
            "type": "object",
            "properties": {
                "loc": {"title": "Error location", "type": "array", "items": {"type": "string"}},
                "msg": {"title": "Error message", "type": "string"},
                "type": {"title": "Error type", "type": "string"},
                "input": {"title": "Input provided for validation"},
                "ctx": {"title": "Error context", "anyOf": [{"type": "object"}, {"type": "null"}]},
                "url": {"title": "Error URL", "type": "string", "format": "uri"}
            },
            "required": ["loc", "msg", "type", "input", "ctx", "url"]
        },
        "ValidationError": {
            "title": "ValidationError",
            "description": "Model of a validation error response.",
            "type": "array",
            "items": {"$ref": "#/components/schemas/ValidationErrorElement"}
        }
    })
}
