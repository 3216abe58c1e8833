//! Route configuration records

use crate::metadata::Tag;
use crate::requirement::SecurityRequirement;
use serde::{Deserialize, Serialize};

/// HTTP methods supported by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Upper-case method token
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Key of the operation inside an OpenAPI path item
    pub fn path_item_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Documentation and security metadata for one route handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Bare names or full tag objects
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub deprecated: bool,
    /// Overrides the global requirements when set; `Some(vec![])` disables security
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    /// Whether the handler validates its input and may answer with a validation error
    #[serde(default)]
    pub validated: bool,
}

impl RouteConfig {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            security: None,
            validated: false,
        }
    }

    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn security(mut self, security: Vec<SecurityRequirement>) -> Self {
        self.security = Some(security);
        self
    }

    /// Mark the route as public regardless of the global requirements
    pub fn no_security(self) -> Self {
        self.security(Vec::new())
    }

    pub fn validated(mut self) -> Self {
        self.validated = true;
        self
    }

    /// Operation id used in the document, derived from method and path when unset
    pub fn effective_operation_id(&self) -> String {
        self.operation_id.clone().unwrap_or_else(|| {
            let segments: Vec<&str> = self
                .path
                .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .filter(|segment| !segment.is_empty())
                .collect();
            if segments.is_empty() {
                self.method.path_item_key().to_string()
            } else {
                format!("{}_{}", self.method.path_item_key(), segments.join("_"))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::requirement;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let route = RouteConfig::new(HttpMethod::Post, "/ping/oauth")
            .summary("Ping with OAuth2")
            .tag("ping")
            .security(vec![requirement([("auth_oauth2", vec!["read"])])])
            .validated();

        assert_eq!(route.method, HttpMethod::Post);
        assert_eq!(route.tags, vec![Tag::new("ping")]);
        assert_eq!(route.security.as_ref().unwrap()[0]["auth_oauth2"], vec!["read"]);
        assert!(route.validated);
        assert!(!route.deprecated);
    }

    #[test]
    fn test_effective_operation_id() {
        assert_eq!(
            RouteConfig::new(HttpMethod::Get, "/users/{id}").effective_operation_id(),
            "get_users_id"
        );
        assert_eq!(RouteConfig::new(HttpMethod::Get, "/").effective_operation_id(), "get");
        assert_eq!(
            RouteConfig::new(HttpMethod::Get, "/")
                .operation_id("index")
                .effective_operation_id(),
            "index"
        );
    }

    #[test]
    fn test_deserialize_distinguishes_missing_and_empty_security() {
        let inherit: RouteConfig =
            serde_json::from_value(json!({"method": "get", "path": "/"})).unwrap();
        assert!(inherit.security.is_none());

        let public: RouteConfig =
            serde_json::from_value(json!({"method": "get", "path": "/", "security": []})).unwrap();
        assert_eq!(public.security, Some(vec![]));
    }

    #[test]
    fn test_deserialize_mixed_tags() {
        let route: RouteConfig = serde_json::from_value(json!({
            "method": "post",
            "path": "/ping",
            "tags": ["ping", {"name": "partner", "description": "Partner API"}]
        }))
        .unwrap();

        assert_eq!(route.tags[0], Tag::new("ping"));
        assert_eq!(route.tags[1].description.as_deref(), Some("Partner API"));
    }
}
