//! Declarative configuration
//!
//! A service can describe its document, security schemes, global security
//! and routes in one JSON or YAML file. Every field has a default, so an
//! empty file is a valid configuration.

use crate::document::{check_validation_error_status, ApiInfo, DocumentBuilder};
use crate::error::{SpecError, SpecResult};
use crate::metadata::{Server, Tag};
use crate::registry::SecuritySchemes;
use crate::requirement::SecurityRequirement;
use crate::route::RouteConfig;
use crate::scheme::{RawSecurityScheme, SecurityScheme};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Service-level documentation and security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecConfig {
    /// Document title
    pub title: String,
    /// Service version
    pub version: String,
    pub description: Option<String>,
    /// OpenAPI version written to the document
    pub openapi_version: String,
    /// URL prefix the document is served under
    pub path: String,
    /// Status code of validation error responses
    pub validation_error_status: u16,
    /// Named scheme definitions, validated by [`SpecConfig::schemes`]
    pub security_schemes: Vec<RawSecurityScheme>,
    /// Global requirement alternatives
    pub security: Vec<SecurityRequirement>,
    /// Top-level tag declarations
    pub tags: Vec<Tag>,
    pub servers: Vec<Server>,
    pub routes: Vec<RouteConfig>,
}

impl Default for SpecConfig {
    fn default() -> Self {
        let info = ApiInfo::default();
        Self {
            title: info.title,
            version: info.version,
            description: None,
            openapi_version: info.openapi_version,
            path: "apidoc".to_string(),
            validation_error_status: 422,
            security_schemes: Vec::new(),
            security: Vec::new(),
            tags: Vec::new(),
            servers: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl SpecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration (auto-detects JSON/YAML)
    pub fn parse(content: &str) -> SpecResult<Self> {
        if content.trim().starts_with('{') {
            Self::parse_json(content)
        } else {
            Self::parse_yaml(content)
        }
    }

    pub fn parse_json(content: &str) -> SpecResult<Self> {
        let config: SpecConfig = serde_json::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn parse_yaml(content: &str) -> SpecResult<Self> {
        // serde_yaml rejects an empty document; treat it as all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SpecConfig = serde_yaml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Load from a file; `.yaml`/`.yml` and `.json` pick the format, anything else is sniffed
    pub fn load(path: &Path) -> SpecResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&contents)?,
            Some("json") => Self::parse_json(&contents)?,
            _ => Self::parse(&contents)?,
        };
        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    fn check(&self) -> SpecResult<()> {
        check_validation_error_status(self.validation_error_status)?;
        if self.path.contains(char::is_whitespace) {
            return Err(SpecError::InvalidFormat(format!(
                "path must not contain whitespace: {:?}",
                self.path
            )));
        }
        Ok(())
    }

    /// Add a scheme definition without validating it yet
    pub fn with_scheme(mut self, name: impl Into<String>, data: Value) -> Self {
        self.security_schemes.push(RawSecurityScheme {
            name: name.into(),
            data,
        });
        self
    }

    pub fn info(&self) -> ApiInfo {
        ApiInfo {
            title: self.title.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            openapi_version: self.openapi_version.clone(),
        }
    }

    /// Validate every scheme definition, failing on the first bad one
    pub fn schemes(&self) -> SpecResult<SecuritySchemes> {
        SecuritySchemes::from_schemes(
            self.security_schemes
                .iter()
                .map(|raw| SecurityScheme::from_raw(raw.name.clone(), &raw.data))
                .collect::<SpecResult<Vec<_>>>()?,
        )
    }

    /// Document builder with every configured route registered
    pub fn document_builder(&self) -> SpecResult<DocumentBuilder> {
        // global security is checked here, route overrides on registration
        let mut builder = DocumentBuilder::new(self.info(), self.schemes()?, self.security.clone())?
            .validation_error_status(self.validation_error_status)?;
        for server in &self.servers {
            builder = builder.server(server.clone())?;
        }
        for tag in &self.tags {
            builder = builder.tag(tag.clone())?;
        }
        for route in &self.routes {
            builder.register(route.clone())?;
        }
        Ok(builder)
    }

    pub fn document(&self) -> SpecResult<Value> {
        Ok(self.document_builder()?.build())
    }

    /// Route the document is served at, e.g. `/apidoc/openapi.json`
    pub fn document_route(&self) -> String {
        let prefix = self.path.trim_matches('/');
        if prefix.is_empty() {
            "/openapi.json".to_string()
        } else {
            format!("/{}/openapi.json", prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecureType;
    use serde_json::json;
    use std::io::Write;

    const SAMPLE_CONFIG: &str = r#"
title: Partner API
version: "2.0.0"
path: docs
securitySchemes:
  - name: PartnerID
    data:
      type: apiKey
      name: partner-id
      in: header
  - name: PartnerToken
    data:
      type: apiKey
      name: partner-access-token
      in: header
  - name: auth_oauth2
    data:
      type: oauth2
      flows:
        authorizationCode:
          authorizationUrl: https://accounts.google.com/o/oauth2/v2/auth
          tokenUrl: https://sts.googleapis.com
          scopes:
            https://www.googleapis.com/auth/tasks.readonly: tasks
security:
  - PartnerID: []
    PartnerToken: []
servers:
  - url: https://partner.example.com
    description: Production
tags:
  - name: ping
    description: Liveness checks
    externalDocs:
      url: https://docs.example.com/ping
routes:
  - method: post
    path: /ping
    validated: true
    tags: [ping]
  - method: post
    path: /ping/oauth
    security:
      - auth_oauth2: [read]
"#;

    #[test]
    fn test_defaults() {
        let config = SpecConfig::parse("").unwrap();
        assert_eq!(config.title, "Service API");
        assert_eq!(config.openapi_version, "3.1.0");
        assert_eq!(config.validation_error_status, 422);
        assert_eq!(config.document_route(), "/apidoc/openapi.json");
        assert!(config.schemes().unwrap().is_empty());
    }

    #[test]
    fn test_parse_yaml() {
        let config = SpecConfig::parse(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.title, "Partner API");
        assert_eq!(config.document_route(), "/docs/openapi.json");

        let schemes = config.schemes().unwrap();
        let names: Vec<_> = schemes.names().collect();
        assert_eq!(names, vec!["PartnerID", "PartnerToken", "auth_oauth2"]);
        assert_eq!(schemes.data("auth_oauth2").unwrap().secure_type(), SecureType::OAuth2);
    }

    #[test]
    fn test_document_from_config() {
        let document = SpecConfig::parse(SAMPLE_CONFIG).unwrap().document().unwrap();

        assert_eq!(document["info"]["title"], "Partner API");
        assert_eq!(
            document["security"],
            json!([{"PartnerID": [], "PartnerToken": []}])
        );
        assert_eq!(
            document["paths"]["/ping/oauth"]["post"]["security"],
            json!([{"auth_oauth2": ["read"]}])
        );
        assert_eq!(
            document["components"]["securitySchemes"]["auth_oauth2"]["flows"]["authorizationCode"]
                ["scopes"]["https://www.googleapis.com/auth/tasks.readonly"],
            "tasks"
        );
    }

    #[test]
    fn test_tags_and_servers_from_config() {
        let document = SpecConfig::parse(SAMPLE_CONFIG).unwrap().document().unwrap();

        assert_eq!(document["servers"][0]["url"], "https://partner.example.com");
        assert_eq!(
            document["tags"],
            json!([{
                "name": "ping",
                "description": "Liveness checks",
                "externalDocs": {"url": "https://docs.example.com/ping"}
            }])
        );
        assert_eq!(document["paths"]["/ping"]["post"]["tags"], json!(["ping"]));
    }

    #[test]
    fn test_duplicate_route_in_config_rejected() {
        let config = SpecConfig::parse(
            r#"
routes:
  - method: get
    path: /
  - method: get
    path: /
"#,
        )
        .unwrap();

        assert!(matches!(config.document(), Err(SpecError::DuplicateRoute { .. })));
    }

    #[test]
    fn test_parse_json() {
        let config = SpecConfig::parse(
            r#"{"title": "JSON API", "securitySchemes": [{"name": "bearer", "data": {"type": "http", "scheme": "bearer"}}]}"#,
        )
        .unwrap();
        assert_eq!(config.title, "JSON API");
        assert_eq!(config.schemes().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_scheme_names_the_scheme() {
        let config = SpecConfig::new().with_scheme("PartnerID", json!({"type": "apiKey", "name": "partner-id"}));

        match config.schemes().unwrap_err() {
            SpecError::SchemaShape { name, .. } => assert_eq!(name, "PartnerID"),
            other => panic!("Expected SchemaShape, got {other:?}"),
        }
    }

    #[test]
    fn test_undefined_route_reference_fails() {
        let config = SpecConfig::parse(
            r#"
routes:
  - method: get
    path: /
    security:
      - Z: []
"#,
        )
        .unwrap();

        assert!(matches!(
            config.document(),
            Err(SpecError::UndefinedSchemeReference(name)) if name == "Z"
        ));
    }

    #[test]
    fn test_invalid_status_rejected() {
        let err = SpecConfig::parse(r#"{"validationErrorStatus": 200}"#).unwrap_err();
        assert!(matches!(err, SpecError::InvalidFormat(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();

        let config = SpecConfig::load(file.path()).unwrap();
        assert_eq!(config.routes.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SpecConfig::load(Path::new("/nonexistent/openapi-security.yaml")).unwrap_err();
        assert!(matches!(err, SpecError::IoError(_)));
    }
}
