//! Security scheme data model
//!
//! [`SecuritySchemeData`] is one OpenAPI Security Scheme Object. The fields a
//! scheme type requires live in [`SchemeKind`] as non-optional values, so a
//! constructed value always satisfies the per-type invariant. Keys that do not
//! belong to the declared type are kept verbatim in an extension map.
//!
//! See <https://spec.openapis.org/oas/v3.1.0#security-scheme-object>

use crate::validation::{ValidationError, ValidationErrorElement, SECURITY_SCHEME_URL};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

const TYPE_FIELD: &str = "type";
const DESCRIPTION_FIELD: &str = "description";
const NAME_FIELD: &str = "name";
const IN_FIELD: &str = "in";
const SCHEME_FIELD: &str = "scheme";
const BEARER_FORMAT_FIELD: &str = "bearerFormat";
const FLOWS_FIELD: &str = "flows";
const OPEN_ID_CONNECT_URL_FIELD: &str = "openIdConnectUrl";

/// Security scheme type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecureType {
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
}

impl SecureType {
    pub const ALL: [SecureType; 4] = [
        SecureType::Http,
        SecureType::ApiKey,
        SecureType::OAuth2,
        SecureType::OpenIdConnect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecureType::Http => "http",
            SecureType::ApiKey => "apiKey",
            SecureType::OAuth2 => "oauth2",
            SecureType::OpenIdConnect => "openIdConnect",
        }
    }

    /// Companion fields that must carry a truthy value for this type
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            SecureType::Http => &[SCHEME_FIELD],
            SecureType::ApiKey => &[NAME_FIELD, IN_FIELD],
            SecureType::OAuth2 => &[FLOWS_FIELD],
            SecureType::OpenIdConnect => &[OPEN_ID_CONNECT_URL_FIELD],
        }
    }

    /// Whether requirement scopes carry meaning for this type
    pub fn uses_scopes(&self) -> bool {
        matches!(self, SecureType::OAuth2 | SecureType::OpenIdConnect)
    }
}

impl fmt::Display for SecureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SecureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SecureType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown security scheme type: {s}"))
    }
}

/// Location of an API key credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InType {
    Header,
    Query,
    Cookie,
}

impl InType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InType::Header => "header",
            InType::Query => "query",
            InType::Cookie => "cookie",
        }
    }
}

impl fmt::Display for InType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(InType::Header),
            "query" => Ok(InType::Query),
            "cookie" => Ok(InType::Cookie),
            other => Err(format!("unknown API key location: {other}")),
        }
    }
}

/// OAuth2 `flows` object, kept exactly as provided
///
/// Member order, `null`s and non-standard keys all survive serialization.
/// Typed access goes through [`OAuth2Flows::flow`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OAuth2Flows(Map<String, Value>);

impl OAuth2Flows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flow(mut self, name: impl Into<String>, flow: OAuth2Flow) -> Self {
        self.0.insert(name.into(), Value::Object(flow.0));
        self
    }

    /// Raw member stored under `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Flow stored under `name`, if it is an object
    pub fn flow(&self, name: &str) -> Option<OAuth2Flow> {
        self.0
            .get(name)
            .and_then(Value::as_object)
            .map(|flow| OAuth2Flow(flow.clone()))
    }

    pub fn implicit(&self) -> Option<OAuth2Flow> {
        self.flow("implicit")
    }

    pub fn password(&self) -> Option<OAuth2Flow> {
        self.flow("password")
    }

    pub fn client_credentials(&self) -> Option<OAuth2Flow> {
        self.flow("clientCredentials")
    }

    pub fn authorization_code(&self) -> Option<OAuth2Flow> {
        self.flow("authorizationCode")
    }

    /// Object-valued members, in provided order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.0
            .iter()
            .filter_map(|(name, flow)| flow.as_object().map(|flow| (name.as_str(), flow)))
    }

    /// Whether any flow lists `scope` under its `scopes`
    pub fn declares_scope(&self, scope: &str) -> bool {
        self.iter().any(|(_, flow)| {
            flow.get("scopes")
                .and_then(Value::as_object)
                .is_some_and(|scopes| scopes.contains_key(scope))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for OAuth2Flows {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One OAuth2 flow object
///
/// Only the keys that were set are emitted; `scopes` is not defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OAuth2Flow(Map<String, Value>);

impl OAuth2Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorization_url(self, url: impl Into<String>) -> Self {
        self.with("authorizationUrl", Value::String(url.into()))
    }

    pub fn with_token_url(self, url: impl Into<String>) -> Self {
        self.with("tokenUrl", Value::String(url.into()))
    }

    pub fn with_refresh_url(self, url: impl Into<String>) -> Self {
        self.with("refreshUrl", Value::String(url.into()))
    }

    pub fn with_scope(mut self, scope: impl Into<String>, description: impl Into<String>) -> Self {
        let scopes = self
            .0
            .entry("scopes")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(scopes) = scopes {
            scopes.insert(scope.into(), Value::String(description.into()));
        }
        self
    }

    /// Set any member, including extensions
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn authorization_url(&self) -> Option<&str> {
        self.0.get("authorizationUrl").and_then(Value::as_str)
    }

    pub fn token_url(&self) -> Option<&str> {
        self.0.get("tokenUrl").and_then(Value::as_str)
    }

    pub fn refresh_url(&self) -> Option<&str> {
        self.0.get("refreshUrl").and_then(Value::as_str)
    }

    /// Scope name to description; descriptions are not required to be strings
    pub fn scopes(&self) -> Option<&Map<String, Value>> {
        self.0.get("scopes").and_then(Value::as_object)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Type-specific part of a security scheme
#[derive(Debug, Clone, PartialEq)]
pub enum SchemeKind {
    /// API key in header, query or cookie
    ApiKey { name: String, location: InType },
    /// HTTP authentication (bearer, basic, ...)
    Http {
        scheme: String,
        bearer_format: Option<String>,
    },
    /// OAuth2 authentication
    OAuth2 { flows: OAuth2Flows },
    /// OpenID Connect discovery
    OpenIdConnect { open_id_connect_url: String },
}

impl SchemeKind {
    pub fn secure_type(&self) -> SecureType {
        match self {
            SchemeKind::ApiKey { .. } => SecureType::ApiKey,
            SchemeKind::Http { .. } => SecureType::Http,
            SchemeKind::OAuth2 { .. } => SecureType::OAuth2,
            SchemeKind::OpenIdConnect { .. } => SecureType::OpenIdConnect,
        }
    }
}

/// Validated security scheme definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct SecuritySchemeData {
    kind: SchemeKind,
    description: Option<String>,
    extensions: IndexMap<String, Value>,
}

/// Python-style truthiness: null, false, zero and empty containers are absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn scheme_error<L, S>(loc: L, msg: impl Into<String>, kind: &str, input: &Value) -> ValidationErrorElement
where
    L: IntoIterator<Item = S>,
    S: Into<String>,
{
    ValidationErrorElement::new(loc, msg, kind, input.clone()).with_url(SECURITY_SCHEME_URL)
}

fn expect_string(key: &str, value: &Value, errors: &mut ValidationError) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => {
            errors.push(scheme_error([key], "Input should be a valid string", "string_type", value));
            None
        }
    }
}

fn optional_string(key: &str, value: &Value, errors: &mut ValidationError) -> Option<String> {
    if value.is_null() {
        return None;
    }
    expect_string(key, value, errors)
}

impl SecuritySchemeData {
    /// Validate an arbitrary mapping as a security scheme object.
    ///
    /// The type is checked first, then every companion field the type
    /// requires must hold a truthy value. A present but empty value (`""`,
    /// `null`, `0`) counts as missing.
    pub fn validate(raw: &Value) -> Result<Self, ValidationError> {
        let Some(fields) = raw.as_object() else {
            return Err(scheme_error(
                Vec::<String>::new(),
                "Input should be a valid mapping",
                "dict_type",
                raw,
            )
            .into());
        };

        // type first: it decides which fields are required
        let secure_type = Self::check_type(fields)?;
        Self::check_required_fields(secure_type, fields, raw)?;
        Self::build(secure_type, fields, raw)
    }

    fn check_type(fields: &Map<String, Value>) -> Result<SecureType, ValidationError> {
        let value = match fields.get(TYPE_FIELD) {
            Some(value) if is_truthy(value) => value,
            other => {
                return Err(scheme_error(
                    [TYPE_FIELD],
                    "Type field is required",
                    "missing",
                    other.unwrap_or(&Value::Null),
                )
                .into())
            }
        };

        value
            .as_str()
            .and_then(|s| s.parse::<SecureType>().ok())
            .ok_or_else(|| {
                let mut ctx = Map::new();
                ctx.insert(
                    "expected".to_string(),
                    json!("'http', 'apiKey', 'oauth2' or 'openIdConnect'"),
                );
                scheme_error([TYPE_FIELD], "invalid type", "enum", value)
                    .with_ctx(ctx)
                    .into()
            })
    }

    fn check_required_fields(
        secure_type: SecureType,
        fields: &Map<String, Value>,
        raw: &Value,
    ) -> Result<(), ValidationError> {
        let required = secure_type.required_fields();
        // present-but-falsy counts as missing, e.g. `"name": ""`
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|field| !fields.get(*field).is_some_and(is_truthy))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        let mut ctx = Map::new();
        ctx.insert(TYPE_FIELD.to_string(), json!(secure_type.as_str()));
        ctx.insert("required".to_string(), json!(required));
        ctx.insert("missing".to_string(), json!(missing));

        Err(scheme_error(
            Vec::<String>::new(),
            Self::required_message(secure_type),
            "value_error",
            raw,
        )
        .with_ctx(ctx)
        .into())
    }

    fn required_message(secure_type: SecureType) -> String {
        format!(
            "For `{}` type `{}` field(s) is required.",
            secure_type,
            secure_type.required_fields().join(", ")
        )
    }

    fn build(
        secure_type: SecureType,
        fields: &Map<String, Value>,
        raw: &Value,
    ) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::default();
        let mut extensions = IndexMap::new();
        let mut description = None;
        let mut name = None;
        let mut location = None;
        let mut scheme = None;
        let mut bearer_format = None;
        let mut flows = None;
        let mut open_id_connect_url = None;

        for (key, value) in fields {
            match (key.as_str(), secure_type) {
                (TYPE_FIELD, _) => {}
                (DESCRIPTION_FIELD, _) => description = optional_string(key, value, &mut errors),
                (NAME_FIELD, SecureType::ApiKey) => name = expect_string(key, value, &mut errors),
                (IN_FIELD, SecureType::ApiKey) => {
                    location = value.as_str().and_then(|s| s.parse::<InType>().ok());
                    if location.is_none() {
                        errors.push(scheme_error(
                            [IN_FIELD],
                            "Input should be 'header', 'query' or 'cookie'",
                            "enum",
                            value,
                        ));
                    }
                }
                (SCHEME_FIELD, SecureType::Http) => scheme = expect_string(key, value, &mut errors),
                (BEARER_FORMAT_FIELD, SecureType::Http) => {
                    bearer_format = optional_string(key, value, &mut errors)
                }
                // flow members are not interpreted, only the container shape is checked
                (FLOWS_FIELD, SecureType::OAuth2) => match value {
                    Value::Object(map) => flows = Some(OAuth2Flows::from(map.clone())),
                    _ => errors.push(scheme_error(
                        [FLOWS_FIELD],
                        "Input should be a valid dictionary",
                        "dict_type",
                        value,
                    )),
                },
                (OPEN_ID_CONNECT_URL_FIELD, SecureType::OpenIdConnect) => {
                    open_id_connect_url = expect_string(key, value, &mut errors)
                }
                _ => {
                    extensions.insert(key.clone(), value.clone());
                }
            }
        }

        errors.into_result()?;

        // required fields were checked above; a gap here means a value was dropped as null
        let kind = match (secure_type, name, location, scheme, flows, open_id_connect_url) {
            (SecureType::ApiKey, Some(name), Some(location), ..) => {
                SchemeKind::ApiKey { name, location }
            }
            (SecureType::Http, _, _, Some(scheme), ..) => SchemeKind::Http {
                scheme,
                bearer_format,
            },
            (SecureType::OAuth2, _, _, _, Some(flows), _) => SchemeKind::OAuth2 { flows },
            (SecureType::OpenIdConnect, .., Some(open_id_connect_url)) => {
                SchemeKind::OpenIdConnect {
                    open_id_connect_url,
                }
            }
            _ => {
                return Err(scheme_error(
                    Vec::<String>::new(),
                    Self::required_message(secure_type),
                    "value_error",
                    raw,
                )
                .into())
            }
        };

        Ok(Self {
            kind,
            description,
            extensions,
        })
    }

    /// API key scheme
    pub fn api_key(name: impl Into<String>, location: InType) -> Result<Self, ValidationError> {
        Self::validate(&json!({
            TYPE_FIELD: SecureType::ApiKey.as_str(),
            NAME_FIELD: name.into(),
            IN_FIELD: location.as_str(),
        }))
    }

    /// HTTP authentication scheme such as `bearer` or `basic`
    pub fn http(scheme: impl Into<String>) -> Result<Self, ValidationError> {
        Self::validate(&json!({
            TYPE_FIELD: SecureType::Http.as_str(),
            SCHEME_FIELD: scheme.into(),
        }))
    }

    /// OAuth2 scheme
    pub fn oauth2(flows: OAuth2Flows) -> Result<Self, ValidationError> {
        Self::validate(&json!({
            TYPE_FIELD: SecureType::OAuth2.as_str(),
            FLOWS_FIELD: flows,
        }))
    }

    /// OpenID Connect scheme
    pub fn open_id_connect(url: impl Into<String>) -> Result<Self, ValidationError> {
        Self::validate(&json!({
            TYPE_FIELD: SecureType::OpenIdConnect.as_str(),
            OPEN_ID_CONNECT_URL_FIELD: url.into(),
        }))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Assign one field and re-run the whole-object validation.
    ///
    /// `self` is left untouched when the result would be invalid.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ValidationError> {
        let mut fields = self.to_map();
        fields.insert(key.to_string(), value);
        *self = Self::validate(&Value::Object(fields))?;
        Ok(())
    }

    pub fn kind(&self) -> &SchemeKind {
        &self.kind
    }

    pub fn secure_type(&self) -> SecureType {
        self.kind.secure_type()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Header, query or cookie parameter name (apiKey only)
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            SchemeKind::ApiKey { name, .. } => Some(name),
            _ => None,
        }
    }

    /// API key location (apiKey only)
    pub fn field_in(&self) -> Option<InType> {
        match &self.kind {
            SchemeKind::ApiKey { location, .. } => Some(*location),
            _ => None,
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        match &self.kind {
            SchemeKind::Http { scheme, .. } => Some(scheme),
            _ => None,
        }
    }

    pub fn bearer_format(&self) -> Option<&str> {
        match &self.kind {
            SchemeKind::Http { bearer_format, .. } => bearer_format.as_deref(),
            _ => None,
        }
    }

    pub fn flows(&self) -> Option<&OAuth2Flows> {
        match &self.kind {
            SchemeKind::OAuth2 { flows } => Some(flows),
            _ => None,
        }
    }

    pub fn open_id_connect_url(&self) -> Option<&str> {
        match &self.kind {
            SchemeKind::OpenIdConnect {
                open_id_connect_url,
            } => Some(open_id_connect_url),
            _ => None,
        }
    }

    /// Provided keys that are not part of the declared type
    pub fn extensions(&self) -> &IndexMap<String, Value> {
        &self.extensions
    }

    /// Security Scheme Object as emitted in `components.securitySchemes`
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(TYPE_FIELD.to_string(), json!(self.secure_type().as_str()));
        if let Some(description) = &self.description {
            map.insert(DESCRIPTION_FIELD.to_string(), json!(description));
        }

        match &self.kind {
            SchemeKind::ApiKey { name, location } => {
                map.insert(NAME_FIELD.to_string(), json!(name));
                map.insert(IN_FIELD.to_string(), json!(location.as_str()));
            }
            SchemeKind::Http {
                scheme,
                bearer_format,
            } => {
                map.insert(SCHEME_FIELD.to_string(), json!(scheme));
                if let Some(bearer_format) = bearer_format {
                    map.insert(BEARER_FORMAT_FIELD.to_string(), json!(bearer_format));
                }
            }
            SchemeKind::OAuth2 { flows } => {
                map.insert(FLOWS_FIELD.to_string(), json!(flows));
            }
            SchemeKind::OpenIdConnect {
                open_id_connect_url,
            } => {
                map.insert(
                    OPEN_ID_CONNECT_URL_FIELD.to_string(),
                    json!(open_id_connect_url),
                );
            }
        }

        for (key, value) in &self.extensions {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

impl TryFrom<Value> for SecuritySchemeData {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::validate(&value)
    }
}

impl From<SecuritySchemeData> for Value {
    fn from(data: SecuritySchemeData) -> Self {
        Value::Object(data.to_map())
    }
}
