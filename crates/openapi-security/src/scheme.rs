//! Named security schemes

use crate::error::{SpecError, SpecResult};
use crate::security::SecuritySchemeData;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// OpenAPI component name rule, anchored at both ends
static COMPONENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-._]+$").expect("component name pattern is valid"));

/// Whether `name` is a legal OpenAPI component name
pub fn is_valid_scheme_name(name: &str) -> bool {
    COMPONENT_NAME_RE.is_match(name)
}

/// A security scheme registered under a component name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSecurityScheme")]
pub struct SecurityScheme {
    name: String,
    data: SecuritySchemeData,
}

/// Unchecked `{name, data}` pair as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSecurityScheme {
    pub name: String,
    pub data: Value,
}

impl SecurityScheme {
    /// Pair a checked name with already validated data
    pub fn new(name: impl Into<String>, data: SecuritySchemeData) -> SpecResult<Self> {
        let name = name.into();
        Self::check_name(&name)?;
        Ok(Self { name, data })
    }

    /// Validate `data` as a security scheme object and register it as `name`
    pub fn from_raw(name: impl Into<String>, data: &Value) -> SpecResult<Self> {
        let name = name.into();
        Self::check_name(&name)?;
        let data = SecuritySchemeData::validate(data)
            .map_err(|errors| SpecError::SchemaShape {
                name: name.clone(),
                errors,
            })?;
        Ok(Self { name, data })
    }

    fn check_name(name: &str) -> SpecResult<()> {
        if is_valid_scheme_name(name) {
            Ok(())
        } else {
            Err(SpecError::NameFormat(name.to_string()))
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &SecuritySchemeData {
        &self.data
    }

    /// Change the component name; the old name is kept on failure
    pub fn rename(&mut self, name: impl Into<String>) -> SpecResult<()> {
        let name = name.into();
        Self::check_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn set_data(&mut self, data: SecuritySchemeData) {
        self.data = data;
    }

    pub fn into_parts(self) -> (String, SecuritySchemeData) {
        (self.name, self.data)
    }
}

impl TryFrom<RawSecurityScheme> for SecurityScheme {
    type Error = SpecError;

    fn try_from(raw: RawSecurityScheme) -> Result<Self, Self::Error> {
        Self::from_raw(raw.name, &raw.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{InType, SecureType};
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_valid_names() {
        for name in ["PartnerID", "auth_oauth2", "test-secure", "v1.key", "_", "0"] {
            assert!(is_valid_scheme_name(name), "{name} rejected");
        }
    }

    #[test]
    fn test_empty_and_bad_start_rejected() {
        for name in ["", " PartnerID", "$key", "ключ", "/auth"] {
            assert!(!is_valid_scheme_name(name), "{name} accepted");
        }
    }

    #[test]
    fn test_trailing_illegal_characters_rejected() {
        for name in ["Partner ID", "PartnerID ", "abc$", "token\n", "a/b"] {
            let data = SecuritySchemeData::http("bearer").unwrap();
            let err = SecurityScheme::new(name, data).unwrap_err();
            assert!(matches!(err, SpecError::NameFormat(ref n) if n == name));
        }
    }

    #[test]
    fn test_from_raw_wraps_shape_errors() {
        let err = SecurityScheme::from_raw("PartnerID", &json!({"type": "apiKey", "in": "header"}))
            .unwrap_err();

        match err {
            SpecError::SchemaShape { name, errors } => {
                assert_eq!(name, "PartnerID");
                assert_eq!(errors.errors()[0].msg, "For `apiKey` type `name, in` field(s) is required.");
            }
            other => panic!("Expected SchemaShape, got {other:?}"),
        }
    }

    #[test]
    fn test_name_checked_before_data() {
        let err = SecurityScheme::from_raw("bad name", &json!({})).unwrap_err();
        assert!(matches!(err, SpecError::NameFormat(_)));
    }

    #[test]
    fn test_deserialize_named_scheme() {
        let scheme: SecurityScheme = serde_json::from_value(json!({
            "name": "PartnerToken",
            "data": {"type": "apiKey", "name": "partner-access-token", "in": "header"}
        }))
        .unwrap();

        assert_eq!(scheme.name(), "PartnerToken");
        assert_eq!(scheme.data().secure_type(), SecureType::ApiKey);
        assert_eq!(scheme.data().field_in(), Some(InType::Header));

        let bad = serde_json::from_value::<SecurityScheme>(json!({
            "name": "PartnerToken",
            "data": {"type": "apiKey"}
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_rename_keeps_old_name_on_failure() {
        let mut scheme =
            SecurityScheme::new("test_secure", SecuritySchemeData::http("bearer").unwrap()).unwrap();

        assert!(scheme.rename("not valid").is_err());
        assert_eq!(scheme.name(), "test_secure");

        scheme.rename("bearer.auth").unwrap();
        assert_eq!(scheme.name(), "bearer.auth");
    }

    proptest! {
        #[test]
        fn prop_legal_names_accepted(name in "[A-Za-z0-9._-]{1,40}") {
            let data = SecuritySchemeData::http("bearer").unwrap();
            prop_assert!(SecurityScheme::new(name, data).is_ok());
        }

        #[test]
        fn prop_illegal_first_character_rejected(
            first in "[^A-Za-z0-9._-]",
            rest in "[A-Za-z0-9._-]{0,20}",
        ) {
            let data = SecuritySchemeData::http("bearer").unwrap();
            let name = format!("{first}{rest}");
            prop_assert!(SecurityScheme::new(name, data).is_err());
        }
    }
}
