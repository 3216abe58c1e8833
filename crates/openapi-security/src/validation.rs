//! Structured validation failures
//!
//! A [`ValidationError`] is the complete outcome of validating one input: an
//! ordered list of [`ValidationErrorElement`] records that serializes directly
//! as an HTTP error-response body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Reference link used when no more specific page applies
pub const DEFAULT_ERROR_URL: &str = "https://spec.openapis.org/oas/v3.1.0";

/// Reference link for security scheme shape failures
pub const SECURITY_SCHEME_URL: &str =
    "https://spec.openapis.org/oas/v3.1.0#security-scheme-object";

/// Reference link for security requirement failures
pub const SECURITY_REQUIREMENT_URL: &str =
    "https://spec.openapis.org/oas/v3.1.0#security-requirement-object";

/// One validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorElement {
    /// Path segments identifying the failing field
    pub loc: Vec<String>,
    /// Human-readable message
    pub msg: String,
    /// Machine-readable error kind
    #[serde(rename = "type")]
    pub kind: String,
    /// The offending value, echoed back
    pub input: Value,
    /// Free-form context
    pub ctx: Option<Map<String, Value>>,
    /// Reference link describing the error kind
    pub url: String,
}

impl ValidationErrorElement {
    pub fn new<L, S>(loc: L, msg: impl Into<String>, kind: impl Into<String>, input: Value) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            loc: loc.into_iter().map(Into::into).collect(),
            msg: msg.into(),
            kind: kind.into(),
            input,
            ctx: None,
            url: DEFAULT_ERROR_URL.to_string(),
        }
    }

    /// Attach a context mapping
    pub fn with_ctx(mut self, ctx: Map<String, Value>) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Replace the reference link
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl fmt::Display for ValidationErrorElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loc.is_empty() {
            write!(f, "{}", self.msg)
        } else {
            write!(f, "{}: {}", self.loc.join("."), self.msg)
        }
    }
}

/// Ordered list of validation failures; empty means valid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationError(Vec<ValidationErrorElement>);

impl ValidationError {
    pub fn new(errors: Vec<ValidationErrorElement>) -> Self {
        Self(errors)
    }

    /// Outcome made of a single failure
    pub fn single(error: ValidationErrorElement) -> Self {
        Self(vec![error])
    }

    pub fn push(&mut self, error: ValidationErrorElement) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[ValidationErrorElement] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationErrorElement> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<ValidationErrorElement> {
        self.0
    }

    /// `Ok(())` when no failures were collected
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no validation errors");
        }
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<Vec<ValidationErrorElement>> for ValidationError {
    fn from(errors: Vec<ValidationErrorElement>) -> Self {
        Self(errors)
    }
}

impl From<ValidationErrorElement> for ValidationError {
    fn from(error: ValidationErrorElement) -> Self {
        Self::single(error)
    }
}

impl FromIterator<ValidationErrorElement> for ValidationError {
    fn from_iter<I: IntoIterator<Item = ValidationErrorElement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ValidationError {
    type Item = ValidationErrorElement;
    type IntoIter = std::vec::IntoIter<ValidationErrorElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationError {
    type Item = &'a ValidationErrorElement;
    type IntoIter = std::slice::Iter<'a, ValidationErrorElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
