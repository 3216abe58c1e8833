//! Document-level tags and servers

use crate::error::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// External documentation link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExternalDocs {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Operation tag
///
/// Deserializes from either a bare name or a full tag object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TagRepr")]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default, rename = "externalDocs")]
        external_docs: Option<ExternalDocs>,
    },
}

impl From<TagRepr> for Tag {
    fn from(repr: TagRepr) -> Self {
        match repr {
            TagRepr::Name(name) => Tag::new(name),
            TagRepr::Full {
                name,
                description,
                external_docs,
            } => Tag {
                name,
                description,
                external_docs,
            },
        }
    }
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            external_docs: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn external_docs(mut self, docs: ExternalDocs) -> Self {
        self.external_docs = Some(docs);
        self
    }

    /// Whether the tag carries more than its name
    pub fn is_documented(&self) -> bool {
        self.description.is_some() || self.external_docs.is_some()
    }

    pub(crate) fn check(&self) -> SpecResult<()> {
        if self.name.trim().is_empty() {
            return Err(SpecError::InvalidFormat("tag name must not be empty".to_string()));
        }
        if let Some(docs) = &self.external_docs {
            if docs.url.trim().is_empty() {
                return Err(SpecError::InvalidFormat(format!(
                    "externalDocs url of tag `{}` must not be empty",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::new(name)
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::new(name)
    }
}

/// Server the API is reachable at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL template variables, kept as provided
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Map<String, Value>>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, variable: Value) -> Self {
        self.variables
            .get_or_insert_with(Map::new)
            .insert(name.into(), variable);
        self
    }

    pub(crate) fn check(&self) -> SpecResult<()> {
        if self.url.trim().is_empty() {
            return Err(SpecError::InvalidFormat("server url must not be empty".to_string()));
        }
        Ok(())
    }
}
