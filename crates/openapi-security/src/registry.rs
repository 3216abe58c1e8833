//! Registry of named security schemes

use crate::error::{SpecError, SpecResult};
use crate::scheme::SecurityScheme;
use crate::security::SecuritySchemeData;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

/// Insertion-ordered `securitySchemes` registry
///
/// Built once at setup time and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecuritySchemes {
    schemes: IndexMap<String, SecurityScheme>,
}

impl SecuritySchemes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, failing on the first duplicate name
    pub fn from_schemes<I>(schemes: I) -> SpecResult<Self>
    where
        I: IntoIterator<Item = SecurityScheme>,
    {
        let mut registry = Self::new();
        for scheme in schemes {
            registry.register(scheme)?;
        }
        Ok(registry)
    }

    /// Add a scheme; names are unique
    pub fn register(&mut self, scheme: SecurityScheme) -> SpecResult<()> {
        if self.schemes.contains_key(scheme.name()) {
            return Err(SpecError::DuplicateScheme(scheme.name().to_string()));
        }
        debug!(
            "Registered security scheme {} ({})",
            scheme.name(),
            scheme.data().secure_type()
        );
        self.schemes.insert(scheme.name().to_string(), scheme);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SecurityScheme> {
        self.schemes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SecurityScheme> {
        self.schemes.values()
    }

    /// `components.securitySchemes` object, in registration order
    pub fn to_components(&self) -> Map<String, Value> {
        self.schemes
            .iter()
            .map(|(name, scheme)| (name.clone(), Value::Object(scheme.data().to_map())))
            .collect()
    }

    /// Data for `name`, if registered
    pub fn data(&self, name: &str) -> Option<&SecuritySchemeData> {
        self.get(name).map(SecurityScheme::data)
    }
}
