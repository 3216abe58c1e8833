//! Security requirement resolution
//!
//! A requirement maps scheme names to scopes; all entries of one requirement
//! must hold (AND). A list of requirements is a set of alternatives (OR).

use crate::error::{SpecError, SpecResult};
use crate::registry::SecuritySchemes;
use crate::scheme::SecurityScheme;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Scheme name to required scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Build a requirement from `(scheme, scopes)` pairs, keeping their order
pub fn requirement<I, N, S>(entries: I) -> SecurityRequirement
where
    I: IntoIterator<Item = (N, Vec<S>)>,
    N: Into<String>,
    S: Into<String>,
{
    entries
        .into_iter()
        .map(|(name, scopes)| (name.into(), scopes.into_iter().map(Into::into).collect()))
        .collect()
}

/// Resolves per-route requirement lists against the registry and the global default
pub struct SecurityResolver<'a> {
    schemes: &'a SecuritySchemes,
    global: &'a [SecurityRequirement],
}

impl<'a> SecurityResolver<'a> {
    /// Create a resolver; the global requirements are checked here
    pub fn new(schemes: &'a SecuritySchemes, global: &'a [SecurityRequirement]) -> SpecResult<Self> {
        let resolver = Self { schemes, global };
        resolver.check(global)?;
        Ok(resolver)
    }

    /// Resolver over a global list that was already checked
    pub(crate) fn trusted(schemes: &'a SecuritySchemes, global: &'a [SecurityRequirement]) -> Self {
        Self { schemes, global }
    }

    /// Ensure every scheme named in `requirements` is registered
    pub fn check(&self, requirements: &[SecurityRequirement]) -> SpecResult<()> {
        for requirement in requirements {
            for (name, scopes) in requirement {
                let scheme = self
                    .schemes
                    .get(name)
                    .ok_or_else(|| SpecError::UndefinedSchemeReference(name.clone()))?;
                Self::check_scopes(scheme, scopes);
            }
        }
        Ok(())
    }

    fn check_scopes(scheme: &SecurityScheme, scopes: &[String]) {
        let data = scheme.data();
        if scopes.is_empty() {
            return;
        }
        if !data.secure_type().uses_scopes() {
            warn!(
                "Scopes {:?} on {} scheme {} are treated as role names",
                scopes,
                data.secure_type(),
                scheme.name()
            );
            return;
        }
        if let Some(flows) = data.flows() {
            for scope in scopes.iter().filter(|scope| !flows.declares_scope(scope)) {
                debug!("Scope {} is not declared by any flow of {}", scope, scheme.name());
            }
        }
    }

    /// Effective requirements for a route.
    ///
    /// A route list, even an empty one, replaces the global list.
    pub fn resolve(
        &self,
        route: Option<&[SecurityRequirement]>,
    ) -> SpecResult<Vec<SecurityRequirement>> {
        match route {
            Some(route) => {
                self.check(route)?;
                Ok(route.to_vec())
            }
            None => Ok(self.global.to_vec()),
        }
    }

    /// Distinct schemes referenced by the effective list, in first-seen order
    pub fn schemes_in_play(
        &self,
        route: Option<&[SecurityRequirement]>,
    ) -> SpecResult<Vec<&'a SecurityScheme>> {
        let effective = match route {
            Some(route) => {
                self.check(route)?;
                route
            }
            None => self.global,
        };

        let mut seen: IndexMap<&str, &'a SecurityScheme> = IndexMap::new();
        for requirement in effective {
            for name in requirement.keys() {
                if let Some(scheme) = self.schemes.get(name) {
                    seen.entry(scheme.name()).or_insert(scheme);
                }
            }
        }
        Ok(seen.into_values().collect())
    }

    pub fn schemes(&self) -> &'a SecuritySchemes {
        self.schemes
    }

    pub fn global(&self) -> &'a [SecurityRequirement] {
        self.global
    }
}

/// Effective requirement list for one route
pub fn resolve(
    schemes: &SecuritySchemes,
    global: &[SecurityRequirement],
    route: Option<&[SecurityRequirement]>,
) -> SpecResult<Vec<SecurityRequirement>> {
    SecurityResolver::new(schemes, global)?.resolve(route)
}
