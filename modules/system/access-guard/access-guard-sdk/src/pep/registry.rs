//! Endpoint → rule side-table.
//!
//! Built once at startup and shared read-only by every request.

use std::collections::HashMap;

use crate::config::RuleSetConfig;
use crate::error::RegistryError;
use crate::rule::PermissionRule;

/// Immutable map from endpoint identifier to its declared rule.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, PermissionRule>,
}

impl RuleRegistry {
    #[must_use]
    pub fn builder() -> RuleRegistryBuilder {
        RuleRegistryBuilder::default()
    }

    /// Build a registry from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for empty or repeated endpoint identifiers.
    pub fn from_config(config: &RuleSetConfig) -> Result<Self, RegistryError> {
        config
            .rules
            .iter()
            .fold(Self::builder(), |b, entry| {
                b.rule(entry.endpoint.clone(), entry.rule.clone())
            })
            .build()
    }

    /// Rule declared for `endpoint`, if any.
    #[must_use]
    pub fn get(&self, endpoint: &str) -> Option<&PermissionRule> {
        self.rules.get(endpoint)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Collects rules; duplicates are reported by [`RuleRegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RuleRegistryBuilder {
    entries: Vec<(String, PermissionRule)>,
}

impl RuleRegistryBuilder {
    #[must_use]
    pub fn rule(mut self, endpoint: impl Into<String>, rule: PermissionRule) -> Self {
        self.entries.push((endpoint.into(), rule));
        self
    }

    /// # Errors
    ///
    /// - [`RegistryError::EmptyEndpoint`] for a blank identifier
    /// - [`RegistryError::DuplicateEndpoint`] if an endpoint is declared twice
    pub fn build(self) -> Result<RuleRegistry, RegistryError> {
        let mut rules = HashMap::with_capacity(self.entries.len());
        for (endpoint, rule) in self.entries {
            if endpoint.trim().is_empty() {
                return Err(RegistryError::EmptyEndpoint);
            }
            if rules.contains_key(&endpoint) {
                return Err(RegistryError::DuplicateEndpoint(endpoint));
            }
            rules.insert(endpoint, rule);
        }
        Ok(RuleRegistry { rules })
    }
}
