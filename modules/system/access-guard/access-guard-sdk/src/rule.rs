//! Declarative permission rules attached to endpoints.
//!
//! A rule combines a flat permission list and permission groups under one
//! [`Logic`] value, optionally scoped to a resource instance taken from the
//! request:
//!
//! ```
//! use access_guard_sdk::{Logic, PermissionRule, ResourceDescriptor};
//!
//! // (orders.read AND orders.export) OR admin
//! let rule = PermissionRule::require_groups([
//!     vec!["orders.read", "orders.export"],
//!     vec!["admin"],
//! ]);
//! assert_eq!(rule.logic, Logic::Or);
//!
//! // orders.write on the order named by the `id` path parameter
//! let rule = PermissionRule::require_resource(
//!     ["orders.write"],
//!     ResourceDescriptor::param("id", "order"),
//! );
//! assert_eq!(rule.logic, Logic::And);
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// Combinator applied across `permissions` and, independently, across `groups`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    #[serde(alias = "and")]
    And,
    #[default]
    #[serde(alias = "or")]
    Or,
}

/// Where a resource identifier is read from in the inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceSource {
    Body,
    #[default]
    Param,
    Query,
}

/// Resource type used when a rule names its resource by key only.
pub const DEFAULT_RESOURCE_TYPE: &str = "resource";

/// Where to find a resource id in the request and which type it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDescriptor {
    /// Field name; for `body` a dotted path (`order.id`) is allowed.
    pub key: String,
    #[serde(default)]
    pub source: ResourceSource,
    #[serde(rename = "type")]
    pub resource_type: String,
}

impl ResourceDescriptor {
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        source: ResourceSource,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            source,
            resource_type: resource_type.into(),
        }
    }

    #[must_use]
    pub fn param(key: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::new(key, ResourceSource::Param, resource_type)
    }

    #[must_use]
    pub fn query(key: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::new(key, ResourceSource::Query, resource_type)
    }

    #[must_use]
    pub fn body(key: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self::new(key, ResourceSource::Body, resource_type)
    }
}

/// Permission requirement declared for one endpoint.
///
/// An empty rule (no permissions, no groups) requires nothing; it is used
/// for resource-only checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionRule {
    /// Flat permission list; accepts a single string when deserialized.
    #[serde(deserialize_with = "one_or_many")]
    pub permissions: Vec<String>,
    /// Permission groups; each group is satisfied only if all its codes are held.
    pub groups: Vec<Vec<String>>,
    pub logic: Logic,
    /// Accepts a descriptor object or a bare key string when deserialized.
    #[serde(
        deserialize_with = "resource_shorthand",
        skip_serializing_if = "Option::is_none"
    )]
    pub resource: Option<ResourceDescriptor>,
}

impl PermissionRule {
    /// Any one of `permissions` (logic `OR`).
    #[must_use]
    pub fn require<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Every one of `permissions` on a resource instance (logic `AND`).
    #[must_use]
    pub fn require_resource<I, S>(permissions: I, resource: ResourceDescriptor) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::require(permissions)
            .with_logic(Logic::And)
            .with_resource(resource)
    }

    /// Any one fully-held group (logic `OR`).
    #[must_use]
    pub fn require_groups<G, I, S>(groups: G) -> Self
    where
        G: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups
                .into_iter()
                .map(|g| g.into_iter().map(Into::into).collect())
                .collect(),
            ..Self::default()
        }
    }

    /// Every group fully held, on a resource instance (logic `AND`).
    #[must_use]
    pub fn require_group_resource<G, I, S>(groups: G, resource: ResourceDescriptor) -> Self
    where
        G: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::require_groups(groups)
            .with_logic(Logic::And)
            .with_resource(resource)
    }

    #[must_use]
    pub fn with_logic(mut self, logic: Logic) -> Self {
        self.logic = logic;
        self
    }

    #[must_use]
    pub fn with_resource(mut self, resource: ResourceDescriptor) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Returns `true` if the rule requires no permission at all.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.permissions.is_empty() && self.groups.is_empty()
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(p) => vec![p],
        OneOrMany::Many(ps) => ps,
    })
}

fn resource_shorthand<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ResourceDescriptor>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ResourceSpec {
        Key(String),
        Descriptor(ResourceDescriptor),
    }

    Ok(
        Option::<ResourceSpec>::deserialize(deserializer)?.map(|spec| match spec {
            ResourceSpec::Key(key) => ResourceDescriptor::param(key, DEFAULT_RESOURCE_TYPE),
            ResourceSpec::Descriptor(d) => d,
        }),
    )
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_logic_is_or() {
        let rule: PermissionRule = serde_json::from_value(json!({})).unwrap();
        assert_eq!(rule.logic, Logic::Or);
        assert!(rule.is_open());
        assert!(rule.resource.is_none());
    }

    #[test]
    fn permissions_accept_single_string() {
        let rule: PermissionRule =
            serde_json::from_value(json!({ "permissions": "orders.read" })).unwrap();
        assert_eq!(rule.permissions, vec!["orders.read"]);

        let rule: PermissionRule =
            serde_json::from_value(json!({ "permissions": ["a", "b"], "logic": "AND" })).unwrap();
        assert_eq!(rule.permissions, vec!["a", "b"]);
        assert_eq!(rule.logic, Logic::And);
    }

    #[test]
    fn resource_shorthand_defaults_to_param() {
        let rule: PermissionRule = serde_json::from_value(json!({ "resource": "id" })).unwrap();
        assert_eq!(
            rule.resource,
            Some(ResourceDescriptor::param("id", DEFAULT_RESOURCE_TYPE))
        );
    }

    #[test]
    fn resource_descriptor_without_source_defaults_to_param() {
        let rule: PermissionRule =
            serde_json::from_value(json!({ "resource": { "key": "orderId", "type": "order" } }))
                .unwrap();
        assert_eq!(
            rule.resource,
            Some(ResourceDescriptor::param("orderId", "order"))
        );
    }

    #[test]
    fn rejects_unknown_source() {
        let parsed: Result<PermissionRule, _> = serde_json::from_value(json!({
            "resource": { "key": "id", "source": "header", "type": "order" }
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn helper_defaults_match_declaration_helpers() {
        assert_eq!(PermissionRule::require(["a"]).logic, Logic::Or);
        assert_eq!(PermissionRule::require_groups([["a"]]).logic, Logic::Or);

        let res = ResourceDescriptor::body("order.id", "order");
        assert_eq!(
            PermissionRule::require_resource(["a"], res.clone()).logic,
            Logic::And
        );
        let rule = PermissionRule::require_group_resource([["a", "b"]], res.clone());
        assert_eq!(rule.logic, Logic::And);
        assert_eq!(rule.groups, vec![vec!["a".to_owned(), "b".to_owned()]]);
        assert_eq!(rule.resource, Some(res));
    }

    #[test]
    fn serializes_without_empty_resource() {
        let value = serde_json::to_value(PermissionRule::require(["x"])).unwrap();
        assert_eq!(
            value,
            json!({ "permissions": ["x"], "groups": [], "logic": "OR" })
        );
    }
}
