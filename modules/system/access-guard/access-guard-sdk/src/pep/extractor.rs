//! Permission rule extraction.
//!
//! Turns the static [`PermissionRule`] of an endpoint plus the live request
//! into a per-request [`PermissionContext`].

use std::collections::HashMap;

use secrecy::SecretString;
use serde_json::Value;

use crate::evaluator::{check_permission_groups, check_permissions};
use crate::models::CallerIdentity;
use crate::rule::{Logic, PermissionRule, ResourceSource};

/// The parts of an inbound request the guard reads and writes.
///
/// Transport adapters (HTTP middleware, RPC interceptors) fill this in
/// before calling the guard, and read [`RequestParts::caller`] afterwards.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Option<Value>,
    authorization: Option<SecretString>,
    caller: Option<CallerIdentity>,
}

impl RequestParts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path parameters captured by the router.
    #[must_use]
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query<I, K, V>(mut self, query: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = query
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Raw `Authorization` header value, as received.
    #[must_use]
    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(SecretString::from(authorization.into()));
        self
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&SecretString> {
        self.authorization.as_ref()
    }

    /// Identity attached by the guard from the oracle's response.
    #[must_use]
    pub fn caller(&self) -> Option<&CallerIdentity> {
        self.caller.as_ref()
    }

    pub fn take_caller(&mut self) -> Option<CallerIdentity> {
        self.caller.take()
    }

    pub(crate) fn attach_caller(&mut self, caller: CallerIdentity) {
        self.caller = Some(caller);
    }

    /// Read `key` from `source`. Missing keys yield `None`.
    ///
    /// Body keys may be dotted paths (`order.id`, `items.0.id`); numeric
    /// segments index into arrays. Only string and number values count as
    /// identifiers.
    #[must_use]
    pub fn lookup(&self, source: ResourceSource, key: &str) -> Option<String> {
        match source {
            ResourceSource::Param => self.params.get(key).cloned(),
            ResourceSource::Query => self.query.get(key).cloned(),
            ResourceSource::Body => self.body.as_ref().and_then(|body| body_lookup(body, key)),
        }
    }
}

fn body_lookup(body: &Value, key: &str) -> Option<String> {
    let value = match body.get(key) {
        Some(v) => v,
        None => key.split('.').try_fold(body, |node, segment| match node {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => node.get(segment),
        })?,
    };
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalized evaluation context for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionContext {
    pub permissions: Vec<String>,
    pub groups: Vec<Vec<String>>,
    pub logic: Logic,
    pub has_resource: bool,
    /// `None` when the rule names a resource the request does not carry.
    pub resource_id: Option<String>,
    pub resource_type: Option<String>,
}

impl PermissionContext {
    /// Context of an endpoint without a rule: nothing required.
    #[must_use]
    pub fn open() -> Self {
        Self {
            permissions: Vec::new(),
            groups: Vec::new(),
            logic: Logic::Or,
            has_resource: false,
            resource_id: None,
            resource_type: None,
        }
    }

    #[must_use]
    pub fn check_global<S: AsRef<str>>(&self, user: &[S]) -> bool {
        check_permissions(user, &self.permissions, self.logic)
    }

    #[must_use]
    pub fn check_groups<S: AsRef<str>>(&self, user: &[S]) -> bool {
        check_permission_groups(user, &self.groups, self.logic)
    }

    /// Both the flat list and the groups are satisfied by `user`.
    #[must_use]
    pub fn is_satisfied_by<S: AsRef<str>>(&self, user: &[S]) -> bool {
        self.check_global(user) && self.check_groups(user)
    }
}

impl Default for PermissionContext {
    fn default() -> Self {
        Self::open()
    }
}

/// Build the evaluation context for `request` under `rule`.
///
/// A missing rule yields [`PermissionContext::open`]. A resource key absent
/// from the request yields `resource_id = None` with `has_resource` still set.
#[must_use]
pub fn extract_permission_context(
    rule: Option<&PermissionRule>,
    request: &RequestParts,
) -> PermissionContext {
    let Some(rule) = rule else {
        return PermissionContext::open();
    };

    let (resource_id, resource_type) = match &rule.resource {
        Some(res) => (
            request.lookup(res.source, &res.key),
            Some(res.resource_type.clone()),
        ),
        None => (None, None),
    };

    PermissionContext {
        permissions: rule.permissions.clone(),
        groups: rule.groups.clone(),
        logic: rule.logic,
        has_resource: rule.resource.is_some(),
        resource_id,
        resource_type,
    }
}
