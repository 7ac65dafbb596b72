use std::time::Duration;

use serde::Deserialize;

use crate::rule::PermissionRule;

/// Deny reason used when the oracle denies without giving one.
pub const DEFAULT_DENY_REASON: &str = "Forbidden resource";

/// Access guard configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessGuardConfig {
    /// Upper bound on one oracle call, in milliseconds.
    pub oracle_timeout_ms: u64,

    /// Reason reported when the oracle denies without one.
    pub default_deny_reason: String,

    /// Forward the caller's bearer credential to the oracle.
    pub forward_credentials: bool,
}

impl Default for AccessGuardConfig {
    fn default() -> Self {
        Self {
            oracle_timeout_ms: 5000,
            default_deny_reason: DEFAULT_DENY_REASON.to_owned(),
            forward_credentials: true,
        }
    }
}

impl AccessGuardConfig {
    #[must_use]
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }
}

/// Endpoint → rule side-table declared in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSetConfig {
    pub rules: Vec<EndpointRuleConfig>,
}

/// A single endpoint rule entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointRuleConfig {
    /// Endpoint identifier, e.g. `"GET /orders/{id}"`.
    pub endpoint: String,

    #[serde(default)]
    pub rule: PermissionRule,
}
