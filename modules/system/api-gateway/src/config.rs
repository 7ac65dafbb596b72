use std::path::Path;

use access_filter::DEFAULT_MAX_DEPTH;
use access_guard_sdk::{AccessGuardConfig, PermissionRule};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

/// Prefix of environment variables overriding file configuration.
pub const ENV_PREFIX: &str = "WARDEN__";

/// API gateway configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiGatewayConfig {
    /// Largest request body buffered to read a body-sourced resource id.
    pub max_body_bytes: usize,

    /// Maximum nesting depth of a client filter expression.
    pub filter_max_depth: usize,

    /// Access guard settings.
    pub access: AccessGuardConfig,

    /// Permission rules per route.
    pub routes: Vec<RouteRuleConfig>,
}

impl Default for ApiGatewayConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            filter_max_depth: DEFAULT_MAX_DEPTH,
            access: AccessGuardConfig::default(),
            routes: Vec::new(),
        }
    }
}

/// Permission rule bound to one route.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteRuleConfig {
    /// HTTP method, case-insensitive.
    pub method: String,

    /// Route pattern; both `/orders/{id}` and `/orders/:id` are accepted.
    pub path: String,

    #[serde(default)]
    pub rule: PermissionRule,
}

impl ApiGatewayConfig {
    /// Load from an optional YAML file, then `WARDEN__*` environment variables.
    ///
    /// Nested keys use `__` as separator: `WARDEN__ACCESS__ORACLE_TIMEOUT_MS=250`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or a value has the wrong shape.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(&figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract from an already assembled figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails.
    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        figment
            .extract()
            .map_err(|e| anyhow::anyhow!("invalid api gateway configuration: {e}"))
    }
}
