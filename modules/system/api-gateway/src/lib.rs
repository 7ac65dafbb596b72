#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! API gateway module.
//!
//! - [`access::access_middleware`] - runs the access guard in front of every route
//! - [`filter::FilterQuery`] - validated `filter` query parameter for list endpoints
//! - [`filter::PageQuery`] - normalized `page`/`limit`/`q` pagination parameters
//! - [`config::ApiGatewayConfig`] - gateway configuration (YAML + `WARDEN__*` env)

pub mod access;
pub mod config;
pub mod error;
pub mod filter;

use std::sync::Arc;

use access_guard_sdk::AccessOracleClient;
use axum::Router;

pub use access::{AccessState, RouteTable, access_middleware};
pub use config::{ApiGatewayConfig, RouteRuleConfig};
pub use error::{AccessRejection, FilterRejection};
pub use filter::{FilterQuery, FilterSettings, PageQuery};

/// Put `router` behind the access guard configured in `cfg`.
///
/// # Errors
///
/// Returns an error if the route rules in `cfg` are invalid.
pub fn guard_router<S>(
    router: Router<S>,
    cfg: &ApiGatewayConfig,
    oracle: Arc<dyn AccessOracleClient>,
) -> anyhow::Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let state = AccessState::from_config(cfg, oracle)?;
    tracing::debug!(routes = cfg.routes.len(), "access guard installed");
    Ok(router.layer(axum::middleware::from_fn_with_state(
        state,
        access_middleware,
    )))
}
