#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Access Guard SDK
//!
//! Declarative endpoint authorization backed by a remote oracle:
//!
//! - [`PermissionRule`] - Rule model attached to an endpoint
//! - [`evaluator`] - Local AND/OR permission evaluator (reference semantics)
//! - [`AccessOracleClient`] - Transport trait for the authorization oracle
//! - [`CheckAccessRequest`], [`CheckAccessResponse`] - Oracle wire models
//! - [`pep`] - Rule registry, context extractor and [`AccessGuard`]
//! - [`AccessGuardConfig`], [`RuleSetConfig`] - Configuration
//!
//! ## Usage
//!
//! ```ignore
//! use access_guard_sdk::{AccessGuard, PermissionRule, RequestParts, RuleRegistry};
//!
//! let rules = RuleRegistry::builder()
//!     .rule("GET /orders", PermissionRule::require(["orders.read"]))
//!     .build()?;
//! let guard = AccessGuard::new(oracle, Arc::new(rules));
//!
//! let mut parts = RequestParts::new().with_authorization(header);
//! guard.authorize("GET /orders", &mut parts).await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod pep;
pub mod rule;

pub use api::{AccessOracleClient, CallMetadata};
pub use config::{AccessGuardConfig, EndpointRuleConfig, RuleSetConfig};
pub use error::{AccessError, AccessOracleError, RegistryError};
pub use evaluator::{check_permission_groups, check_permissions};
pub use models::{CallerIdentity, CheckAccessRequest, CheckAccessResponse, PermissionGroup, ResourceRef};
pub use pep::{AccessGuard, PermissionContext, RequestParts, RuleRegistry};
pub use rule::{Logic, PermissionRule, ResourceDescriptor, ResourceSource};
