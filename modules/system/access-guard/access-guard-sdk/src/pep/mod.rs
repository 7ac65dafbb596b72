//! PEP (Policy Enforcement Point) helpers.
//!
//! - [`extractor::extract_permission_context`] — rule + request → [`PermissionContext`]
//! - [`request_builder::build_check_access_request`] — context → oracle payload
//! - [`registry::RuleRegistry`] — endpoint → rule side-table
//! - [`guard::AccessGuard`] — the full enforcement flow

pub mod extractor;
pub mod guard;
pub mod registry;
pub mod request_builder;

pub use extractor::{PermissionContext, RequestParts, extract_permission_context};
pub use guard::AccessGuard;
pub use registry::{RuleRegistry, RuleRegistryBuilder};
pub use request_builder::{build_call_metadata, build_check_access_request};
