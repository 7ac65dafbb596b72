//! PEP request builder.
//!
//! Converts a [`PermissionContext`] into the oracle's `CheckAccess` payload
//! and the caller credential into call metadata.

use secrecy::{ExposeSecret, SecretString};

use crate::api::CallMetadata;
use crate::models::{CheckAccessRequest, PermissionGroup, ResourceRef};
use crate::pep::extractor::PermissionContext;

const BEARER_PREFIX: &str = "Bearer ";

/// Build the `CheckAccess` payload.
///
/// `logic` is always sent. `permissions` and `groups` are sent only when
/// non-empty, `resource` only when the rule names one.
#[must_use]
pub fn build_check_access_request(ctx: &PermissionContext) -> CheckAccessRequest {
    CheckAccessRequest {
        permissions: (!ctx.permissions.is_empty()).then(|| ctx.permissions.clone()),
        groups: (!ctx.groups.is_empty()).then(|| {
            ctx.groups
                .iter()
                .map(|g| PermissionGroup {
                    permissions: g.clone(),
                })
                .collect()
        }),
        logic: Some(ctx.logic),
        resource: ctx.has_resource.then(|| ResourceRef {
            id: ctx.resource_id.clone(),
            resource_type: ctx.resource_type.clone(),
        }),
    }
}

/// Build call metadata from the raw `Authorization` header.
///
/// The header is forwarded verbatim when it is a well-formed
/// `Bearer <token>`; anything else yields empty metadata. Validating the
/// token itself is the oracle's job.
#[must_use]
pub fn build_call_metadata(authorization: Option<&SecretString>) -> CallMetadata {
    let Some(header) = authorization else {
        return CallMetadata::empty();
    };
    match header.expose_secret().strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.trim().is_empty() => CallMetadata::with_authorization(header.clone()),
        _ => CallMetadata::empty(),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::rule::Logic;
    use serde_json::json;

    #[test]
    fn open_context_sends_only_logic() {
        let req = build_check_access_request(&PermissionContext::open());
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({ "logic": "OR" }));
    }

    #[test]
    fn full_context() {
        let ctx = PermissionContext {
            permissions: vec!["orders.read".to_owned()],
            groups: vec![vec!["a".to_owned(), "b".to_owned()], vec!["admin".to_owned()]],
            logic: Logic::And,
            has_resource: true,
            resource_id: None,
            resource_type: Some("order".to_owned()),
        };

        let req = build_check_access_request(&ctx);
        assert_eq!(req.permissions, Some(vec!["orders.read".to_owned()]));
        assert_eq!(req.groups.as_ref().map(Vec::len), Some(2));
        assert_eq!(
            req.resource,
            Some(ResourceRef {
                id: None,
                resource_type: Some("order".to_owned()),
            })
        );
    }

    #[test]
    fn forwards_well_formed_bearer() {
        let header = SecretString::from("Bearer abc.def");
        let meta = build_call_metadata(Some(&header));
        assert_eq!(
            meta.authorization().map(ExposeSecret::expose_secret),
            Some("Bearer abc.def")
        );
    }

    #[test]
    fn drops_malformed_credentials() {
        for raw in ["Basic dXNlcjpwYXNz", "Bearer ", "bearer abc", "abc"] {
            let header = SecretString::from(raw);
            assert!(build_call_metadata(Some(&header)).is_empty(), "{raw}");
        }
        assert!(build_call_metadata(None).is_empty());
    }
}
