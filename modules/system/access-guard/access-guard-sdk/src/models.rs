//! Wire models exchanged with the authorization oracle.

use serde::{Deserialize, Serialize};

use crate::rule::Logic;

/// `CheckAccess` request payload.
///
/// Empty collections are omitted; the oracle treats a payload with none of
/// these fields as "no check requested".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAccessRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<PermissionGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<Logic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRef>,
}

/// One permission group; all codes must be held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub permissions: Vec<String>,
}

/// Concrete resource the check is scoped to.
///
/// A `None` id means the request did not carry one; the oracle falls back to
/// the coarse permission check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

/// `CheckAccess` response: the oracle's decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAccessResponse {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<CallerIdentity>,
}

impl CheckAccessResponse {
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            user: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: CallerIdentity) -> Self {
        self.user = Some(user);
        self
    }
}

/// Caller identity resolved by the oracle. Passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallerIdentity {
    pub id: String,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub created_at: String,
    pub updated_at: String,
}
