//! Access guard.
//!
//! [`AccessGuard`] runs the full PEP flow for one request:
//! look up the endpoint rule → extract the context → call the oracle →
//! attach the caller → allow or fail.
//!
//! The oracle's decision is final. Transport failures fail closed; the local
//! evaluator is never used as a fallback.

use std::sync::Arc;

use tracing::Instrument;

use crate::api::{AccessOracleClient, CallMetadata};
use crate::config::AccessGuardConfig;
use crate::error::{AccessError, AccessOracleError};
use crate::models::{CheckAccessRequest, CheckAccessResponse};
use crate::pep::extractor::{RequestParts, extract_permission_context};
use crate::pep::registry::RuleRegistry;
use crate::pep::request_builder::{build_call_metadata, build_check_access_request};
use crate::rule::PermissionRule;

/// Policy enforcement point backed by the authorization oracle.
///
/// Cheap to clone; the oracle client and rule table are shared.
///
/// ```ignore
/// let guard = AccessGuard::new(oracle, Arc::new(registry));
/// let mut parts = RequestParts::new().with_param("id", "42");
/// guard.authorize("PUT /orders/{id}", &mut parts).await?;
/// let caller = parts.caller();
/// ```
#[derive(Clone)]
pub struct AccessGuard {
    oracle: Arc<dyn AccessOracleClient>,
    rules: Arc<RuleRegistry>,
    config: AccessGuardConfig,
}

impl AccessGuard {
    #[must_use]
    pub fn new(oracle: Arc<dyn AccessOracleClient>, rules: Arc<RuleRegistry>) -> Self {
        Self {
            oracle,
            rules,
            config: AccessGuardConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AccessGuardConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    #[must_use]
    pub fn config(&self) -> &AccessGuardConfig {
        &self.config
    }

    /// Authorize a request against the rule registered for `endpoint`.
    ///
    /// Endpoints without a rule still go through the oracle with an empty
    /// requirement so the caller identity is resolved.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Forbidden`] if the oracle denies access
    /// - [`AccessError::Transport`] if the oracle call fails or times out
    pub async fn authorize(
        &self,
        endpoint: &str,
        request: &mut RequestParts,
    ) -> Result<(), AccessError> {
        let rule = self.rules.get(endpoint);
        self.authorize_rule(endpoint, rule, request).await
    }

    /// Authorize a request against an explicitly supplied rule.
    ///
    /// # Errors
    ///
    /// Same as [`AccessGuard::authorize`].
    pub async fn authorize_rule(
        &self,
        endpoint: &str,
        rule: Option<&PermissionRule>,
        request: &mut RequestParts,
    ) -> Result<(), AccessError> {
        let ctx = extract_permission_context(rule, request);
        tracing::debug!(
            endpoint,
            permissions = ctx.permissions.len(),
            groups = ctx.groups.len(),
            logic = ?ctx.logic,
            has_resource = ctx.has_resource,
            resource_found = ctx.resource_id.is_some(),
            "access context extracted"
        );

        let payload = build_check_access_request(&ctx);
        let metadata = if self.config.forward_credentials {
            build_call_metadata(request.authorization())
        } else {
            build_call_metadata(None)
        };

        let response = match self.call_oracle(payload, metadata).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(endpoint, error = %e, "authorization oracle call failed");
                return Err(AccessError::Transport(e));
            }
        };

        if let Some(user) = response.user {
            request.attach_caller(user);
        }

        if response.allowed {
            return Ok(());
        }

        let reason = response
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| self.config.default_deny_reason.clone());
        tracing::info!(
            endpoint,
            caller_id = request.caller().map(|c| c.id.as_str()),
            reason = %reason,
            "access denied"
        );
        Err(AccessError::Forbidden { reason })
    }

    /// Run the oracle call on its own task, bounded by the configured timeout.
    ///
    /// Dropping the returned future leaves the task running; its result is
    /// discarded with the join handle. The task stays in the caller's span.
    async fn call_oracle(
        &self,
        payload: CheckAccessRequest,
        metadata: CallMetadata,
    ) -> Result<CheckAccessResponse, AccessOracleError> {
        let oracle = Arc::clone(&self.oracle);
        let handle = tokio::spawn(
            async move { oracle.check_access(payload, metadata).await }.in_current_span(),
        );

        let timeout = self.config.oracle_timeout();
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(AccessOracleError::Internal(format!(
                "oracle task failed: {join}"
            ))),
            Err(_) => Err(AccessOracleError::Timeout(timeout)),
        }
    }
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("rules", &self.rules.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
