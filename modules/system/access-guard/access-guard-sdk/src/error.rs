//! Error types for the access guard.

use std::time::Duration;

/// Public reason reported for any oracle transport failure.
pub const TRANSPORT_FAILURE_REASON: &str = "Authorization service unavailable";

/// Failure talking to the authorization oracle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessOracleError {
    /// The oracle could not be reached.
    #[error("authorization oracle unavailable: {0}")]
    Unavailable(String),

    /// The oracle did not answer in time.
    #[error("authorization oracle timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Any other transport or protocol failure.
    #[error("authorization oracle error: {0}")]
    Internal(String),
}

/// Terminal outcome of a guarded request that may not proceed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The oracle denied access.
    #[error("{reason}")]
    Forbidden { reason: String },

    /// The oracle call failed; the request fails closed.
    #[error("authorization transport failure: {0}")]
    Transport(#[from] AccessOracleError),
}

impl AccessError {
    /// Machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => "forbidden_access",
            Self::Transport(_) => "authorization_transport_failure",
        }
    }

    /// Reason safe to show to the caller.
    ///
    /// Transport failures never expose oracle internals.
    #[must_use]
    pub fn public_reason(&self) -> &str {
        match self {
            Self::Forbidden { reason } => reason,
            Self::Transport(_) => TRANSPORT_FAILURE_REASON,
        }
    }
}

/// Error building the endpoint rule table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("endpoint '{0}' already has a permission rule")]
    DuplicateEndpoint(String),

    #[error("endpoint identifier must not be empty")]
    EmptyEndpoint,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn transport_reason_hides_details() {
        let err = AccessError::from(AccessOracleError::Internal("db password=hunter2".to_owned()));
        assert_eq!(err.kind(), "authorization_transport_failure");
        assert_eq!(err.public_reason(), TRANSPORT_FAILURE_REASON);
        assert!(err.to_string().contains("hunter2"));
    }

    #[test]
    fn forbidden_reason_is_public() {
        let err = AccessError::Forbidden {
            reason: "Forbidden resource".to_owned(),
        };
        assert_eq!(err.kind(), "forbidden_access");
        assert_eq!(err.public_reason(), "Forbidden resource");
        assert_eq!(err.to_string(), "Forbidden resource");
    }
}
