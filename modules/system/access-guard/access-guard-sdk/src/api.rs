//! Client trait for the remote authorization oracle.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::AccessOracleError;
use crate::models::{CheckAccessRequest, CheckAccessResponse};

/// Out-of-band metadata sent with a `CheckAccess` call.
#[derive(Debug, Clone, Default)]
pub struct CallMetadata {
    authorization: Option<SecretString>,
}

impl CallMetadata {
    /// Metadata with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Metadata carrying the caller's full `Authorization` header value.
    #[must_use]
    pub fn with_authorization(authorization: SecretString) -> Self {
        Self {
            authorization: Some(authorization),
        }
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&SecretString> {
        self.authorization.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authorization.is_none()
    }
}

/// Transport to the authorization oracle.
///
/// Implementations own the wire protocol (`gRPC`, HTTP, in-process). The guard
/// treats every error as a transport failure and fails closed.
///
/// ```ignore
/// let oracle: Arc<dyn AccessOracleClient> = Arc::new(GrpcOracle::connect(url).await?);
/// let decision = oracle.check_access(request, metadata).await?;
/// ```
#[async_trait]
pub trait AccessOracleClient: Send + Sync {
    /// Ask the oracle for an allow/deny decision.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the oracle cannot be reached
    /// - `Timeout` if the call does not complete in time
    /// - `Internal` for any other transport failure
    async fn check_access(
        &self,
        request: CheckAccessRequest,
        metadata: CallMetadata,
    ) -> Result<CheckAccessResponse, AccessOracleError>;
}
