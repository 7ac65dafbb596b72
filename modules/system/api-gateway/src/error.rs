//! Structured rejections rendered as `{ "kind": ..., "reason": ... }`.

use access_filter::{FilterError, QueryError};
use access_guard_sdk::AccessError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    reason: &'a str,
}

pub(crate) fn error_response(status: StatusCode, kind: &str, reason: &str) -> Response {
    (status, Json(ErrorBody { kind, reason })).into_response()
}

/// Access guard failure as an HTTP response.
#[derive(Debug)]
pub struct AccessRejection(pub AccessError);

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AccessError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AccessError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        error_response(status, self.0.kind(), self.0.public_reason())
    }
}

/// Client filter or query options that failed validation.
#[derive(Debug, thiserror::Error)]
pub enum FilterRejection {
    #[error("filter is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("invalid query string: {0}")]
    InvalidQueryString(String),

    #[error("invalid pagination: {0}")]
    InvalidPagination(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl FilterRejection {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) | Self::InvalidQueryString(_) => "malformed_filter_node",
            Self::InvalidPagination(_) => "invalid_page",
            Self::Filter(e) => e.kind(),
            Self::Query(e) => e.kind(),
        }
    }
}

impl IntoResponse for FilterRejection {
    fn into_response(self) -> Response {
        tracing::warn!(kind = self.kind(), error = %self, "filter rejected");
        error_response(StatusCode::BAD_REQUEST, self.kind(), &self.to_string())
    }
}
