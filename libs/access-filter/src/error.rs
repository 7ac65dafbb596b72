//! Filter translation errors.

use crate::catalog::Arity;

/// A client-supplied filter expression failed validation.
///
/// Every variant carries the JSON path of the offending node (`$`,
/// `$.and[1]`, `$.or[0].and[2]`, ...). These are client input errors and
/// are reported before any query runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A leaf names an operator the catalog does not know.
    #[error("unknown filter operator '{op}' at {path}")]
    UnknownOperator { op: String, path: String },

    /// A leaf supplies the wrong number of operands.
    #[error("operator '{op}' at {path} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        op: String,
        expected: Arity,
        actual: usize,
        path: String,
    },

    /// A node is neither a `{ op, args }` leaf nor an `and`/`or` combinator.
    #[error("malformed filter node at {path}: {reason}")]
    MalformedNode { path: String, reason: String },
}

impl FilterError {
    /// Machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownOperator { .. } => "unknown_operator",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::MalformedNode { .. } => "malformed_filter_node",
        }
    }

    /// JSON path of the node that failed.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::UnknownOperator { path, .. }
            | Self::ArityMismatch { path, .. }
            | Self::MalformedNode { path, .. } => path,
        }
    }

    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedNode {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}
