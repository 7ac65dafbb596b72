//! List-query options: filter, ordering, projection and pagination.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FilterError;
use crate::translate::{LogicExpression, Translator};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 100;

/// Error validating query options.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("order[{index}]: field must not be empty")]
    EmptyOrderField { index: usize },

    #[error("select[{index}]: field must not be empty")]
    EmptySelectField { index: usize },

    #[error("page must be at least 1")]
    InvalidPage,
}

impl QueryError {
    /// Machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Filter(e) => e.kind(),
            Self::EmptyOrderField { .. } => "invalid_order",
            Self::EmptySelectField { .. } => "invalid_select",
            Self::InvalidPage => "invalid_page",
        }
    }
}

/// Sort direction, `1` (ascending) or `-1` (descending) on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl TryFrom<i8> for SortDirection {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Asc),
            -1 => Ok(Self::Desc),
            other => Err(format!("sort direction must be 1 or -1, got {other}")),
        }
    }
}

impl From<SortDirection> for i8 {
    fn from(value: SortDirection) -> Self {
        match value {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Client query options as received on a list/search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryOptions {
    /// Raw filter tree; validated by [`QueryOptions::compile`].
    pub filter: Option<Value>,
    pub order: Vec<OrderBy>,
    pub select: Vec<String>,
}

/// Validated query, ready for the query engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub filter: Option<LogicExpression>,
    pub order: Vec<OrderBy>,
    pub select: Vec<String>,
}

impl QueryOptions {
    /// Validate order/select and translate the filter.
    ///
    /// A `null` filter is the same as no filter.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Filter`] if the filter fails translation, or
    /// [`QueryError::EmptyOrderField`]/[`QueryError::EmptySelectField`] for
    /// blank field names.
    pub fn compile(&self, translator: &Translator<'_>) -> Result<CompiledQuery, QueryError> {
        if let Some(index) = self.order.iter().position(|o| o.field.trim().is_empty()) {
            return Err(QueryError::EmptyOrderField { index });
        }
        if let Some(index) = self.select.iter().position(|f| f.trim().is_empty()) {
            return Err(QueryError::EmptySelectField { index });
        }

        let filter = match &self.filter {
            None | Some(Value::Null) => None,
            Some(raw) => Some(translator.translate_value(raw)?),
        };

        Ok(CompiledQuery {
            filter,
            order: self.order.clone(),
            select: self.select.clone(),
        })
    }
}

/// Page-based pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Free-text search string.
    pub q: Option<String>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            q: None,
        }
    }
}

impl Pagination {
    /// Reject `page == 0` and clamp `limit` into `MIN_LIMIT..=MAX_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPage`] if `page` is zero.
    pub fn normalized(self) -> Result<Self, QueryError> {
        if self.page < DEFAULT_PAGE {
            return Err(QueryError::InvalidPage);
        }
        Ok(Self {
            limit: self.limit.clamp(MIN_LIMIT, MAX_LIMIT),
            ..self
        })
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}
