//! Declarative filter field for list endpoints.
//!
//! Handlers take [`FilterQuery`] to receive a validated, translated filter
//! from the `filter` query parameter, and [`PageQuery`] for the
//! `page`/`limit`/`q` parameters:
//!
//! ```ignore
//! async fn list(
//!     FilterQuery(filter): FilterQuery,
//!     PageQuery(page): PageQuery,
//! ) -> Json<Vec<Order>> {
//!     Json(store.find(filter.as_ref(), page.offset(), page.limit).await)
//! }
//! ```

use std::sync::Arc;

use access_filter::{
    CompiledQuery, LogicExpression, OperatorCatalog, Pagination, QueryOptions, Translator,
};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use serde_json::Value;

use crate::error::FilterRejection;

/// Query parameter carrying the JSON filter tree.
pub const FILTER_PARAM: &str = "filter";

/// Catalog and limits used to validate client filters.
#[derive(Debug, Clone)]
pub struct FilterSettings {
    catalog: Arc<OperatorCatalog>,
    max_depth: usize,
}

impl FilterSettings {
    #[must_use]
    pub fn new(catalog: Arc<OperatorCatalog>, max_depth: usize) -> Self {
        Self { catalog, max_depth }
    }

    /// Standard catalog with the given depth limit.
    #[must_use]
    pub fn standard(max_depth: usize) -> Self {
        Self::new(Arc::new(OperatorCatalog::standard()), max_depth)
    }

    #[must_use]
    pub fn translator(&self) -> Translator<'_> {
        Translator::new(&self.catalog).with_max_depth(self.max_depth)
    }

    /// Translate a raw filter; `null` means no filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterRejection::Filter`] if translation fails.
    pub fn translate(&self, raw: &Value) -> Result<Option<LogicExpression>, FilterRejection> {
        if raw.is_null() {
            return Ok(None);
        }
        Ok(Some(self.translator().translate_value(raw)?))
    }

    /// Validate full query options, e.g. from a search request body.
    ///
    /// # Errors
    ///
    /// Returns [`FilterRejection::Query`] if any part is invalid.
    pub fn compile(&self, options: &QueryOptions) -> Result<CompiledQuery, FilterRejection> {
        Ok(options.compile(&self.translator())?)
    }
}

/// Validated filter from the `filter` query parameter; `None` when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery(pub Option<LogicExpression>);

impl<S> FromRequestParts<S> for FilterQuery
where
    FilterSettings: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = FilterRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = FilterSettings::from_ref(state);
        let Some(raw) = filter_param(parts.uri.query())? else {
            return Ok(Self(None));
        };
        let value: Value =
            serde_json::from_str(&raw).map_err(|e| FilterRejection::InvalidJson(e.to_string()))?;
        settings.translate(&value).map(Self)
    }
}

/// Normalized pagination from the query string; defaults when absent.
///
/// `limit` is clamped into range, `page=0` is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery(pub Pagination);

impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = FilterRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let page = pagination(parts.uri.query())?;
        Ok(Self(page.normalized()?))
    }
}

fn pagination(query: Option<&str>) -> Result<Pagination, FilterRejection> {
    let Some(query) = query else {
        return Ok(Pagination::default());
    };
    serde_urlencoded::from_str(query).map_err(|e| FilterRejection::InvalidPagination(e.to_string()))
}

fn filter_param(query: Option<&str>) -> Result<Option<String>, FilterRejection> {
    let Some(query) = query else {
        return Ok(None);
    };
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| FilterRejection::InvalidQueryString(e.to_string()))?;
    Ok(pairs
        .into_iter()
        .find_map(|(k, v)| (k == FILTER_PARAM).then_some(v)))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_filter_param() {
        let q = serde_urlencoded::to_string([("page", "1"), ("filter", r#"{"op":"is_null","args":[1]}"#)])
            .unwrap();
        assert_eq!(
            filter_param(Some(&q)).unwrap().as_deref(),
            Some(r#"{"op":"is_null","args":[1]}"#)
        );
        assert_eq!(filter_param(Some("page=1")).unwrap(), None);
        assert_eq!(filter_param(None).unwrap(), None);
    }

    #[test]
    fn pagination_from_query() {
        let page = pagination(Some("page=3&limit=20&q=shoes&filter=x")).unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.limit, 20);
        assert_eq!(page.q.as_deref(), Some("shoes"));

        assert_eq!(pagination(None).unwrap(), Pagination::default());
        assert_eq!(pagination(Some("limit=ten")).unwrap_err().kind(), "invalid_page");
    }

    #[test]
    fn settings_respect_depth() {
        let settings = FilterSettings::standard(1);
        let nested = json!({ "and": [ { "op": "is_null", "args": [{ "var": "a" }] } ] });
        let err = settings.translate(&nested).unwrap_err();
        assert_eq!(err.kind(), "malformed_filter_node");

        let leaf = json!({ "op": "is_null", "args": [{ "var": "a" }] });
        assert!(settings.translate(&leaf).unwrap().is_some());
        assert!(settings.translate(&Value::Null).unwrap().is_none());
    }

    #[test]
    fn compile_reports_query_errors() {
        let settings = FilterSettings::standard(16);
        let options = QueryOptions {
            select: vec![String::new()],
            ..Default::default()
        };
        assert_eq!(settings.compile(&options).unwrap_err().kind(), "invalid_select");
    }
}
