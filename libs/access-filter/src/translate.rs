//! Filter expression translator.
//!
//! Validates a [`FilterNode`] tree against an [`OperatorCatalog`] and
//! rewrites friendly operator names into logic-engine symbols:
//!
//! | input | output |
//! |-------|--------|
//! | `{ "and": [a, b] }` | `{ "and": [T(a), T(b)] }` |
//! | `{ "or": [a, b] }` | `{ "or": [T(a), T(b)] }` |
//! | `{ "op": "gte", "args": [x, 1] }` | `{ ">=": [x, 1] }` |
//! | `{ "op": "in", "args": [x, [..]] }` (native) | `{ "in": [x, [..]] }` |
//!
//! Translation is a pure function of the input tree and the catalog.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::catalog::OperatorCatalog;
use crate::error::FilterError;
use crate::node::{FilterNode, ROOT_PATH};

/// Default maximum nesting depth of a filter tree.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// A validated expression in logic-engine form, ready for a query engine.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicExpression {
    And(Vec<LogicExpression>),
    Or(Vec<LogicExpression>),
    /// `{ <symbol>: [args...] }`
    Apply { symbol: String, args: Vec<Value> },
}

impl LogicExpression {
    /// Render the expression as logic-engine JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let (key, value) = match self {
            Self::And(children) => ("and".to_owned(), Self::children_json(children)),
            Self::Or(children) => ("or".to_owned(), Self::children_json(children)),
            Self::Apply { symbol, args } => (symbol.clone(), Value::Array(args.clone())),
        };
        let mut obj = Map::with_capacity(1);
        obj.insert(key, value);
        Value::Object(obj)
    }

    fn children_json(children: &[Self]) -> Value {
        Value::Array(children.iter().map(Self::to_json).collect())
    }
}

impl Serialize for LogicExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::And(children) => map.serialize_entry("and", children)?,
            Self::Or(children) => map.serialize_entry("or", children)?,
            Self::Apply { symbol, args } => map.serialize_entry(symbol, args)?,
        }
        map.end()
    }
}

/// Translates filter trees using a borrowed catalog.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'c> {
    catalog: &'c OperatorCatalog,
    max_depth: usize,
}

impl<'c> Translator<'c> {
    #[must_use]
    pub fn new(catalog: &'c OperatorCatalog) -> Self {
        Self {
            catalog,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the maximum nesting depth (a lone leaf has depth 1).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &'c OperatorCatalog {
        self.catalog
    }

    /// Translate a parsed filter tree.
    ///
    /// # Errors
    ///
    /// - [`FilterError::UnknownOperator`] if a leaf names an operator absent from the catalog
    /// - [`FilterError::ArityMismatch`] if a leaf has the wrong operand count
    /// - [`FilterError::MalformedNode`] for empty combinators or excessive nesting
    pub fn translate(&self, node: &FilterNode) -> Result<LogicExpression, FilterError> {
        self.translate_at(node, ROOT_PATH, 1)
    }

    /// Parse and translate a raw JSON filter.
    ///
    /// # Errors
    ///
    /// Same as [`Translator::translate`], plus [`FilterError::MalformedNode`]
    /// when the JSON is not a filter tree.
    pub fn translate_value(&self, value: &Value) -> Result<LogicExpression, FilterError> {
        let node = FilterNode::from_value(value)?;
        self.translate(&node)
    }

    fn translate_at(
        &self,
        node: &FilterNode,
        path: &str,
        depth: usize,
    ) -> Result<LogicExpression, FilterError> {
        if depth > self.max_depth {
            return Err(FilterError::malformed(
                path,
                format!("nesting exceeds maximum depth of {}", self.max_depth),
            ));
        }

        match node {
            FilterNode::And(children) => self
                .translate_children(children, path, "and", depth)
                .map(LogicExpression::And),
            FilterNode::Or(children) => self
                .translate_children(children, path, "or", depth)
                .map(LogicExpression::Or),
            FilterNode::Leaf { op, args } => self.translate_leaf(op, args, path),
        }
    }

    fn translate_children(
        &self,
        children: &[FilterNode],
        path: &str,
        combinator: &str,
        depth: usize,
    ) -> Result<Vec<LogicExpression>, FilterError> {
        if children.is_empty() {
            return Err(FilterError::malformed(
                path,
                format!("'{combinator}' requires at least one operand"),
            ));
        }
        children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                self.translate_at(child, &format!("{path}.{combinator}[{i}]"), depth + 1)
            })
            .collect()
    }

    fn translate_leaf(
        &self,
        op: &str,
        args: &[Value],
        path: &str,
    ) -> Result<LogicExpression, FilterError> {
        let descriptor = self.catalog.resolve(op);

        if let Some(d) = descriptor
            && !d.arity.accepts(args.len())
        {
            return Err(FilterError::ArityMismatch {
                op: op.to_owned(),
                expected: d.arity,
                actual: args.len(),
                path: path.to_owned(),
            });
        }

        let symbol = if self.catalog.is_native(op) {
            op
        } else {
            match descriptor {
                Some(d) => d.symbol,
                None => {
                    return Err(FilterError::UnknownOperator {
                        op: op.to_owned(),
                        path: path.to_owned(),
                    });
                }
            }
        };

        Ok(LogicExpression::Apply {
            symbol: symbol.to_owned(),
            args: args.to_vec(),
        })
    }
}

/// Translate with the process-wide standard catalog and default depth.
///
/// # Errors
///
/// See [`Translator::translate`].
pub fn translate(node: &FilterNode) -> Result<LogicExpression, FilterError> {
    Translator::new(OperatorCatalog::shared()).translate(node)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::catalog::{Arity, OperatorDescriptor};
    use serde_json::json;

    fn var(name: &str) -> Value {
        json!({ "var": name })
    }

    #[test]
    fn translates_leaf_to_symbol() {
        let expr = translate(&FilterNode::leaf("gte", vec![var("price"), json!(10)])).unwrap();
        assert_eq!(expr.to_json(), json!({ ">=": [{ "var": "price" }, 10] }));
    }

    #[test]
    fn translates_nested_combinators() {
        let node = FilterNode::And(vec![
            FilterNode::leaf("equals", vec![var("status"), json!("active")]),
            FilterNode::Or(vec![
                FilterNode::leaf("is_null", vec![var("deleted_at")]),
                FilterNode::leaf("not_equals", vec![var("kind"), json!("draft")]),
            ]),
        ]);

        let expr = translate(&node).unwrap();
        assert_eq!(
            serde_json::to_value(&expr).unwrap(),
            json!({ "and": [
                { "==": [{ "var": "status" }, "active"] },
                { "or": [
                    { "is_null": [{ "var": "deleted_at" }] },
                    { "!=": [{ "var": "kind" }, "draft"] }
                ] }
            ] })
        );
    }

    #[test]
    fn unknown_operator() {
        let node = FilterNode::Or(vec![
            FilterNode::leaf("equals", vec![json!(1), json!(1)]),
            FilterNode::leaf("fuzzy", vec![json!(1), json!(2)]),
        ]);
        let err = translate(&node).unwrap_err();
        assert_eq!(
            err,
            FilterError::UnknownOperator {
                op: "fuzzy".to_owned(),
                path: "$.or[1]".to_owned(),
            }
        );
    }

    #[test]
    fn between_with_two_bounds_is_arity_mismatch() {
        let err = translate(&FilterNode::leaf("between", vec![json!(10), json!(20)])).unwrap_err();
        assert_eq!(
            err,
            FilterError::ArityMismatch {
                op: "between".to_owned(),
                expected: Arity::Exact(3),
                actual: 2,
                path: "$".to_owned(),
            }
        );
    }

    #[test]
    fn between_with_value_and_bounds() {
        let expr =
            translate(&FilterNode::leaf("between", vec![var("age"), json!(18), json!(65)])).unwrap();
        assert_eq!(
            expr.to_json(),
            json!({ "between": [{ "var": "age" }, 18, 65] })
        );
    }

    #[test]
    fn native_operator_passes_through() {
        let node = FilterNode::leaf("in", vec![var("tag"), json!(["a", "b"])]);
        let once = translate(&node).unwrap();
        assert_eq!(once.to_json(), json!({ "in": [{ "var": "tag" }, ["a", "b"]] }));

        let LogicExpression::Apply { symbol, args } = &once else {
            panic!("expected leaf");
        };
        let twice = translate(&FilterNode::leaf(symbol.clone(), args.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn native_operator_still_checks_arity() {
        let err = translate(&FilterNode::leaf("contains", vec![json!("x")])).unwrap_err();
        assert_eq!(err.kind(), "arity_mismatch");
    }

    #[test]
    fn native_operator_outside_catalog_skips_arity() {
        const TABLE: &[OperatorDescriptor] =
            &[OperatorDescriptor::new("equals", "==", Arity::Exact(2))];
        let catalog = OperatorCatalog::new(TABLE, &["regex"]).unwrap();
        let expr = Translator::new(&catalog)
            .translate(&FilterNode::leaf("regex", vec![json!("a"), json!("b"), json!("c")]))
            .unwrap();
        assert_eq!(expr.to_json(), json!({ "regex": ["a", "b", "c"] }));
    }

    #[test]
    fn empty_combinator_is_malformed() {
        let err = translate(&FilterNode::And(vec![])).unwrap_err();
        assert_eq!(err.kind(), "malformed_filter_node");
    }

    #[test]
    fn depth_limit() {
        let mut node = FilterNode::leaf("is_null", vec![var("a")]);
        for _ in 0..3 {
            node = FilterNode::And(vec![node]);
        }
        let catalog = OperatorCatalog::standard();

        assert!(Translator::new(&catalog).with_max_depth(4).translate(&node).is_ok());

        let err = Translator::new(&catalog)
            .with_max_depth(3)
            .translate(&node)
            .unwrap_err();
        assert_eq!(err.path(), "$.and[0].and[0].and[0]");
        assert!(err.to_string().contains("maximum depth of 3"));
    }

    #[test]
    fn translate_value_reports_parse_errors() {
        let catalog = OperatorCatalog::standard();
        let err = Translator::new(&catalog)
            .translate_value(&json!("equals"))
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_filter_node");
    }

    #[test]
    fn translation_is_deterministic() {
        let raw = json!({ "or": [
            { "op": "like", "args": [{ "var": "name" }, "%ab%"] },
            { "op": "json_contains", "args": [{ "var": "meta" }, { "k": 1 }] }
        ] });
        let catalog = OperatorCatalog::standard();
        let t = Translator::new(&catalog);
        assert_eq!(t.translate_value(&raw).unwrap(), t.translate_value(&raw).unwrap());
    }
}
