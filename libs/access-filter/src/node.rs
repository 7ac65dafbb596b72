//! Client-supplied filter expression tree.
//!
//! Wire shape (untrusted, usually parsed from a query parameter or body):
//!
//! ```json
//! { "and": [
//!     { "op": "equals", "args": [{ "var": "status" }, "active"] },
//!     { "or": [
//!         { "op": "gte", "args": [{ "var": "price" }, 10] },
//!         { "op": "is_null", "args": [{ "var": "price" }] }
//!     ] }
//! ] }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::FilterError;

pub(crate) const ROOT_PATH: &str = "$";

/// A node of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// `{ "op": <friendly name>, "args": [...] }`
    Leaf { op: String, args: Vec<Value> },
    /// `{ "and": [...] }`
    And(Vec<FilterNode>),
    /// `{ "or": [...] }`
    Or(Vec<FilterNode>),
}

impl FilterNode {
    /// Convenience constructor for a leaf.
    #[must_use]
    pub fn leaf(op: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Leaf {
            op: op.into(),
            args,
        }
    }

    /// Parse a node from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::MalformedNode`] (with the JSON path of the
    /// offending node) if the value is not a valid leaf or combinator.
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        parse_node(value, ROOT_PATH)
    }

    /// Render the node back to its wire shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut obj = Map::with_capacity(2);
        match self {
            Self::Leaf { op, args } => {
                obj.insert("op".to_owned(), Value::String(op.clone()));
                obj.insert("args".to_owned(), Value::Array(args.clone()));
            }
            Self::And(children) => {
                obj.insert("and".to_owned(), children_value(children));
            }
            Self::Or(children) => {
                obj.insert("or".to_owned(), children_value(children));
            }
        }
        Value::Object(obj)
    }
}

fn children_value(children: &[FilterNode]) -> Value {
    Value::Array(children.iter().map(FilterNode::to_value).collect())
}

fn parse_node(value: &Value, path: &str) -> Result<FilterNode, FilterError> {
    let Value::Object(obj) = value else {
        return Err(FilterError::malformed(path, "expected an object"));
    };

    if obj.len() == 1 {
        if let Some(children) = obj.get("and") {
            return parse_children(children, path, "and").map(FilterNode::And);
        }
        if let Some(children) = obj.get("or") {
            return parse_children(children, path, "or").map(FilterNode::Or);
        }
    }

    if obj.len() == 2 && obj.contains_key("op") && obj.contains_key("args") {
        let Some(op) = obj.get("op").and_then(Value::as_str) else {
            return Err(FilterError::malformed(path, "'op' must be a string"));
        };
        let Some(args) = obj.get("args").and_then(Value::as_array) else {
            return Err(FilterError::malformed(path, "'args' must be an array"));
        };
        return Ok(FilterNode::leaf(op, args.clone()));
    }

    Err(FilterError::malformed(
        path,
        "expected { op, args } or a single 'and'/'or' key",
    ))
}

fn parse_children(
    children: &Value,
    path: &str,
    combinator: &str,
) -> Result<Vec<FilterNode>, FilterError> {
    let Some(items) = children.as_array() else {
        return Err(FilterError::malformed(
            path,
            format!("'{combinator}' must be an array"),
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, child)| parse_node(child, &format!("{path}.{combinator}[{i}]")))
        .collect()
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}
