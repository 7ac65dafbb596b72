#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Filter operator catalog and filter-expression translator.
//!
//! - [`OperatorCatalog`] - friendly operator name -> logic-engine symbol + arity
//! - [`FilterNode`] - untrusted client filter tree (`{ op, args }` / `{ and | or: [...] }`)
//! - [`Translator`] - validates a tree and rewrites it into a [`LogicExpression`]
//! - [`QueryOptions`], [`Pagination`] - list-query options around a filter
//!
//! ## Usage
//!
//! ```
//! use access_filter::{OperatorCatalog, Translator};
//! use serde_json::json;
//!
//! let catalog = OperatorCatalog::standard();
//! let expr = Translator::new(&catalog)
//!     .translate_value(&json!({ "op": "gte", "args": [{ "var": "price" }, 10] }))
//!     .unwrap();
//!
//! assert_eq!(expr.to_json(), json!({ ">=": [{ "var": "price" }, 10] }));
//! ```

pub mod catalog;
pub mod error;
pub mod node;
pub mod query;
pub mod translate;

pub use catalog::{
    Arity, CatalogError, LOGIC_OPERATORS, NATIVE_OPERATORS, OperandKind, OperatorCatalog,
    OperatorDescriptor, STANDARD_OPERATORS,
};
pub use error::FilterError;
pub use node::FilterNode;
pub use query::{CompiledQuery, OrderBy, Pagination, QueryError, QueryOptions, SortDirection};
pub use translate::{DEFAULT_MAX_DEPTH, LogicExpression, Translator, translate};
