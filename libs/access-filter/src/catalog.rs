//! Filter operator catalog.
//!
//! Single source of truth for the operators a client may use in a filter
//! expression. Each friendly name (`equals`, `between`, `json_contains`, ...)
//! maps to the symbol understood by the logic engine (`==`, `between`,
//! `json_contains`, ...) together with the number of operands it accepts.
//!
//! The catalog is keyed by friendly name only. A name such as `equals` is
//! shared by the string, number, date, enum and boolean operand kinds; whether
//! an operator makes sense for a given field type is the caller's concern
//! (see [`OperandKind`] and [`OperatorCatalog::supports`]).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

/// Number of operands an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many operands.
    Exact(usize),
    /// Any one of these operand counts.
    AnyOf(&'static [usize]),
}

impl Arity {
    /// Returns `true` if `count` operands satisfy this arity.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => n == count,
            Self::AnyOf(counts) => counts.contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::AnyOf(counts) => {
                let joined = counts
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" or ");
                write!(f, "{joined}")
            }
        }
    }
}

/// One catalog row: friendly name, logic-engine symbol and arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDescriptor {
    /// Friendly name exposed to API clients (e.g. `"between"`).
    pub name: &'static str,
    /// Logic-engine operator (e.g. `">="`).
    pub symbol: &'static str,
    /// Accepted operand count(s).
    pub arity: Arity,
}

impl OperatorDescriptor {
    #[must_use]
    pub const fn new(name: &'static str, symbol: &'static str, arity: Arity) -> Self {
        Self {
            name,
            symbol,
            arity,
        }
    }
}

const fn op(name: &'static str, symbol: &'static str, arity: usize) -> OperatorDescriptor {
    OperatorDescriptor::new(name, symbol, Arity::Exact(arity))
}

/// The standard operator table, in declaration order.
///
/// Declaration order matters for [`OperatorCatalog::reverse`]: when two names
/// share a symbol the later row wins.
pub const STANDARD_OPERATORS: &[OperatorDescriptor] = &[
    // Standard comparison
    op("equals", "==", 2),
    op("not_equals", "!=", 2),
    // Strict comparison
    op("strict_equals", "===", 2),
    op("strict_not_equals", "!==", 2),
    // Numeric comparison
    op("gt", ">", 2),
    op("gte", ">=", 2),
    op("lt", "<", 2),
    op("lte", "<=", 2),
    op("between", "between", 3),
    op("not_between", "not_between", 3),
    // Text search
    op("contains", "contains", 2),
    op("not_contains", "not_contains", 2),
    op("like", "like", 2),
    op("not_like", "not_like", 2),
    op("starts_with", "starts_with", 2),
    op("ends_with", "ends_with", 2),
    // Null & empty checks
    op("is_empty", "is_empty", 1),
    op("is_not_empty", "is_not_empty", 1),
    op("is_null", "is_null", 1),
    op("is_not_null", "is_not_null", 1),
    // Array & set operations
    op("in", "in", 2),
    op("not_in", "not_in", 2),
    op("array_overlaps", "array_overlaps", 2),
    op("array_contains", "array_contains", 2),
    // JSONB operations
    op("json_equals", "json_equals", 2),
    op("json_contains", "json_contains", 2),
    op("json_in", "json_in", 2),
    op("json_array_text_contains", "json_array_text_contains", 2),
];

/// Operators whose friendly name is already the logic-engine symbol.
pub const NATIVE_OPERATORS: &[&str] = &["in", "contains"];

/// Structural operators of the logic engine. They are not filter operators
/// and never appear in the catalog.
pub const LOGIC_OPERATORS: &[&str] = &["and", "or", "if", "?:", "var"];

/// Operand type groups and the friendly operators meaningful for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    String,
    Number,
    Date,
    Boolean,
    Enum,
    Array,
    Json,
}

impl OperandKind {
    /// Friendly operator names valid for this operand kind.
    #[must_use]
    pub const fn operators(self) -> &'static [&'static str] {
        match self {
            Self::String => &[
                "equals",
                "not_equals",
                "contains",
                "not_contains",
                "like",
                "not_like",
                "starts_with",
                "ends_with",
                "is_empty",
                "is_not_empty",
                "is_null",
                "is_not_null",
                "in",
                "not_in",
            ],
            Self::Number => &[
                "equals",
                "not_equals",
                "gt",
                "gte",
                "lt",
                "lte",
                "between",
                "not_between",
                "is_null",
                "is_not_null",
            ],
            Self::Date => &[
                "equals",
                "not_equals",
                "gt",
                "gte",
                "lt",
                "lte",
                "between",
                "is_null",
                "is_not_null",
            ],
            Self::Boolean => &["equals", "is_null", "is_not_null"],
            Self::Enum => &[
                "equals",
                "not_equals",
                "in",
                "not_in",
                "is_null",
                "is_not_null",
            ],
            Self::Array => &["array_overlaps", "array_contains"],
            Self::Json => &[
                "json_equals",
                "json_contains",
                "json_in",
                "json_array_text_contains",
            ],
        }
    }
}

/// Error building a catalog from a descriptor table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("operator '{name}' is registered more than once")]
    DuplicateOperator { name: String },
}

static SHARED: LazyLock<OperatorCatalog> =
    LazyLock::new(|| OperatorCatalog::from_table(STANDARD_OPERATORS, NATIVE_OPERATORS));

/// Read-only operator catalog with forward and reverse lookup.
#[derive(Debug, Clone)]
pub struct OperatorCatalog {
    descriptors: Vec<OperatorDescriptor>,
    by_name: HashMap<&'static str, usize>,
    by_symbol: HashMap<&'static str, &'static str>,
    native: HashSet<&'static str>,
}

impl OperatorCatalog {
    /// Build a catalog from a descriptor table and a native-operator set.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateOperator`] if a friendly name appears
    /// more than once in `descriptors`.
    pub fn new(
        descriptors: &[OperatorDescriptor],
        native: &[&'static str],
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(descriptors.len());
        for d in descriptors {
            if !seen.insert(d.name) {
                return Err(CatalogError::DuplicateOperator {
                    name: d.name.to_owned(),
                });
            }
        }
        Ok(Self::from_table(descriptors, native))
    }

    /// The standard catalog built from [`STANDARD_OPERATORS`].
    #[must_use]
    pub fn standard() -> Self {
        Self::from_table(STANDARD_OPERATORS, NATIVE_OPERATORS)
    }

    /// Process-wide standard catalog, built once on first use.
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    fn from_table(descriptors: &[OperatorDescriptor], native: &[&'static str]) -> Self {
        let mut by_name = HashMap::with_capacity(descriptors.len());
        let mut by_symbol = HashMap::with_capacity(descriptors.len());
        for (idx, d) in descriptors.iter().enumerate() {
            by_name.insert(d.name, idx);
            // Last registration wins when names alias a symbol.
            by_symbol.insert(d.symbol, d.name);
        }
        Self {
            descriptors: descriptors.to_vec(),
            by_name,
            by_symbol,
            native: native.iter().copied().collect(),
        }
    }

    /// Look up an operator by friendly name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&OperatorDescriptor> {
        self.by_name.get(name).map(|&idx| &self.descriptors[idx])
    }

    /// Look up the friendly name registered for a logic-engine symbol.
    #[must_use]
    pub fn reverse(&self, symbol: &str) -> Option<&'static str> {
        self.by_symbol.get(symbol).copied()
    }

    /// Returns `true` if `name` needs no translation.
    #[must_use]
    pub fn is_native(&self, name: &str) -> bool {
        self.native.contains(name)
    }

    /// Returns `true` if `name` is a catalog operator meaningful for `kind`.
    #[must_use]
    pub fn supports(&self, kind: OperandKind, name: &str) -> bool {
        kind.operators().contains(&name) && self.resolve(name).is_some()
    }

    /// Iterate descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &OperatorDescriptor> {
        self.descriptors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for OperatorCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_unique_names() {
        assert!(OperatorCatalog::new(STANDARD_OPERATORS, NATIVE_OPERATORS).is_ok());
    }

    #[test]
    fn resolves_friendly_names() {
        let catalog = OperatorCatalog::standard();

        let equals = catalog.resolve("equals").unwrap();
        assert_eq!(equals.symbol, "==");
        assert_eq!(equals.arity, Arity::Exact(2));

        let between = catalog.resolve("between").unwrap();
        assert_eq!(between.symbol, "between");
        assert_eq!(between.arity, Arity::Exact(3));

        assert!(catalog.resolve("no_such_op").is_none());
    }

    #[test]
    fn reverse_lookup() {
        let catalog = OperatorCatalog::standard();
        assert_eq!(catalog.reverse("=="), Some("equals"));
        assert_eq!(catalog.reverse("==="), Some("strict_equals"));
        assert_eq!(catalog.reverse("json_in"), Some("json_in"));
        assert_eq!(catalog.reverse("~="), None);
    }

    #[test]
    fn reverse_is_last_write_wins() {
        const ALIASED: &[OperatorDescriptor] = &[
            OperatorDescriptor::new("equals", "==", Arity::Exact(2)),
            OperatorDescriptor::new("eq", "==", Arity::Exact(2)),
        ];
        let catalog = OperatorCatalog::new(ALIASED, &[]).unwrap();
        assert_eq!(catalog.reverse("=="), Some("eq"));
    }

    #[test]
    fn rejects_duplicate_names() {
        const DUPLICATED: &[OperatorDescriptor] = &[
            OperatorDescriptor::new("equals", "==", Arity::Exact(2)),
            OperatorDescriptor::new("equals", "===", Arity::Exact(2)),
        ];
        let err = OperatorCatalog::new(DUPLICATED, &[]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateOperator {
                name: "equals".to_owned()
            }
        );
    }

    #[test]
    fn native_set() {
        let catalog = OperatorCatalog::standard();
        assert!(catalog.is_native("in"));
        assert!(catalog.is_native("contains"));
        assert!(!catalog.is_native("equals"));
    }

    #[test]
    fn any_of_arity() {
        let arity = Arity::AnyOf(&[2, 3]);
        assert!(arity.accepts(2));
        assert!(arity.accepts(3));
        assert!(!arity.accepts(1));
        assert_eq!(arity.to_string(), "2 or 3");
        assert_eq!(Arity::Exact(1).to_string(), "1");
    }

    #[test]
    fn operand_kinds_only_name_catalog_operators() {
        let catalog = OperatorCatalog::standard();
        for kind in [
            OperandKind::String,
            OperandKind::Number,
            OperandKind::Date,
            OperandKind::Boolean,
            OperandKind::Enum,
            OperandKind::Array,
            OperandKind::Json,
        ] {
            for name in kind.operators() {
                assert!(catalog.supports(kind, name), "{kind:?} -> {name}");
            }
        }
        assert!(!catalog.supports(OperandKind::Boolean, "gt"));
        assert!(!catalog.supports(OperandKind::Date, "not_between"));
    }

    #[test]
    fn logic_operators_are_not_filter_operators() {
        let catalog = OperatorCatalog::standard();
        for name in LOGIC_OPERATORS {
            assert!(catalog.resolve(name).is_none());
        }
    }
}
