//! Storage-neutral query expression produced by the query builder.

use crate::model::Attribute;

/// One active constraint. All predicates of a query are combined with AND.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq { attribute: Attribute, value: String },
    Prefix { attribute: Attribute, term: String },
    Contains { attribute: Attribute, term: String },
    /// Inclusive on both sides; compared by the attribute's value type.
    Range {
        attribute: Attribute,
        min: Option<String>,
        max: Option<String>,
    },
    /// Scalar attribute equal to one of the values.
    In { attribute: Attribute, values: Vec<String> },
    /// List attribute holding at least one of the values.
    Overlaps { attribute: Attribute, values: Vec<String> },
    /// Term contained (case-insensitive) in any of the attributes.
    Text { attributes: Vec<Attribute>, term: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub attribute: Attribute,
    pub descending: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub sort: Vec<SortKey>,
    pub window: Option<Window>,
}

impl Query {
    /// No predicates: matches every document.
    pub fn is_unconstrained(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Escape `%`, `_` and `\` so a user term matches literally inside LIKE patterns.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
