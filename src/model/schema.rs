//! Static description of a resource's stored attributes.

use std::fmt;

/// Value type of a stored attribute; drives casts, comparisons and type checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Number,
    Date,
    Bool,
    TextList,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Number => "number",
            ValueType::Date => "date",
            ValueType::Bool => "bool",
            ValueType::TextList => "text list",
        }
    }

    /// Whether values of this type have a total order usable for ranges and sorting.
    pub fn is_ordered(self) -> bool {
        matches!(self, ValueType::Text | ValueType::Number | ValueType::Date)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored attribute: JSON field name (also the document path) and its type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub value_type: ValueType,
}

impl Attribute {
    pub const fn new(name: &'static str, value_type: ValueType) -> Self {
        Attribute { name, value_type }
    }
}

/// Per-resource table, declared once as a `static` next to the resource type.
#[derive(Debug)]
pub struct ResourceSchema {
    /// Collection (table) name in the document store.
    pub collection: &'static str,
    /// Primary key attribute name.
    pub key: &'static str,
    pub attributes: &'static [Attribute],
    /// Attributes with a store-enforced uniqueness constraint.
    pub unique: &'static [&'static str],
    /// Attributes matched by the free-text search term.
    pub text_search: &'static [&'static str],
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.key == name
    }
}

/// A type stored as one document in a collection described by `SCHEMA`.
pub trait Resource: serde::Serialize + serde::de::DeserializeOwned + Send + Sync {
    const SCHEMA: &'static ResourceSchema;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}
