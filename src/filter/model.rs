//! Filter model: filter field to stored attribute plus comparison kind, built once at startup.

use crate::error::ConfigError;
use crate::model::{Attribute, ResourceSchema, ValueType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// Equality; identifiers and enumerations.
    Exact,
    /// Case-insensitive prefix.
    Prefix,
    /// Case-insensitive substring.
    Contains,
    /// Inclusive min/max bounds.
    Range,
    /// Membership: scalar attribute in the set, or list attribute sharing any value with it.
    Set,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Exact => "exact",
            Operator::Prefix => "prefix",
            Operator::Contains => "contains",
            Operator::Range => "range",
            Operator::Set => "set",
        }
    }

    pub fn applies_to(self, value_type: ValueType) -> bool {
        match self {
            Operator::Exact => value_type != ValueType::TextList,
            Operator::Prefix | Operator::Contains => value_type == ValueType::Text,
            Operator::Range => value_type.is_ordered(),
            Operator::Set => value_type != ValueType::Bool,
        }
    }
}

/// Declared filter field. `target` is the attribute it constrains (usually the same name).
#[derive(Clone, Copy, Debug)]
pub struct FilterField {
    pub name: &'static str,
    pub target: &'static str,
    pub op: Operator,
}

impl FilterField {
    pub const fn new(name: &'static str, op: Operator) -> Self {
        FilterField { name, target: name, op }
    }

    pub const fn mapped(name: &'static str, target: &'static str, op: Operator) -> Self {
        FilterField { name, target, op }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FieldMapping {
    pub field: &'static str,
    pub attribute: Attribute,
    pub op: Operator,
}

#[derive(Debug)]
pub struct FilterModel {
    schema: &'static ResourceSchema,
    mappings: Vec<FieldMapping>,
    text_search: Vec<Attribute>,
}

impl FilterModel {
    /// Resolve every filter field against the schema. In strict mode an unmapped or
    /// ill-typed field is fatal; otherwise it is logged and left out of the table.
    pub fn build(
        schema: &'static ResourceSchema,
        fields: &[FilterField],
        strict: bool,
    ) -> Result<Self, ConfigError> {
        if schema.attribute(schema.key).is_none() {
            return Err(ConfigError::Invalid(format!(
                "collection {}: key attribute '{}' is not declared",
                schema.collection, schema.key
            )));
        }

        let mut mappings = Vec::with_capacity(fields.len());
        for f in fields {
            if mappings.iter().any(|m: &FieldMapping| m.field == f.name) {
                return Err(ConfigError::Invalid(format!("duplicate filter field '{}'", f.name)));
            }
            let Some(attribute) = schema.attribute(f.target) else {
                let err = ConfigError::UnmappedFilterField {
                    field: f.name.to_string(),
                    target: f.target.to_string(),
                };
                skip_or_fail(err, strict)?;
                continue;
            };
            if !f.op.applies_to(attribute.value_type) {
                let err = ConfigError::IncompatibleOperator {
                    field: f.name.to_string(),
                    op: f.op.as_str(),
                    value_type: attribute.value_type.as_str(),
                };
                skip_or_fail(err, strict)?;
                continue;
            }
            mappings.push(FieldMapping {
                field: f.name,
                attribute: *attribute,
                op: f.op,
            });
        }

        let mut text_search = Vec::with_capacity(schema.text_search.len());
        for name in schema.text_search {
            match schema.attribute(name) {
                Some(a) if a.value_type == ValueType::Text => text_search.push(*a),
                Some(a) => skip_or_fail(
                    ConfigError::IncompatibleOperator {
                        field: name.to_string(),
                        op: "text search",
                        value_type: a.value_type.as_str(),
                    },
                    strict,
                )?,
                None => skip_or_fail(
                    ConfigError::UnmappedFilterField {
                        field: "q".to_string(),
                        target: name.to_string(),
                    },
                    strict,
                )?,
            }
        }

        tracing::debug!(
            collection = schema.collection,
            fields = mappings.len(),
            text_search = text_search.len(),
            "filter model built"
        );
        Ok(FilterModel {
            schema,
            mappings,
            text_search,
        })
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    pub fn mappings(&self) -> &[FieldMapping] {
        &self.mappings
    }

    pub fn mapping(&self, field: &str) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.field == field)
    }

    pub fn text_search(&self) -> &[Attribute] {
        &self.text_search
    }
}

fn skip_or_fail(err: ConfigError, strict: bool) -> Result<(), ConfigError> {
    if strict {
        return Err(err);
    }
    tracing::warn!(error = %err, "skipping filter field");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{USER_FILTER_FIELDS, USER_SCHEMA};

    static BROKEN: &[FilterField] = &[
        FilterField::new("name", Operator::Contains),
        FilterField::mapped("nickname", "alias", Operator::Exact),
        FilterField::new("interests", Operator::Range),
    ];

    #[test]
    fn user_filter_maps_every_field() {
        let model = FilterModel::build(&USER_SCHEMA, USER_FILTER_FIELDS, true).unwrap();
        assert_eq!(model.mappings().len(), USER_FILTER_FIELDS.len());
        let dob = model.mapping("dateOfBirth").unwrap();
        assert_eq!(dob.attribute.value_type, ValueType::Date);
        assert_eq!(dob.op, Operator::Range);
        assert_eq!(model.text_search().len(), 3);
    }

    #[test]
    fn strict_mode_rejects_unmapped_field() {
        let err = FilterModel::build(&USER_SCHEMA, BROKEN, true).unwrap_err();
        assert!(matches!(err, ConfigError::UnmappedFilterField { ref field, .. } if field == "nickname"));
    }

    #[test]
    fn lenient_mode_skips_bad_fields() {
        let model = FilterModel::build(&USER_SCHEMA, BROKEN, false).unwrap();
        let names: Vec<_> = model.mappings().iter().map(|m| m.field).collect();
        assert_eq!(names, vec!["name"]);
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        static DUP: &[FilterField] = &[
            FilterField::new("name", Operator::Contains),
            FilterField::new("name", Operator::Exact),
        ];
        assert!(FilterModel::build(&USER_SCHEMA, DUP, false).is_err());
    }

    #[test]
    fn operator_compatibility() {
        assert!(Operator::Set.applies_to(ValueType::TextList));
        assert!(Operator::Set.applies_to(ValueType::Text));
        assert!(!Operator::Contains.applies_to(ValueType::Date));
        assert!(!Operator::Range.applies_to(ValueType::Bool));
        assert!(!Operator::Exact.applies_to(ValueType::TextList));
    }
}
