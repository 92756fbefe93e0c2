//! Translates a populated filter into a `Query`: predicates, stable sort and pagination window.

use crate::error::AppError;
use crate::filter::{Bounds, Criterion, FieldMapping, Filter, FilterModel, Operator, PageRequest};
use crate::model::{Attribute, ValueType};
use crate::query::{Predicate, Query, SortKey, Window};
use crate::service::ErrorMessage;
use chrono::NaiveDate;
use std::sync::Arc;

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 1000;

#[derive(Clone, Debug)]
pub struct QueryBuilder {
    model: Arc<FilterModel>,
    default_limit: u64,
    max_limit: u64,
}

impl QueryBuilder {
    pub fn new(model: Arc<FilterModel>) -> Self {
        QueryBuilder {
            model,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }

    pub fn with_limits(mut self, default_limit: u64, max_limit: u64) -> Self {
        self.max_limit = max_limit.max(1);
        self.default_limit = default_limit.clamp(1, self.max_limit);
        self
    }

    pub fn model(&self) -> &FilterModel {
        &self.model
    }

    /// Build the page query for `filter`. Every problem with the filter values is
    /// collected and returned together as one validation error.
    pub fn build<F: Filter + ?Sized>(&self, filter: &F) -> Result<Query, AppError> {
        let mut errors = Vec::new();
        let criteria = filter.criteria();

        let mut predicates = Vec::new();
        for mapping in self.model.mappings() {
            let Some(criterion) = criteria.get(mapping.field) else { continue };
            match predicate(mapping, criterion) {
                Ok(p) => predicates.push(p),
                Err(e) => errors.push(e),
            }
        }
        for field in criteria.fields() {
            if self.model.mapping(field).is_none() {
                tracing::debug!(field, "criterion has no mapping, ignored");
            }
        }

        if let Some(term) = filter.term().map(str::trim).filter(|t| !t.is_empty()) {
            if !self.model.text_search().is_empty() {
                predicates.push(Predicate::Text {
                    attributes: self.model.text_search().to_vec(),
                    term: term.to_string(),
                });
            }
        }

        let sort = self.sort_keys(filter.sort(), &mut errors);
        let window = match self.window(filter.page_request()) {
            Ok(w) => Some(w),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(Query {
            predicates,
            sort,
            window,
        })
    }

    /// Pagination window: page <= 0 is page 1, absent limit is the default, limit <= 0 is rejected.
    pub fn window(&self, req: PageRequest) -> Result<Window, ErrorMessage> {
        let limit = match req.limit {
            None => self.default_limit,
            Some(l) if l <= 0 => {
                return Err(ErrorMessage::new("limit", "min")
                    .with_param("1")
                    .with_message("limit must be greater than 0"))
            }
            Some(l) => (l as u64).min(self.max_limit),
        };
        let page = req.page.filter(|p| *p > 0).unwrap_or(1) as u64;
        // OFFSET is a signed bigint in PostgreSQL.
        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|o| *o <= i64::MAX as u64)
            .ok_or_else(|| ErrorMessage::new("page", "max").with_message("page is out of range"))?;
        Ok(Window { offset, limit })
    }

    fn sort_keys(&self, expr: Option<&str>, errors: &mut Vec<ErrorMessage>) -> Vec<SortKey> {
        let schema = self.model.schema();
        let mut keys: Vec<SortKey> = Vec::new();
        for token in expr.unwrap_or_default().split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, descending) = parse_sort_token(token);
            match schema.attribute(name) {
                Some(a) if a.value_type != ValueType::TextList => {
                    if !keys.iter().any(|k| k.attribute.name == a.name) {
                        keys.push(SortKey {
                            attribute: *a,
                            descending,
                        });
                    }
                }
                _ => errors.push(
                    ErrorMessage::new("sort", "sort")
                        .with_param(name)
                        .with_message(format!("cannot sort by '{}'", name)),
                ),
            }
        }
        if !keys.iter().any(|k| k.attribute.name == schema.key) {
            if let Some(key) = schema.attribute(schema.key) {
                keys.push(SortKey {
                    attribute: *key,
                    descending: false,
                });
            }
        }
        keys
    }
}

/// `-name` and `name desc` are descending; `+name`, `name` and `name asc` ascending.
fn parse_sort_token(token: &str) -> (&str, bool) {
    if let Some(name) = token.strip_prefix('-') {
        return (name.trim(), true);
    }
    let token = token.strip_prefix('+').unwrap_or(token).trim();
    let mut parts = token.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let descending = parts.next().map(|d| d.eq_ignore_ascii_case("desc")).unwrap_or(false);
    (name, descending)
}

fn predicate(mapping: &FieldMapping, criterion: &Criterion) -> Result<Predicate, ErrorMessage> {
    let attribute = mapping.attribute;
    match (mapping.op, criterion) {
        (Operator::Exact, Criterion::Value(v)) => {
            check_value(mapping.field, attribute, v)?;
            Ok(Predicate::Eq {
                attribute,
                value: v.clone(),
            })
        }
        (Operator::Prefix, Criterion::Value(v)) => Ok(Predicate::Prefix {
            attribute,
            term: v.clone(),
        }),
        (Operator::Contains, Criterion::Value(v)) => Ok(Predicate::Contains {
            attribute,
            term: v.clone(),
        }),
        (Operator::Set, Criterion::Value(v)) => set_predicate(mapping, attribute, std::slice::from_ref(v)),
        (Operator::Set, Criterion::Values(vs)) => set_predicate(mapping, attribute, vs),
        (Operator::Range, Criterion::Range(Bounds { min, max })) => {
            for bound in [min, max].into_iter().flatten() {
                check_value(mapping.field, attribute, bound)?;
            }
            Ok(Predicate::Range {
                attribute,
                min: min.clone(),
                max: max.clone(),
            })
        }
        (op, _) => Err(ErrorMessage::new(mapping.field, "type")
            .with_param(op.as_str())
            .with_message(format!("{} does not accept this kind of value", mapping.field))),
    }
}

fn set_predicate(mapping: &FieldMapping, attribute: Attribute, values: &[String]) -> Result<Predicate, ErrorMessage> {
    if attribute.value_type == ValueType::TextList {
        return Ok(Predicate::Overlaps {
            attribute,
            values: values.to_vec(),
        });
    }
    for v in values {
        check_value(mapping.field, attribute, v)?;
    }
    Ok(Predicate::In {
        attribute,
        values: values.to_vec(),
    })
}

fn check_value(field: &str, attribute: Attribute, value: &str) -> Result<(), ErrorMessage> {
    let ok = match attribute.value_type {
        ValueType::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        ValueType::Number => value.parse::<f64>().map(f64::is_finite).unwrap_or(false),
        ValueType::Bool => value == "true" || value == "false",
        ValueType::Text | ValueType::TextList => true,
    };
    if ok {
        Ok(())
    } else {
        Err(ErrorMessage::new(field, attribute.value_type.as_str())
            .with_param(value)
            .with_message(format!("{} must be a valid {}", field, attribute.value_type)))
    }
}
