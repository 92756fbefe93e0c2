//! Filter values as decoded from a request: criteria per field plus pagination.

use crate::error::AppError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Inclusive range bounds; either side may be open.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Bounds {
    #[serde(default, deserialize_with = "scalar_string")]
    pub min: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub max: Option<String>,
}

impl Bounds {
    fn is_open(&self) -> bool {
        is_blank(self.min.as_deref()) && is_blank(self.max.as_deref())
    }
}

/// Accept a JSON string, number or bool for a bound and keep its text form.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "range bound must be a string or number, got {}",
            other
        ))),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Criterion {
    Value(String),
    Values(Vec<String>),
    Range(Bounds),
}

/// Active criteria keyed by filter field name. Absent or empty values are never inserted.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    by_field: BTreeMap<&'static str, Criterion>,
}

impl Criteria {
    pub fn value(&mut self, field: &'static str, value: Option<&str>) {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            self.by_field.insert(field, Criterion::Value(v.trim().to_string()));
        }
    }

    pub fn values(&mut self, field: &'static str, values: Option<&[String]>) {
        let values: Vec<String> = values
            .unwrap_or_default()
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        if !values.is_empty() {
            self.by_field.insert(field, Criterion::Values(values));
        }
    }

    pub fn range(&mut self, field: &'static str, bounds: Option<&Bounds>) {
        if let Some(b) = bounds.filter(|b| !b.is_open()) {
            let trimmed = Bounds {
                min: b.min.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
                max: b.max.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
            };
            self.by_field.insert(field, Criterion::Range(trimmed));
        }
    }

    pub fn get(&self, field: &str) -> Option<&Criterion> {
        self.by_field.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_field.keys().copied()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A populated search filter for one resource type.
pub trait Filter {
    fn page_request(&self) -> PageRequest;

    /// Free-text term matched against the resource's text-search attributes.
    fn term(&self) -> Option<&str>;

    /// Sort expression, e.g. `name,-dateOfBirth`.
    fn sort(&self) -> Option<&str>;

    fn criteria(&self) -> Criteria;
}

fn is_blank(s: Option<&str>) -> bool {
    s.map(|s| s.trim().is_empty()).unwrap_or(true)
}

pub fn parse_number(name: &str, value: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer", name)))
}

/// Split a comma separated query parameter, dropping empty items.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
