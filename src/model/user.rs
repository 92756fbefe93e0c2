//! User resource: stored shape, schema table, validation rules and search filter.

use crate::error::AppError;
use crate::filter::{parse_list, parse_number, Bounds, Criteria, Filter, FilterField, Operator, PageRequest};
use crate::model::schema::{Attribute, Resource, ResourceSchema, ValueType};
use crate::service::ValidationRule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
}

pub static USER_SCHEMA: ResourceSchema = ResourceSchema {
    collection: "users",
    key: "id",
    attributes: &[
        Attribute::new("id", ValueType::Text),
        Attribute::new("username", ValueType::Text),
        Attribute::new("name", ValueType::Text),
        Attribute::new("email", ValueType::Text),
        Attribute::new("phone", ValueType::Text),
        Attribute::new("dateOfBirth", ValueType::Date),
        Attribute::new("status", ValueType::Text),
        Attribute::new("interests", ValueType::TextList),
    ],
    unique: &["email"],
    text_search: &["username", "name", "email"],
};

/// Queryable user fields and how each one compares.
pub static USER_FILTER_FIELDS: &[FilterField] = &[
    FilterField::new("id", Operator::Exact),
    FilterField::new("username", Operator::Prefix),
    FilterField::new("name", Operator::Contains),
    FilterField::new("email", Operator::Contains),
    FilterField::new("phone", Operator::Prefix),
    FilterField::new("status", Operator::Exact),
    FilterField::new("interests", Operator::Set),
    FilterField::new("dateOfBirth", Operator::Range),
];

pub const USER_STATUSES: &[&str] = &["active", "inactive", "suspended"];

impl Resource for User {
    const SCHEMA: &'static ResourceSchema = &USER_SCHEMA;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

pub fn user_rules() -> Vec<(&'static str, ValidationRule)> {
    vec![
        (
            "id",
            ValidationRule {
                max_length: Some(40),
                ..Default::default()
            },
        ),
        (
            "username",
            ValidationRule {
                max_length: Some(100),
                pattern: Some(r"^[A-Za-z0-9_.\-]+$".into()),
                ..Default::default()
            },
        ),
        (
            "name",
            ValidationRule {
                required: true,
                max_length: Some(120),
                ..Default::default()
            },
        ),
        (
            "email",
            ValidationRule {
                required: true,
                format: Some("email".into()),
                max_length: Some(120),
                ..Default::default()
            },
        ),
        (
            "phone",
            ValidationRule {
                pattern: Some(r"^\+?[0-9 ()\-]{6,20}$".into()),
                ..Default::default()
            },
        ),
        (
            "status",
            ValidationRule {
                allowed: Some(USER_STATUSES.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            },
        ),
    ]
}

/// Search request for users: pagination, free text, sort and per-field criteria.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFilter {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub interests: Option<Vec<String>>,
    pub date_of_birth: Option<Bounds>,
}

impl UserFilter {
    /// Decode a GET query string. Lists are comma separated, range bounds use `.min`/`.max`.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut filter = UserFilter::default();
        for (key, value) in params {
            match key.as_str() {
                "page" => filter.page = Some(parse_number(key, value)?),
                "limit" => filter.limit = Some(parse_number(key, value)?),
                "q" => filter.q = Some(value.clone()),
                "sort" => filter.sort = Some(value.clone()),
                "id" => filter.id = Some(value.clone()),
                "username" => filter.username = Some(value.clone()),
                "name" => filter.name = Some(value.clone()),
                "email" => filter.email = Some(value.clone()),
                "phone" => filter.phone = Some(value.clone()),
                "status" => filter.status = Some(value.clone()),
                "interests" => filter.interests = Some(parse_list(value)),
                "dateOfBirth.min" => {
                    filter.date_of_birth.get_or_insert_with(Bounds::default).min = Some(value.clone())
                }
                "dateOfBirth.max" => {
                    filter.date_of_birth.get_or_insert_with(Bounds::default).max = Some(value.clone())
                }
                _ => tracing::debug!(param = %key, "ignoring unknown search parameter"),
            }
        }
        Ok(filter)
    }
}

impl Filter for UserFilter {
    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            limit: self.limit,
        }
    }

    fn term(&self) -> Option<&str> {
        self.q.as_deref()
    }

    fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    fn criteria(&self) -> Criteria {
        let mut criteria = Criteria::default();
        criteria.value("id", self.id.as_deref());
        criteria.value("username", self.username.as_deref());
        criteria.value("name", self.name.as_deref());
        criteria.value("email", self.email.as_deref());
        criteria.value("phone", self.phone.as_deref());
        criteria.value("status", self.status.as_deref());
        criteria.values("interests", self.interests.as_deref());
        criteria.range("dateOfBirth", self.date_of_birth.as_ref());
        criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Criterion;

    #[test]
    fn user_serializes_camel_case_and_skips_absent() {
        let user = User {
            id: "u1".into(),
            name: Some("Alice".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 2),
            ..Default::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({"id": "u1", "name": "Alice", "dateOfBirth": "1990-04-02"}));
    }

    #[test]
    fn query_string_decodes_lists_and_bounds() {
        let params: HashMap<String, String> = [
            ("page", "2"),
            ("limit", "10"),
            ("interests", "chess, go,,"),
            ("dateOfBirth.min", "1990-01-01"),
            ("unknown", "x"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let filter = UserFilter::from_query(&params).unwrap();
        assert_eq!(filter.page, Some(2));
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.interests, Some(vec!["chess".to_string(), "go".to_string()]));
        let criteria = filter.criteria();
        assert!(matches!(
            criteria.get("dateOfBirth"),
            Some(Criterion::Range(Bounds { min: Some(_), max: None }))
        ));
    }

    #[test]
    fn non_numeric_limit_is_bad_request() {
        let params: HashMap<String, String> = [("limit".to_string(), "ten".to_string())].into_iter().collect();
        let err = UserFilter::from_query(&params).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn empty_fields_are_not_criteria() {
        let filter = UserFilter {
            name: Some("".into()),
            interests: Some(vec![]),
            ..Default::default()
        };
        assert!(filter.criteria().is_empty());
    }
}
