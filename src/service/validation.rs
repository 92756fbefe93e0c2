//! Payload validation from per-attribute rules.

use crate::error::{AppError, ConfigError};
use crate::model::{ResourceSchema, ValueType};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Field-level validation failure returned to the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    pub field: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorMessage {
    pub fn new(field: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorMessage {
            field: field.into(),
            code: code.into(),
            param: None,
            message: None,
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub format: Option<String>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub pattern: Option<String>,
    pub allowed: Option<Vec<String>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

struct CompiledRule {
    rule: ValidationRule,
    pattern: Option<Regex>,
}

/// Rules compiled once at startup. Client-input problems come back as a list;
/// `Err` is reserved for failures of the validator itself.
pub struct Validator {
    schema: &'static ResourceSchema,
    rules: HashMap<&'static str, CompiledRule>,
}

impl Validator {
    pub fn new(
        schema: &'static ResourceSchema,
        rules: Vec<(&'static str, ValidationRule)>,
    ) -> Result<Self, ConfigError> {
        let mut compiled = HashMap::with_capacity(rules.len());
        for (field, rule) in rules {
            if schema.attribute(field).is_none() {
                return Err(ConfigError::InvalidRule {
                    field: field.to_string(),
                    reason: format!("not an attribute of {}", schema.collection),
                });
            }
            let pattern = match &rule.pattern {
                Some(p) => Some(Regex::new(p).map_err(|e| ConfigError::InvalidRule {
                    field: field.to_string(),
                    reason: e.to_string(),
                })?),
                None => None,
            };
            compiled.insert(field, CompiledRule { rule, pattern });
        }
        Ok(Validator {
            schema,
            rules: compiled,
        })
    }

    /// Validate a full document: every attribute is type checked and required rules apply.
    pub fn validate(&self, doc: &Map<String, Value>) -> Result<Vec<ErrorMessage>, AppError> {
        let mut errors = Vec::new();
        for attribute in self.schema.attributes {
            let value = doc.get(attribute.name);
            let rule = self.rules.get(attribute.name);
            if rule.map(|r| r.rule.required).unwrap_or(false) && is_missing(value) {
                errors.push(required(attribute.name));
                continue;
            }
            if let Some(v) = value {
                self.check(attribute.name, attribute.value_type, v, rule, &mut errors)?;
            }
        }
        Ok(errors)
    }

    /// Validate only the supplied fields (PATCH). A required field explicitly cleared is an error.
    pub fn validate_partial(&self, fields: &Map<String, Value>) -> Result<Vec<ErrorMessage>, AppError> {
        let mut errors = Vec::new();
        for (name, value) in fields {
            let Some(attribute) = self.schema.attribute(name) else { continue };
            let rule = self.rules.get(attribute.name);
            if rule.map(|r| r.rule.required).unwrap_or(false) && is_missing(Some(value)) {
                errors.push(required(attribute.name));
                continue;
            }
            self.check(attribute.name, attribute.value_type, value, rule, &mut errors)?;
        }
        Ok(errors)
    }

    fn check(
        &self,
        field: &str,
        value_type: ValueType,
        v: &Value,
        rule: Option<&CompiledRule>,
        errors: &mut Vec<ErrorMessage>,
    ) -> Result<(), AppError> {
        if v.is_null() {
            return Ok(());
        }
        if !type_matches(value_type, v) {
            errors.push(
                ErrorMessage::new(field, "type")
                    .with_param(value_type.as_str())
                    .with_message(format!("{} must be a {}", field, value_type)),
            );
            return Ok(());
        }
        let Some(CompiledRule { rule, pattern }) = rule else {
            return Ok(());
        };

        if let Some(format) = &rule.format {
            if let Some(e) = check_format(field, v, format)? {
                errors.push(e);
            }
        }
        if let Some(s) = v.as_str() {
            let len = s.chars().count();
            if let Some(max) = rule.max_length {
                if len > max {
                    errors.push(
                        ErrorMessage::new(field, "maxlength")
                            .with_param(max.to_string())
                            .with_message(format!("{} must be at most {} characters", field, max)),
                    );
                }
            }
            if let Some(min) = rule.min_length {
                if len < min {
                    errors.push(
                        ErrorMessage::new(field, "minlength")
                            .with_param(min.to_string())
                            .with_message(format!("{} must be at least {} characters", field, min)),
                    );
                }
            }
            if let Some(re) = pattern {
                if !re.is_match(s) {
                    errors.push(
                        ErrorMessage::new(field, "pattern")
                            .with_message(format!("{} does not match required pattern", field)),
                    );
                }
            }
            if let Some(allowed) = &rule.allowed {
                if !allowed.iter().any(|a| a == s) {
                    errors.push(
                        ErrorMessage::new(field, "enum")
                            .with_param(allowed.join(","))
                            .with_message(format!("{} must be one of: {}", field, allowed.join(", "))),
                    );
                }
            }
        }
        if let Some(n) = v.as_f64() {
            if let Some(min) = rule.minimum {
                if n < min {
                    errors.push(
                        ErrorMessage::new(field, "min")
                            .with_param(min.to_string())
                            .with_message(format!("{} must be at least {}", field, min)),
                    );
                }
            }
            if let Some(max) = rule.maximum {
                if n > max {
                    errors.push(
                        ErrorMessage::new(field, "max")
                            .with_param(max.to_string())
                            .with_message(format!("{} must be at most {}", field, max)),
                    );
                }
            }
        }
        Ok(())
    }
}

fn is_missing(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn required(field: &str) -> ErrorMessage {
    ErrorMessage::new(field, "required").with_message(format!("{} is required", field))
}

fn type_matches(value_type: ValueType, v: &Value) -> bool {
    match value_type {
        ValueType::Text => v.is_string(),
        ValueType::Number => v.is_number(),
        ValueType::Bool => v.is_boolean(),
        ValueType::Date => v
            .as_str()
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
            .unwrap_or(false),
        ValueType::TextList => v
            .as_array()
            .map(|items| items.iter().all(Value::is_string))
            .unwrap_or(false),
    }
}

fn check_format(field: &str, v: &Value, format: &str) -> Result<Option<ErrorMessage>, AppError> {
    let Some(s) = v.as_str() else { return Ok(None) };
    let ok = match format.to_lowercase().as_str() {
        "email" => {
            let mut parts = s.splitn(2, '@');
            let local = parts.next().unwrap_or_default();
            let domain = parts.next().unwrap_or_default();
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        "uuid" => uuid::Uuid::parse_str(s).is_ok(),
        "date" => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        other => {
            return Err(AppError::Internal(format!(
                "unknown format '{}' in rule for {}",
                other, field
            )))
        }
    };
    if ok {
        Ok(None)
    } else {
        Ok(Some(
            ErrorMessage::new(field, format)
                .with_message(format!("{} must be a valid {}", field, format)),
        ))
    }
}
