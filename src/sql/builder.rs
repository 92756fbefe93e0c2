//! Builds parameterized statements over a `(id TEXT, doc JSONB)` collection table.

use crate::model::{Attribute, ResourceSchema, ValueType};
use crate::query::{escape_like, Predicate, Query, SortKey};
use crate::sql::BindValue;
use crate::store::Document;
use serde_json::Value;

/// Key column.
const ID: &str = "id";
/// Document column.
const DOC: &str = "doc";

/// Quote identifier for PostgreSQL (safe: only from static schema tables).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Quote a string literal (JSON path keys).
fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: BindValue) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }
}

/// Text value of an attribute: the key column or `doc->>'name'`.
fn text_expr(schema: &ResourceSchema, attribute: &Attribute) -> String {
    if schema.is_key(attribute.name) {
        quoted(ID)
    } else {
        format!("{}->>{}", quoted(DOC), literal(attribute.name))
    }
}

/// Attribute value cast for typed comparison and ordering.
fn typed_expr(schema: &ResourceSchema, attribute: &Attribute) -> String {
    let text = text_expr(schema, attribute);
    match cast(attribute.value_type) {
        "" => text,
        c => format!("({}){}", text, c),
    }
}

fn cast(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Date => "::date",
        ValueType::Number => "::numeric",
        ValueType::Bool => "::boolean",
        ValueType::Text | ValueType::TextList => "",
    }
}

fn array_cast(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Date => "::date[]",
        ValueType::Number => "::numeric[]",
        ValueType::Bool => "::boolean[]",
        ValueType::Text | ValueType::TextList => "::text[]",
    }
}

pub fn create_table(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} TEXT PRIMARY KEY, {} JSONB NOT NULL)",
        quoted(table),
        quoted(ID),
        quoted(DOC)
    )
}

/// Unique expression index enforcing one document per attribute value.
pub fn create_unique_index(table: &str, attribute: &str) -> String {
    format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} (({}->>{}))",
        quoted(&format!("{}_{}_key", table, attribute)),
        quoted(table),
        quoted(DOC),
        literal(attribute)
    )
}

pub fn select_all(table: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT {} FROM {} ORDER BY {}", quoted(DOC), quoted(table), quoted(ID));
    q
}

pub fn select_by_id(table: &str, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Text(id.to_string()));
    q.sql = format!("SELECT {} FROM {} WHERE {} = ${}", quoted(DOC), quoted(table), quoted(ID), n);
    q
}

/// INSERT that writes nothing (0 rows) when the key or a unique attribute is taken.
pub fn insert(table: &str, id: &str, doc: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_param = q.push_param(BindValue::Text(id.to_string()));
    let doc_param = q.push_param(BindValue::Json(Value::Object(doc.clone())));
    q.sql = format!(
        "INSERT INTO {} ({}, {}) VALUES (${}, ${}) ON CONFLICT DO NOTHING",
        quoted(table),
        quoted(ID),
        quoted(DOC),
        id_param,
        doc_param
    );
    q
}

pub fn replace(table: &str, id: &str, doc: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_param = q.push_param(BindValue::Text(id.to_string()));
    let doc_param = q.push_param(BindValue::Json(Value::Object(doc.clone())));
    q.sql = format!(
        "UPDATE {} SET {} = ${} WHERE {} = ${}",
        quoted(table),
        quoted(DOC),
        doc_param,
        quoted(ID),
        id_param
    );
    q
}

/// UPDATE writing only the given top-level fields (`doc || patch`).
pub fn merge(table: &str, id: &str, fields: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_param = q.push_param(BindValue::Text(id.to_string()));
    let doc_param = q.push_param(BindValue::Json(Value::Object(fields.clone())));
    q.sql = format!(
        "UPDATE {} SET {} = {} || ${} WHERE {} = ${}",
        quoted(table),
        quoted(DOC),
        quoted(DOC),
        doc_param,
        quoted(ID),
        id_param
    );
    q
}

pub fn delete(table: &str, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Text(id.to_string()));
    q.sql = format!("DELETE FROM {} WHERE {} = ${}", quoted(table), quoted(ID), n);
    q
}

/// SELECT with all predicates ANDed, ORDER BY the sort keys, LIMIT/OFFSET from the window.
pub fn select_page(table: &str, schema: &ResourceSchema, query: &Query) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, schema, &query.predicates);
    let order_clause = order_clause(schema, &query.sort);
    let window_clause = query
        .window
        .map(|w| format!(" LIMIT {} OFFSET {}", w.limit, w.offset))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}",
        quoted(DOC),
        quoted(table),
        where_clause,
        order_clause,
        window_clause
    );
    q
}

pub fn count(table: &str, schema: &ResourceSchema, predicates: &[Predicate]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(&mut q, schema, predicates);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(table), where_clause);
    q
}

fn where_clause(q: &mut QueryBuf, schema: &ResourceSchema, predicates: &[Predicate]) -> String {
    let parts: Vec<String> = predicates.iter().map(|p| condition(q, schema, p)).collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn condition(q: &mut QueryBuf, schema: &ResourceSchema, predicate: &Predicate) -> String {
    match predicate {
        Predicate::Eq { attribute, value } => {
            let n = q.push_param(BindValue::Text(value.clone()));
            format!("{} = ${}{}", typed_expr(schema, attribute), n, cast(attribute.value_type))
        }
        Predicate::Prefix { attribute, term } => {
            let n = q.push_param(BindValue::Text(format!("{}%", escape_like(term))));
            format!("{} ILIKE ${}", text_expr(schema, attribute), n)
        }
        Predicate::Contains { attribute, term } => {
            let n = q.push_param(BindValue::Text(format!("%{}%", escape_like(term))));
            format!("{} ILIKE ${}", text_expr(schema, attribute), n)
        }
        Predicate::Range { attribute, min, max } => {
            let expr = typed_expr(schema, attribute);
            let c = cast(attribute.value_type);
            let mut bounds = Vec::new();
            if let Some(min) = min {
                let n = q.push_param(BindValue::Text(min.clone()));
                bounds.push(format!("{} >= ${}{}", expr, n, c));
            }
            if let Some(max) = max {
                let n = q.push_param(BindValue::Text(max.clone()));
                bounds.push(format!("{} <= ${}{}", expr, n, c));
            }
            if bounds.is_empty() {
                "TRUE".to_string()
            } else {
                format!("({})", bounds.join(" AND "))
            }
        }
        Predicate::In { attribute, values } => {
            let n = q.push_param(BindValue::TextArray(values.clone()));
            format!(
                "{} = ANY(${}{})",
                typed_expr(schema, attribute),
                n,
                array_cast(attribute.value_type)
            )
        }
        Predicate::Overlaps { attribute, values } => {
            let n = q.push_param(BindValue::TextArray(values.clone()));
            format!("{}->{} ?| ${}::text[]", quoted(DOC), literal(attribute.name), n)
        }
        Predicate::Text { attributes, term } => {
            let n = q.push_param(BindValue::Text(format!("%{}%", escape_like(term))));
            let ors: Vec<String> = attributes
                .iter()
                .map(|a| format!("{} ILIKE ${}", text_expr(schema, a), n))
                .collect();
            format!("({})", ors.join(" OR "))
        }
    }
}

fn order_clause(schema: &ResourceSchema, sort: &[SortKey]) -> String {
    if sort.is_empty() {
        return format!(" ORDER BY {}", quoted(ID));
    }
    let keys: Vec<String> = sort
        .iter()
        .map(|k| {
            format!(
                "{} {} NULLS LAST",
                typed_expr(schema, &k.attribute),
                if k.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    format!(" ORDER BY {}", keys.join(", "))
}
