//! In-process document store with the same predicate, ordering and outcome rules as PostgreSQL.

use crate::error::StoreError;
use crate::model::{ResourceSchema, ValueType};
use crate::query::{Predicate, Query, SortKey};
use crate::store::{CreateOutcome, DeleteOutcome, Document, DocumentStore, WriteOutcome};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct MemoryDocumentStore {
    schema: &'static ResourceSchema,
    docs: RwLock<BTreeMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new(schema: &'static ResourceSchema) -> Self {
        MemoryDocumentStore {
            schema,
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Document>>, StoreError> {
        self.docs
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Document>>, StoreError> {
        self.docs
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    /// Another document already holds one of `doc`'s unique attribute values.
    fn violates_unique(&self, docs: &BTreeMap<String, Document>, id: &str, doc: &Document) -> bool {
        self.schema.unique.iter().any(|attr| match doc.get(*attr) {
            None | Some(Value::Null) => false,
            Some(v) => docs
                .iter()
                .any(|(other_id, other)| other_id != id && other.get(*attr) == Some(v)),
        })
    }

    fn matching<'a>(&self, docs: &'a BTreeMap<String, Document>, predicates: &[Predicate]) -> Vec<&'a Document> {
        docs.values()
            .filter(|doc| predicates.iter().all(|p| matches(p, doc)))
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn find_one(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn insert(&self, id: &str, doc: &Document) -> Result<CreateOutcome, StoreError> {
        let mut docs = self.write()?;
        if docs.contains_key(id) || self.violates_unique(&docs, id, doc) {
            return Ok(CreateOutcome::Conflict);
        }
        docs.insert(id.to_string(), doc.clone());
        Ok(CreateOutcome::Created)
    }

    async fn replace(&self, id: &str, doc: &Document) -> Result<WriteOutcome, StoreError> {
        let mut docs = self.write()?;
        if !docs.contains_key(id) {
            return Ok(WriteOutcome::NotFound);
        }
        if self.violates_unique(&docs, id, doc) {
            return Ok(WriteOutcome::Conflict);
        }
        docs.insert(id.to_string(), doc.clone());
        Ok(WriteOutcome::Updated)
    }

    async fn merge(&self, id: &str, fields: &Document) -> Result<WriteOutcome, StoreError> {
        let mut docs = self.write()?;
        let Some(existing) = docs.get(id) else {
            return Ok(WriteOutcome::NotFound);
        };
        let mut merged = existing.clone();
        for (k, v) in fields {
            merged.insert(k.clone(), v.clone());
        }
        if self.violates_unique(&docs, id, &merged) {
            return Ok(WriteOutcome::Conflict);
        }
        docs.insert(id.to_string(), merged);
        Ok(WriteOutcome::Updated)
    }

    async fn remove(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        match self.write()?.remove(id) {
            Some(_) => Ok(DeleteOutcome::Deleted),
            None => Ok(DeleteOutcome::NotFound),
        }
    }

    async fn find(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let docs = self.read()?;
        let mut found = self.matching(&docs, &query.predicates);
        found.sort_by(|a, b| compare_docs(a, b, &query.sort));
        let (offset, limit) = match query.window {
            Some(w) => (
                usize::try_from(w.offset).unwrap_or(usize::MAX),
                usize::try_from(w.limit).unwrap_or(usize::MAX),
            ),
            None => (0, usize::MAX),
        };
        Ok(found.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError> {
        let docs = self.read()?;
        Ok(self.matching(&docs, predicates).len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

/// Scalar value as text, the way `doc->>'name'` reads it.
fn text(doc: &Document, name: &str) -> Option<String> {
    match doc.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare(value_type: ValueType, a: &str, b: &str) -> Option<Ordering> {
    match value_type {
        ValueType::Date => {
            let a = NaiveDate::parse_from_str(a, "%Y-%m-%d").ok()?;
            let b = NaiveDate::parse_from_str(b, "%Y-%m-%d").ok()?;
            Some(a.cmp(&b))
        }
        ValueType::Number => a.parse::<f64>().ok()?.partial_cmp(&b.parse::<f64>().ok()?),
        ValueType::Text | ValueType::Bool | ValueType::TextList => Some(a.cmp(b)),
    }
}

fn matches(predicate: &Predicate, doc: &Document) -> bool {
    match predicate {
        Predicate::Eq { attribute, value } => text(doc, attribute.name)
            .and_then(|t| compare(attribute.value_type, &t, value))
            == Some(Ordering::Equal),
        Predicate::Prefix { attribute, term } => text(doc, attribute.name)
            .map(|t| t.to_lowercase().starts_with(&term.to_lowercase()))
            .unwrap_or(false),
        Predicate::Contains { attribute, term } => text(doc, attribute.name)
            .map(|t| t.to_lowercase().contains(&term.to_lowercase()))
            .unwrap_or(false),
        Predicate::Range { attribute, min, max } => {
            let Some(t) = text(doc, attribute.name) else { return false };
            let above = min
                .as_deref()
                .map(|m| matches!(compare(attribute.value_type, &t, m), Some(Ordering::Greater | Ordering::Equal)))
                .unwrap_or(true);
            let below = max
                .as_deref()
                .map(|m| matches!(compare(attribute.value_type, &t, m), Some(Ordering::Less | Ordering::Equal)))
                .unwrap_or(true);
            above && below
        }
        Predicate::In { attribute, values } => text(doc, attribute.name)
            .map(|t| {
                values
                    .iter()
                    .any(|v| compare(attribute.value_type, &t, v) == Some(Ordering::Equal))
            })
            .unwrap_or(false),
        Predicate::Overlaps { attribute, values } => doc
            .get(attribute.name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|item| values.iter().any(|v| v == item))
            })
            .unwrap_or(false),
        Predicate::Text { attributes, term } => {
            let term = term.to_lowercase();
            attributes.iter().any(|a| {
                text(doc, a.name)
                    .map(|t| t.to_lowercase().contains(&term))
                    .unwrap_or(false)
            })
        }
    }
}

/// Missing values sort last in both directions (`NULLS LAST`).
fn compare_docs(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let name = key.attribute.name;
        let ord = match (text(a, name), text(b, name)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let o = compare(key.attribute.value_type, &x, &y).unwrap_or(Ordering::Equal);
                if key.descending {
                    o.reverse()
                } else {
                    o
                }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribute, USER_SCHEMA};
    use crate::query::Window;
    use serde_json::json;

    fn attr(name: &str) -> Attribute {
        *USER_SCHEMA.attribute(name).unwrap()
    }

    fn doc(v: Value) -> Document {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new(&USER_SCHEMA);
        let users = [
            json!({"id": "u1", "name": "Alice Smith", "email": "alice@x.com", "dateOfBirth": "1990-05-01", "interests": ["chess"]}),
            json!({"id": "u2", "name": "Bob", "email": "bob@x.com", "dateOfBirth": "1985-01-20", "status": "active"}),
            json!({"id": "u3", "name": "alicia", "email": "alicia@y.org", "interests": ["go", "chess"]}),
        ];
        for u in users {
            let d = doc(u);
            let id = d["id"].as_str().unwrap().to_string();
            assert_eq!(store.insert(&id, &d).await.unwrap(), CreateOutcome::Created);
        }
        store
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d["id"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn duplicate_key_or_unique_value_conflicts() {
        let store = seeded().await;
        let dup_key = doc(json!({"id": "u1", "email": "new@x.com"}));
        assert_eq!(store.insert("u1", &dup_key).await.unwrap(), CreateOutcome::Conflict);
        let dup_email = doc(json!({"id": "u9", "email": "bob@x.com"}));
        assert_eq!(store.insert("u9", &dup_email).await.unwrap(), CreateOutcome::Conflict);
        assert_eq!(store.count(&[]).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn merge_touches_only_given_fields() {
        let store = seeded().await;
        let fields = doc(json!({"name": "Alicia"}));
        assert_eq!(store.merge("u1", &fields).await.unwrap(), WriteOutcome::Updated);
        let after = store.find_one("u1").await.unwrap().unwrap();
        assert_eq!(after["name"], json!("Alicia"));
        assert_eq!(after["email"], json!("alice@x.com"));
        assert_eq!(store.merge("nope", &fields).await.unwrap(), WriteOutcome::NotFound);
        let steal = doc(json!({"email": "bob@x.com"}));
        assert_eq!(store.merge("u1", &steal).await.unwrap(), WriteOutcome::Conflict);
    }

    #[tokio::test]
    async fn predicates_filter_documents() {
        let store = seeded().await;
        let query = Query {
            predicates: vec![Predicate::Contains {
                attribute: attr("name"),
                term: "ALI".into(),
            }],
            ..Default::default()
        };
        assert_eq!(ids(&store.find(&query).await.unwrap()), vec!["u1", "u3"]);

        let query = Query {
            predicates: vec![Predicate::Range {
                attribute: attr("dateOfBirth"),
                min: Some("1986-01-01".into()),
                max: None,
            }],
            ..Default::default()
        };
        assert_eq!(ids(&store.find(&query).await.unwrap()), vec!["u1"]);

        let overlaps = vec![Predicate::Overlaps {
            attribute: attr("interests"),
            values: vec!["go".into(), "poker".into()],
        }];
        assert_eq!(store.count(&overlaps).await.unwrap(), 1);

        let text = vec![Predicate::Text {
            attributes: vec![attr("name"), attr("email")],
            term: "y.org".into(),
        }];
        assert_eq!(store.count(&text).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sort_puts_missing_last_and_windows() {
        let store = seeded().await;
        let query = Query {
            predicates: vec![],
            sort: vec![
                SortKey {
                    attribute: attr("dateOfBirth"),
                    descending: true,
                },
                SortKey {
                    attribute: attr("id"),
                    descending: false,
                },
            ],
            window: Some(Window { offset: 1, limit: 5 }),
        };
        assert_eq!(ids(&store.find(&query).await.unwrap()), vec!["u2", "u3"]);
    }
}
