//! Typed adapter over a `DocumentStore`: converts resources to and from documents.

use crate::error::StoreError;
use crate::model::{Patch, Resource};
use crate::query::Query;
use crate::store::{CreateOutcome, DeleteOutcome, Document, DocumentStore, WriteOutcome};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Repository {
            store,
            _resource: PhantomData,
        }
    }

    pub async fn all(&self) -> Result<Vec<T>, StoreError> {
        let docs = self
            .store
            .find_all()
            .await
            .inspect_err(|e| log_failure("all", None, e))?;
        docs.into_iter().map(decode::<T>).collect()
    }

    /// `Ok(None)` is not-found; store failures are always `Err`.
    pub async fn load(&self, id: &str) -> Result<Option<T>, StoreError> {
        let doc = self
            .store
            .find_one(id)
            .await
            .inspect_err(|e| log_failure("load", Some(id), e))?;
        doc.map(decode::<T>).transpose()
    }

    pub async fn create(&self, item: &T) -> Result<CreateOutcome, StoreError> {
        let doc = encode(item)?;
        self.store
            .insert(item.id(), &doc)
            .await
            .inspect_err(|e| log_failure("create", Some(item.id()), e))
    }

    pub async fn update(&self, item: &T) -> Result<WriteOutcome, StoreError> {
        let doc = encode(item)?;
        self.store
            .replace(item.id(), &doc)
            .await
            .inspect_err(|e| log_failure("update", Some(item.id()), e))
    }

    pub async fn patch(&self, id: &str, patch: &Patch) -> Result<WriteOutcome, StoreError> {
        self.store
            .merge(id, patch.fields())
            .await
            .inspect_err(|e| log_failure("patch", Some(id), e))
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        self.store
            .remove(id)
            .await
            .inspect_err(|e| log_failure("delete", Some(id), e))
    }

    /// One page of matches plus the total over the same predicates.
    pub async fn search(&self, query: &Query) -> Result<(Vec<T>, u64), StoreError> {
        let docs = self
            .store
            .find(query)
            .await
            .inspect_err(|e| log_failure("search", None, e))?;
        let total = self
            .store
            .count(&query.predicates)
            .await
            .inspect_err(|e| log_failure("count", None, e))?;
        let items = docs.into_iter().map(decode::<T>).collect::<Result<Vec<T>, _>>()?;
        Ok((items, total))
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

fn log_failure(op: &'static str, id: Option<&str>, e: &StoreError) {
    tracing::error!(op, id = id.unwrap_or_default(), error = %e, "store operation failed");
}

fn encode<T: Resource>(item: &T) -> Result<Document, StoreError> {
    Ok(serde_json::from_value(serde_json::to_value(item)?)?)
}

/// Patched nulls are stored as-is; they read back as absent fields.
fn decode<T: Resource>(mut doc: Document) -> Result<T, StoreError> {
    doc.retain(|_, v| !v.is_null());
    Ok(serde_json::from_value(Value::Object(doc))?)
}
