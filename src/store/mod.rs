//! Document store: JSON documents keyed by the collection's primary key.

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::{ensure_collection, ensure_database_exists, PgDocumentStore};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::ResourceSchema;
use crate::query::{Predicate, Query};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub type Document = Map<String, Value>;

/// URI scheme selecting the in-process store.
pub const MEMORY_URI_PREFIX: &str = "memory://";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Key or unique attribute already taken; nothing written.
    Conflict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Updated,
    NotFound,
    /// The write would break a uniqueness constraint; nothing written.
    Conflict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// CRUD primitives over one collection. Store failures are `Err`; "absent" and
/// "conflict" are ordinary outcomes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn schema(&self) -> &'static ResourceSchema;

    /// Every document, ordered by key.
    async fn find_all(&self) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, id: &str) -> Result<Option<Document>, StoreError>;

    async fn insert(&self, id: &str, doc: &Document) -> Result<CreateOutcome, StoreError>;

    /// Replace the whole document.
    async fn replace(&self, id: &str, doc: &Document) -> Result<WriteOutcome, StoreError>;

    /// Overwrite only the given top-level fields.
    async fn merge(&self, id: &str, fields: &Document) -> Result<WriteOutcome, StoreError>;

    async fn remove(&self, id: &str) -> Result<DeleteOutcome, StoreError>;

    /// Documents matching the query, sorted and windowed.
    async fn find(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Number of documents matching the predicates, ignoring any window.
    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Open the store named by `config.uri` for `schema`'s collection.
pub async fn connect(
    config: &StoreConfig,
    schema: &'static ResourceSchema,
) -> Result<Arc<dyn DocumentStore>, StoreError> {
    if config.uri.starts_with(MEMORY_URI_PREFIX) {
        tracing::warn!(collection = schema.collection, "using in-memory document store; data is not persisted");
        return Ok(Arc::new(MemoryDocumentStore::new(schema)));
    }
    let store = PgDocumentStore::connect(config, schema).await?;
    Ok(Arc::new(store))
}
