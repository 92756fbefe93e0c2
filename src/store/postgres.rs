//! PostgreSQL document store: one `(id TEXT PRIMARY KEY, doc JSONB)` table per collection.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::ResourceSchema;
use crate::query::{Predicate, Query};
use crate::sql::{self, QueryBuf};
use crate::store::{CreateOutcome, DeleteOutcome, Document, DocumentStore, WriteOutcome};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

pub struct PgDocumentStore {
    pool: PgPool,
    table: String,
    schema: &'static ResourceSchema,
}

impl PgDocumentStore {
    /// Connect, creating the database, the collection table and its unique indexes if missing.
    pub async fn connect(config: &StoreConfig, schema: &'static ResourceSchema) -> Result<Self, StoreError> {
        let mut opts = PgConnectOptions::from_str(&config.uri)?;
        if let Some(db) = config.database.as_deref().filter(|d| !d.is_empty()) {
            opts = opts.database(db);
        }
        ensure_database_exists(&opts).await?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(opts)
            .await?;
        let table = config.collection.clone().unwrap_or_else(|| schema.collection.to_string());
        ensure_collection(&pool, &table, schema).await?;
        tracing::info!(table = %table, "document store ready");
        Ok(Self::from_pool(pool, table, schema))
    }

    pub fn from_pool(pool: PgPool, table: impl Into<String>, schema: &'static ResourceSchema) -> Self {
        PgDocumentStore {
            pool,
            table: table.into(),
            schema,
        }
    }

    async fn execute(&self, q: QueryBuf) -> Result<u64, sqlx::Error> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let QueryBuf { sql, params } = q;
        let mut query = sqlx::query(&sql);
        for p in params {
            query = query.bind(p);
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    async fn fetch_docs(&self, q: QueryBuf) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let QueryBuf { sql, params } = q;
        let mut query = sqlx::query_scalar::<_, Json<Document>>(&sql);
        for p in params {
            query = query.bind(p);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    /// 0 rows is NotFound; a unique index violation is Conflict.
    async fn write(&self, q: QueryBuf) -> Result<WriteOutcome, StoreError> {
        match self.execute(q).await {
            Ok(0) => Ok(WriteOutcome::NotFound),
            Ok(_) => Ok(WriteOutcome::Updated),
            Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        self.fetch_docs(sql::select_all(&self.table)).await
    }

    async fn find_one(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let mut docs = self.fetch_docs(sql::select_by_id(&self.table, id)).await?;
        Ok(docs.pop())
    }

    async fn insert(&self, id: &str, doc: &Document) -> Result<CreateOutcome, StoreError> {
        match self.execute(sql::insert(&self.table, id, doc)).await {
            Ok(0) => Ok(CreateOutcome::Conflict),
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if is_unique_violation(&e) => Ok(CreateOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, id: &str, doc: &Document) -> Result<WriteOutcome, StoreError> {
        self.write(sql::replace(&self.table, id, doc)).await
    }

    async fn merge(&self, id: &str, fields: &Document) -> Result<WriteOutcome, StoreError> {
        self.write(sql::merge(&self.table, id, fields)).await
    }

    async fn remove(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        match self.execute(sql::delete(&self.table, id)).await? {
            0 => Ok(DeleteOutcome::NotFound),
            _ => Ok(DeleteOutcome::Deleted),
        }
    }

    async fn find(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.fetch_docs(sql::select_page(&self.table, self.schema, query)).await
    }

    async fn count(&self, predicates: &[Predicate]) -> Result<u64, StoreError> {
        let q = sql::count(&self.table, self.schema, predicates);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let QueryBuf { sql, params } = q;
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for p in params {
            query = query.bind(p);
        }
        let total = query.fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Create the collection table and one unique index per unique attribute.
pub async fn ensure_collection(pool: &PgPool, table: &str, schema: &ResourceSchema) -> Result<(), StoreError> {
    sqlx::query(&sql::create_table(table)).execute(pool).await?;
    for attribute in schema.unique {
        sqlx::query(&sql::create_unique_index(table, attribute)).execute(pool).await?;
    }
    Ok(())
}

/// Ensure the database named in `opts` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the pool.
pub async fn ensure_database_exists(opts: &PgConnectOptions) -> Result<(), StoreError> {
    let Some(db_name) = opts.get_database().map(str::to_string) else {
        return Ok(());
    };
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let mut conn = opts.clone().database("postgres").connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
