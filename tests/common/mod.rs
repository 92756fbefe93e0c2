#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use user_service::model::{ResourceSchema, USER_SCHEMA};
use user_service::query::{Predicate, Query};
use user_service::store::{self, CreateOutcome, DeleteOutcome, Document, DocumentStore, WriteOutcome};
use user_service::{config::AppConfig, routes, AppState, StoreError};

/// Full router over a fresh in-memory store.
pub async fn app() -> Result<Router> {
    app_with(AppConfig::default()).await
}

pub async fn app_with(mut config: AppConfig) -> Result<Router> {
    config.store.uri = "memory://".into();
    let store = store::connect(&config.store, &USER_SCHEMA).await?;
    let state = AppState::new(store, &config.search)?;
    Ok(routes::app(state, &config)?)
}

/// Store whose every call fails, as if the database were unreachable.
pub struct UnreachableStore;

fn unreachable_store() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

#[async_trait]
impl DocumentStore for UnreachableStore {
    fn schema(&self) -> &'static ResourceSchema {
        &USER_SCHEMA
    }

    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        Err(unreachable_store())
    }

    async fn find_one(&self, _id: &str) -> Result<Option<Document>, StoreError> {
        Err(unreachable_store())
    }

    async fn insert(&self, _id: &str, _doc: &Document) -> Result<CreateOutcome, StoreError> {
        Err(unreachable_store())
    }

    async fn replace(&self, _id: &str, _doc: &Document) -> Result<WriteOutcome, StoreError> {
        Err(unreachable_store())
    }

    async fn merge(&self, _id: &str, _fields: &Document) -> Result<WriteOutcome, StoreError> {
        Err(unreachable_store())
    }

    async fn remove(&self, _id: &str) -> Result<DeleteOutcome, StoreError> {
        Err(unreachable_store())
    }

    async fn find(&self, _query: &Query) -> Result<Vec<Document>, StoreError> {
        Err(unreachable_store())
    }

    async fn count(&self, _predicates: &[Predicate]) -> Result<u64, StoreError> {
        Err(unreachable_store())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(unreachable_store())
    }
}

/// Full router over a store that always fails.
pub fn unreachable_app() -> Result<Router> {
    let config = AppConfig::default();
    let state = AppState::new(Arc::new(UnreachableStore), &config.search)?;
    Ok(routes::app(state, &config)?)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<Reply> {
    let body = body.map(|v| v.to_string()).unwrap_or_default();
    send_raw(app, method, uri, body).await
}

pub async fn send_raw(app: &Router, method: &str, uri: &str, body: impl Into<Body>) -> Result<Reply> {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())?;
    let res = app.clone().oneshot(req).await?;
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = to_bytes(res.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok(Reply { status, headers, body })
}
