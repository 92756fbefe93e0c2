//! User CRUD and search handlers.

use crate::error::AppError;
use crate::model::{Patch, SearchResult, User, UserFilter, USER_SCHEMA};
use crate::service::ErrorMessage;
use crate::state::AppState;
use crate::store::{CreateOutcome, DeleteOutcome, WriteOutcome};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn path_id(id: &str) -> Result<&str, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::BadRequest("id is required".into()));
    }
    Ok(id)
}

fn json_object(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
    }
}

/// Adopt the path id when the body carries none; a different body id is rejected.
fn reconcile_id(body: &mut Map<String, Value>, id: &str) -> Result<(), AppError> {
    let key = USER_SCHEMA.key;
    match body.get(key) {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) if s.is_empty() || s == id => {}
        Some(_) => return Err(AppError::BadRequest("body id does not match path id".into())),
    }
    body.insert(key.to_string(), Value::String(id.to_string()));
    Ok(())
}

fn reject_invalid(errors: Vec<ErrorMessage>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn decode_user(mut body: Map<String, Value>) -> Result<User, AppError> {
    body.retain(|_, v| !v.is_null());
    serde_json::from_value(Value::Object(body)).map_err(|e| AppError::BadRequest(format!("invalid user: {}", e)))
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("user {} not found", id))
}

/// GET /users
pub async fn all(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.all().await?))
}

/// GET /users/:id
pub async fn load(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<User>, AppError> {
    let id = path_id(&id)?;
    let user = state.users.load(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(user))
}

/// POST /users
pub async fn create(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<User>), AppError> {
    let body = json_object(&body)?;
    reject_invalid(state.validator.validate(&body)?)?;
    let user = decode_user(body)?;
    match state.users.create(user).await? {
        (CreateOutcome::Created, user) => Ok((StatusCode::CREATED, Json(user))),
        (CreateOutcome::Conflict, user) => Err(AppError::Conflict(format!("user {} already exists", user.id))),
    }
}

/// PUT /users/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    let id = path_id(&id)?;
    let mut body = json_object(&body)?;
    reconcile_id(&mut body, id)?;
    reject_invalid(state.validator.validate(&body)?)?;
    let user = decode_user(body)?;
    match state.users.update(&user).await? {
        WriteOutcome::Updated => Ok(Json(user)),
        WriteOutcome::NotFound => Err(not_found(id)),
        WriteOutcome::Conflict => Err(AppError::Conflict(format!("user {} conflicts with an existing user", id))),
    }
}

/// PATCH /users/:id: only the fields present in the body are written.
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let id = path_id(&id)?;
    let mut body = json_object(&body)?;
    reconcile_id(&mut body, id)?;
    let patch = Patch::from_body(&USER_SCHEMA, body);
    reject_invalid(state.validator.validate_partial(patch.fields())?)?;
    match state.users.patch(id, &patch).await? {
        WriteOutcome::Updated => Ok(Json(patch.to_response(USER_SCHEMA.key, id))),
        WriteOutcome::NotFound => Err(not_found(id)),
        WriteOutcome::Conflict => Err(AppError::Conflict(format!("user {} conflicts with an existing user", id))),
    }
}

/// DELETE /users/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<u64>, AppError> {
    let id = path_id(&id)?;
    match state.users.delete(id).await? {
        DeleteOutcome::Deleted => Ok(Json(1)),
        DeleteOutcome::NotFound => Err(not_found(id)),
    }
}

/// Any id-bearing method on `/users/` with an empty id.
pub async fn missing_id() -> AppError {
    AppError::BadRequest("id is required".into())
}

/// Decode the query string; failures use the same error envelope as every other 400.
fn query_params(uri: &Uri) -> Result<HashMap<String, String>, AppError> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .map_err(|e| AppError::BadRequest(format!("invalid query string: {}", e.body_text())))
}

/// GET /users/search
pub async fn search_get(State(state): State<AppState>, uri: Uri) -> Result<Json<SearchResult<User>>, AppError> {
    let params = query_params(&uri)?;
    let filter = UserFilter::from_query(&params)?;
    search(&state, &filter).await
}

/// POST /users/search; an empty body is an empty filter.
pub async fn search_post(State(state): State<AppState>, body: Bytes) -> Result<Json<SearchResult<User>>, AppError> {
    let filter = if body.iter().all(u8::is_ascii_whitespace) {
        UserFilter::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(format!("invalid filter: {}", e)))?
    };
    search(&state, &filter).await
}

async fn search(state: &AppState, filter: &UserFilter) -> Result<Json<SearchResult<User>>, AppError> {
    let query = state.queries.build(filter)?;
    Ok(Json(state.users.search(&query).await?))
}
