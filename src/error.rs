//! Typed errors and HTTP mapping.

use crate::service::ErrorMessage;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to clients for every 500; the detail only goes to the log.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Startup errors: configuration, schema tables, validation rules.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("filter field '{field}' has no target attribute '{target}'")]
    UnmappedFilterField { field: String, target: String },
    #[error("filter field '{field}': operator {op} does not apply to {value_type} attribute")]
    IncompatibleOperator {
        field: String,
        op: &'static str,
        value_type: &'static str,
    },
    #[error("validation rule for '{field}': {reason}")]
    InvalidRule { field: String, reason: String },
}

/// Document store I/O failures. Never interpreted as "not found".
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("document codec: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("validation failed ({} errors)", .0.len())]
    Validation(Vec<ErrorMessage>),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal: {0}")]
    Internal(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn validation(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![ErrorMessage::new(field, code).with_message(message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            AppError::Validation(errors) => return (status, Json(errors)).into_response(),
            AppError::BadRequest(m) => ("bad_request", m),
            AppError::NotFound(m) => ("not_found", m),
            AppError::Conflict(m) => ("conflict", m),
            AppError::Store(e) => {
                tracing::error!(error = %e, "store error");
                ("store_error", INTERNAL_SERVER_ERROR.to_string())
            }
            AppError::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                ("internal_error", INTERNAL_SERVER_ERROR.to_string())
            }
            AppError::Config(e) => {
                tracing::error!(error = %e, "config error");
                ("config_error", INTERNAL_SERVER_ERROR.to_string())
            }
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
