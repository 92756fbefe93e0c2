//! Common routes: health.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

/// 200 UP when the store answers a ping, 500 DOWN otherwise.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    match state.users.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthBody { status: "UP" })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(HealthBody { status: "DOWN" }))
        }
    }
}

pub fn common_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
