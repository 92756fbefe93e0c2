//! User routes. `/users/search` takes precedence over `/users/:id`.

use crate::handlers::user::{all, create, delete, load, missing_id, patch, search_get, search_post, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(all).post(create))
        .route("/users/search", get(search_get).post(search_post))
        .route(
            "/users/",
            get(missing_id).put(missing_id).patch(missing_id).delete(missing_id),
        )
        .route("/users/:id", get(load).put(update).patch(patch).delete(delete))
}
