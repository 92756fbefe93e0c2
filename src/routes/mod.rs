//! Router assembly: routes, state and the middleware stack.

mod common;
mod users;

pub use common::common_routes;
pub use users::user_routes;

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::state::AppState;
use axum::Router;

pub fn app(state: AppState, config: &AppConfig) -> Result<Router, ConfigError> {
    let router = Router::new()
        .merge(common_routes())
        .merge(user_routes())
        .with_state(state);
    crate::middleware::apply(router, config)
}
