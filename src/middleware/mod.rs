//! Tower/axum middleware stack wrapped around the router.

mod logging;
mod mask;
mod request_id;

pub use logging::{log_requests, LogSettings};
pub use mask::{mask, mask_json};
pub use request_id::{MakeShortRequestId, REQUEST_ID_LEN};

use crate::config::AppConfig;
use crate::error::{AppError, ConfigError};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

/// Outermost first: request id, propagation, static headers, logging, panic recovery,
/// timeout (408), body limit (413).
pub fn apply(router: Router, config: &AppConfig) -> Result<Router, ConfigError> {
    let id_header = header_name(&config.response.id_header)?;
    let settings = Arc::new(LogSettings::new(
        &config.middleware,
        config.server.max_body_bytes,
        id_header.clone(),
    ));

    let mut router = router
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn_with_state(settings, log_requests));
    for (name, value) in &config.response.headers {
        let value = HeaderValue::from_str(value)
            .map_err(|e| ConfigError::Invalid(format!("response header {}: {}", name, e)))?;
        router = router.layer(SetResponseHeaderLayer::if_not_present(header_name(name)?, value));
    }
    Ok(router
        .layer(PropagateRequestIdLayer::new(id_header.clone()))
        .layer(SetRequestIdLayer::new(id_header, MakeShortRequestId)))
}

fn header_name(name: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::try_from(name).map_err(|e| ConfigError::Invalid(format!("header name {}: {}", name, e)))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
