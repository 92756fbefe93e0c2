//! Request/response logging with masked bodies.

use crate::config::{MaskRule, MiddlewareConfig};
use crate::middleware::mask::mask_json;
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct LogSettings {
    pub enabled: bool,
    pub skips: Vec<String>,
    pub request_body: bool,
    pub response_body: bool,
    pub masks: Vec<MaskRule>,
    pub max_logged_body_bytes: usize,
    pub max_body_bytes: usize,
    pub id_header: HeaderName,
}

impl LogSettings {
    pub fn new(config: &MiddlewareConfig, max_body_bytes: usize, id_header: HeaderName) -> Self {
        LogSettings {
            enabled: config.log,
            skips: config.skips.clone(),
            request_body: config.request_body,
            response_body: config.response_body,
            masks: config.masks.clone(),
            max_logged_body_bytes: config.max_logged_body_bytes,
            max_body_bytes,
            id_header,
        }
    }

    fn skips(&self, path: &str) -> bool {
        !self.enabled || self.skips.iter().any(|s| s == path)
    }
}

pub async fn log_requests(State(settings): State<Arc<LogSettings>>, req: Request, next: Next) -> Response {
    if settings.skips(req.uri().path()) {
        return next.run(req).await;
    }
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .headers()
        .get(&settings.id_header)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let start = Instant::now();

    let mut request_body = None;
    let req = if settings.request_body {
        let (parts, body) = req.into_parts();
        let bytes = match to_bytes(body, settings.max_body_bytes).await {
            Ok(b) => b,
            Err(_) => return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response(),
        };
        request_body = Some(render_body(&bytes, &settings));
        Request::from_parts(parts, Body::from(bytes))
    } else {
        req
    };

    let res = next.run(req).await;

    let mut response_body = None;
    let res = if settings.response_body {
        let (parts, body) = res.into_parts();
        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(error = %e, "failed to read response body for logging");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        response_body = Some(render_body(&bytes, &settings));
        Response::from_parts(parts, Body::from(bytes))
    } else {
        res
    };

    let status = res.status().as_u16();
    let size = res
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status,
        duration_ms = start.elapsed().as_millis() as u64,
        size,
        request = request_body.as_deref(),
        response = response_body.as_deref(),
        "request"
    );
    res
}

/// JSON bodies are masked; anything else is logged as lossy UTF-8. Truncated to the log limit.
fn render_body(bytes: &Bytes, settings: &LogSettings) -> String {
    let text = match serde_json::from_slice::<Value>(bytes) {
        Ok(mut v) => {
            mask_json(&mut v, &settings.masks);
            v.to_string()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    };
    truncate(&text, settings.max_logged_body_bytes).to_string()
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LogSettings {
        LogSettings::new(
            &MiddlewareConfig {
                masks: vec![MaskRule {
                    field: "email".into(),
                    keep_prefix: 1,
                    keep_suffix: 0,
                    mask_char: '*',
                }],
                max_logged_body_bytes: 20,
                ..Default::default()
            },
            1024,
            HeaderName::from_static("x-request-id"),
        )
    }

    #[test]
    fn health_is_skipped_by_default() {
        let s = settings();
        assert!(s.skips("/health"));
        assert!(!s.skips("/users"));
    }

    #[test]
    fn bodies_are_masked_and_truncated() {
        let s = settings();
        let body = Bytes::from_static(br#"{"email":"abc"}"#);
        assert_eq!(render_body(&body, &s), r#"{"email":"a**"}"#);
        let long = Bytes::from("é".repeat(30));
        assert!(render_body(&long, &s).len() <= 20);
    }
}
