mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{send, unreachable_app};
use serde_json::{json, Value};

fn assert_internal(method: &str, uri: &str, status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}: {}", method, uri, body);
    assert_eq!(body["error"]["message"], json!("Internal Server Error"), "{} {}", method, uri);
}

#[tokio::test]
async fn store_errors_are_500_never_404() -> Result<()> {
    let app = unreachable_app()?;
    let user = json!({"name": "Alice", "email": "a@x.com"});
    let calls = [
        ("GET", "/users", None),
        ("POST", "/users", Some(user.clone())),
        ("GET", "/users/u1", None),
        ("PUT", "/users/u1", Some(user)),
        ("PATCH", "/users/u1", Some(json!({"name": "Alicia"}))),
        ("DELETE", "/users/u1", None),
        ("GET", "/users/search?name=ali", None),
        ("POST", "/users/search", Some(json!({"status": "active"}))),
    ];
    for (method, uri, body) in calls {
        let res = send(&app, method, uri, body).await?;
        assert_ne!(res.status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_internal(method, uri, res.status, &res.body);
    }
    Ok(())
}

#[tokio::test]
async fn store_error_detail_is_not_leaked() -> Result<()> {
    let app = unreachable_app()?;
    let res = send(&app, "GET", "/users/u1", None).await?;
    assert_eq!(res.body["error"]["code"], json!("store_error"));
    assert!(!res.body.to_string().contains("connection refused"), "{}", res.body);
    Ok(())
}

#[tokio::test]
async fn health_is_down_when_store_unreachable() -> Result<()> {
    let app = unreachable_app()?;
    let res = send(&app, "GET", "/health", None).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, json!({"status": "DOWN"}));
    Ok(())
}
