mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{app, send, send_raw};
use serde_json::json;

#[tokio::test]
async fn create_load_patch_delete_lifecycle() -> Result<()> {
    let app = app().await?;

    let created = send(&app, "POST", "/users", Some(json!({"name": "Alice", "email": "a@x.com"}))).await?;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let id = created.body["id"].as_str().unwrap_or_default().to_string();
    assert!(!id.is_empty());

    let loaded = send(&app, "GET", &format!("/users/{}", id), None).await?;
    assert_eq!(loaded.status, StatusCode::OK);
    assert_eq!(loaded.body, json!({"id": id, "name": "Alice", "email": "a@x.com"}));

    let patched = send(&app, "PATCH", &format!("/users/{}", id), Some(json!({"name": "Alicia"}))).await?;
    assert_eq!(patched.status, StatusCode::OK, "{}", patched.body);
    assert_eq!(patched.body, json!({"id": id, "name": "Alicia"}));

    let loaded = send(&app, "GET", &format!("/users/{}", id), None).await?;
    assert_eq!(loaded.body["name"], json!("Alicia"));
    assert_eq!(loaded.body["email"], json!("a@x.com"));

    let deleted = send(&app, "DELETE", &format!("/users/{}", id), None).await?;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!(1));

    let gone = send(&app, "GET", &format!("/users/{}", id), None).await?;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn duplicate_id_or_email_is_conflict() -> Result<()> {
    let app = app().await?;
    let user = json!({"id": "u1", "name": "Alice", "email": "a@x.com"});
    assert_eq!(send(&app, "POST", "/users", Some(user.clone())).await?.status, StatusCode::CREATED);
    assert_eq!(send(&app, "POST", "/users", Some(user)).await?.status, StatusCode::CONFLICT);

    let same_email = json!({"id": "u2", "name": "Other", "email": "a@x.com"});
    assert_eq!(send(&app, "POST", "/users", Some(same_email)).await?.status, StatusCode::CONFLICT);

    let all = send(&app, "GET", "/users", None).await?;
    assert_eq!(all.body.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn invalid_payload_returns_error_list() -> Result<()> {
    let app = app().await?;
    let res = send(&app, "POST", "/users", Some(json!({"email": "not-an-email", "status": "gone"}))).await?;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = res
        .body
        .as_array()
        .map(|errs| errs.iter().filter_map(|e| e["field"].as_str()).collect())
        .unwrap_or_default();
    assert!(fields.contains(&"name"), "{}", res.body);
    assert!(fields.contains(&"email"), "{}", res.body);
    assert!(fields.contains(&"status"), "{}", res.body);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let app = app().await?;
    let res = send_raw(&app, "POST", "/users", "{\"name\": ").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"]["code"], json!("bad_request"));

    let res = send_raw(&app, "POST", "/users", "[]").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_adopts_path_id_and_rejects_mismatch() -> Result<()> {
    let app = app().await?;
    send(&app, "POST", "/users", Some(json!({"id": "u1", "name": "Alice", "email": "a@x.com"}))).await?;

    let res = send(&app, "PUT", "/users/u1", Some(json!({"name": "Alice B", "email": "ab@x.com"}))).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["id"], json!("u1"));

    let res = send(&app, "PUT", "/users/u1", Some(json!({"id": "u2", "name": "Mallory", "email": "m@x.com"}))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let loaded = send(&app, "GET", "/users/u1", None).await?;
    assert_eq!(loaded.body["name"], json!("Alice B"));

    let res = send(&app, "PATCH", "/users/u1", Some(json!({"id": "u2", "name": "Mallory"}))).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_replaces_whole_document() -> Result<()> {
    let app = app().await?;
    send(
        &app,
        "POST",
        "/users",
        Some(json!({"id": "u1", "name": "Alice", "email": "a@x.com", "phone": "+1 555 0100"})),
    )
    .await?;
    send(&app, "PUT", "/users/u1", Some(json!({"name": "Alice", "email": "a@x.com"}))).await?;
    let loaded = send(&app, "GET", "/users/u1", None).await?;
    assert!(loaded.body.get("phone").is_none(), "{}", loaded.body);
    Ok(())
}

#[tokio::test]
async fn writes_to_missing_user_are_not_found() -> Result<()> {
    let app = app().await?;
    let put = send(&app, "PUT", "/users/nobody", Some(json!({"name": "N", "email": "n@x.com"}))).await?;
    assert_eq!(put.status, StatusCode::NOT_FOUND);
    let patch = send(&app, "PATCH", "/users/nobody", Some(json!({"name": "N"}))).await?;
    assert_eq!(patch.status, StatusCode::NOT_FOUND);
    let delete = send(&app, "DELETE", "/users/nobody", None).await?;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "GET", "/users", None).await?.body, json!([]));
    Ok(())
}

#[tokio::test]
async fn patch_that_takes_another_email_conflicts() -> Result<()> {
    let app = app().await?;
    send(&app, "POST", "/users", Some(json!({"id": "u1", "name": "A", "email": "a@x.com"}))).await?;
    send(&app, "POST", "/users", Some(json!({"id": "u2", "name": "B", "email": "b@x.com"}))).await?;
    let res = send(&app, "PATCH", "/users/u2", Some(json!({"email": "a@x.com"}))).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn patch_validates_only_supplied_fields() -> Result<()> {
    let app = app().await?;
    send(&app, "POST", "/users", Some(json!({"id": "u1", "name": "A", "email": "a@x.com"}))).await?;
    let ok = send(&app, "PATCH", "/users/u1", Some(json!({"status": "active"}))).await?;
    assert_eq!(ok.status, StatusCode::OK);
    let cleared = send(&app, "PATCH", "/users/u1", Some(json!({"name": null}))).await?;
    assert_eq!(cleared.status, StatusCode::UNPROCESSABLE_ENTITY);
    let bad = send(&app, "PATCH", "/users/u1", Some(json!({"dateOfBirth": "yesterday"}))).await?;
    assert_eq!(bad.status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn empty_path_id_is_bad_request() -> Result<()> {
    let app = app().await?;
    assert_eq!(send(&app, "GET", "/users/", None).await?.status, StatusCode::BAD_REQUEST);
    assert_eq!(send(&app, "DELETE", "/users/%20", None).await?.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn health_reports_up_with_request_id() -> Result<()> {
    let app = app().await?;
    let res = send(&app, "GET", "/health", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"status": "UP"}));
    let id = res.headers.get("x-request-id").and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert_eq!(id.len(), 16);
    Ok(())
}

#[tokio::test]
async fn configured_headers_are_added() -> Result<()> {
    let mut config = user_service::AppConfig::default();
    config
        .response
        .headers
        .insert("X-Content-Type-Options".into(), "nosniff".into());
    config.server.max_body_bytes = 64;
    let app = common::app_with(config).await?;

    let res = send(&app, "GET", "/users", None).await?;
    assert_eq!(res.headers.get("x-content-type-options").map(|v| v.as_bytes()), Some(&b"nosniff"[..]));

    let big = json!({"name": "x".repeat(200), "email": "a@x.com"});
    let res = send(&app, "POST", "/users", Some(big)).await?;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}
