//! Integration tests for password accounts, notification settings, files, and health.

mod helpers;

use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_register_and_login() {
    let app = helpers::TestApp::new();
    let token = app.register("Alice@Example.com", "password123", "Alice").await;

    let me = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["display_name"], "Alice");

    let login = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "alice@example.com", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["data"]["user"]["email"], "alice@example.com");
    assert!(login.body["data"]["token"].is_string());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = helpers::TestApp::new();
    app.register("bob@example.com", "password123", "Bob").await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "email": "BOB@example.com",
                "password": "password456",
                "display_name": "Other Bob",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_register_validation() {
    let app = helpers::TestApp::new();
    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "email": "not-an-email",
                "password": "short",
                "display_name": "",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_login_rejections_are_indistinguishable() {
    let app = helpers::TestApp::new();
    app.register("carol@example.com", "password123", "Carol").await;

    let wrong_password = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "carol@example.com", "password": "wrongpassword" })),
            None,
        )
        .await;
    let unknown_user = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "password123" })),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body["message"], unknown_user.body["message"]);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = helpers::TestApp::new();

    let missing = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = app
        .request("GET", "/api/notifications", None, Some("not.a.jwt"))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notification_settings_defaults_and_update() {
    let app = helpers::TestApp::new();
    let token = app.register("dana@example.com", "password123", "Dana").await;

    let defaults = app
        .request("GET", "/api/notifications/settings", None, Some(&token))
        .await;
    assert_eq!(defaults.status, StatusCode::OK);
    assert_eq!(defaults.body["data"]["message_enabled"], true);
    assert_eq!(defaults.body["data"]["dnd_enabled"], false);

    let updated = app
        .request(
            "PUT",
            "/api/notifications/settings",
            Some(json!({
                "dnd_enabled": true,
                "dnd_start": "22:00",
                "dnd_end": "07:30",
                "file_enabled": false,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["dnd_enabled"], true);
    assert_eq!(updated.body["data"]["dnd_start"], "22:00");
    assert_eq!(updated.body["data"]["dnd_end"], "07:30");
    assert_eq!(updated.body["data"]["file_enabled"], false);
    assert_eq!(updated.body["data"]["message_enabled"], true);

    let reread = app
        .request("GET", "/api/notifications/settings", None, Some(&token))
        .await;
    assert_eq!(reread.body["data"]["dnd_end"], "07:30");
}

#[tokio::test]
async fn test_notification_settings_rejects_bad_input() {
    let app = helpers::TestApp::new();
    let token = app.register("eve@example.com", "password123", "Eve").await;

    let bad_time = app
        .request(
            "PUT",
            "/api/notifications/settings",
            Some(json!({ "dnd_start": "25:99" })),
            Some(&token),
        )
        .await;
    assert_eq!(bad_time.status, StatusCode::BAD_REQUEST);

    let bad_offset = app
        .request(
            "PUT",
            "/api/notifications/settings",
            Some(json!({ "dnd_utc_offset_minutes": 2000 })),
            Some(&token),
        )
        .await;
    assert_eq!(bad_offset.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_file_upload_and_delete() {
    let app = helpers::TestApp::new();
    let token = app.register("fay@example.com", "password123", "Fay").await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/files")
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "image/png")
        .header("X-File-Name", "cat.png")
        .body(Body::from(vec![0x89, b'P', b'N', b'G']))
        .unwrap();
    let uploaded = app.send(req).await;
    assert_eq!(uploaded.status, StatusCode::CREATED);

    let public_id = uploaded.body["data"]["public_id"].as_str().unwrap().to_string();
    let url = uploaded.body["data"]["url"].as_str().unwrap();
    assert!(url.contains(&public_id));

    let path = format!("/api/files/{public_id}");
    let deleted = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let again = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let app = helpers::TestApp::new();
    let token = app.register("gus@example.com", "password123", "Gus").await;

    let response = app.request("POST", "/api/files", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new();
    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["connections"], 0);
    assert!(response.body["data"]["metrics"].is_object());
}
