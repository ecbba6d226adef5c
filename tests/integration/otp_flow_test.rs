//! Integration tests for the one-time passcode sign-in flow.

mod helpers;

use chrono::Duration;
use http::StatusCode;
use serde_json::json;

async fn send(app: &helpers::TestApp, identifier: &str) -> helpers::TestResponse {
    app.request(
        "POST",
        "/api/auth/otp/send",
        Some(json!({ "identifier": identifier })),
        None,
    )
    .await
}

async fn verify(app: &helpers::TestApp, identifier: &str, code: &str) -> helpers::TestResponse {
    app.request(
        "POST",
        "/api/auth/otp/verify",
        Some(json!({ "identifier": identifier, "code": code })),
        None,
    )
    .await
}

fn wrong_code(code: &str) -> String {
    if code == "000000" { "111111" } else { "000000" }.to_string()
}

#[tokio::test]
async fn test_otp_sign_in_creates_account() {
    let app = helpers::TestApp::new();

    let sent = send(&app, "  Carol@Example.com ").await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body["data"]["identifier"], "carol@example.com");
    assert_eq!(sent.body["data"]["expires_in"], 120);

    let code = app.notices.last_code_for("carol@example.com").unwrap();
    let verified = verify(&app, "carol@example.com", &code).await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["data"]["user"]["verified"], true);

    let token = verified.body["data"]["token"].as_str().unwrap();
    let me = app.request("GET", "/api/auth/me", None, Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["user_id"], verified.body["data"]["user"]["id"]);
}

#[tokio::test]
async fn test_otp_sign_in_reuses_existing_account() {
    let app = helpers::TestApp::new();

    send(&app, "dave@example.com").await;
    let code = app.notices.last_code_for("dave@example.com").unwrap();
    let first = verify(&app, "dave@example.com", &code).await;

    send(&app, "dave@example.com").await;
    let code = app.notices.last_code_for("dave@example.com").unwrap();
    let second = verify(&app, "dave@example.com", &code).await;

    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body["data"]["user"]["id"], second.body["data"]["user"]["id"]);
}

#[tokio::test]
async fn test_code_is_single_use() {
    let app = helpers::TestApp::new();
    send(&app, "erin@example.com").await;
    let code = app.notices.last_code_for("erin@example.com").unwrap();

    assert_eq!(verify(&app, "erin@example.com", &code).await.status, StatusCode::OK);
    assert_eq!(verify(&app, "erin@example.com", &code).await.status, StatusCode::GONE);
}

#[tokio::test]
async fn test_wrong_code_exhausts_challenge() {
    let app = helpers::TestApp::new();
    send(&app, "frank@example.com").await;
    let code = app.notices.last_code_for("frank@example.com").unwrap();
    let wrong = wrong_code(&code);

    let first = verify(&app, "frank@example.com", &wrong).await;
    assert_eq!(first.status, StatusCode::UNAUTHORIZED);
    let second = verify(&app, "frank@example.com", &wrong).await;
    assert_eq!(second.status, StatusCode::UNAUTHORIZED);

    let third = verify(&app, "frank@example.com", &wrong).await;
    assert_eq!(third.status, StatusCode::GONE);
    assert_eq!(third.body["error"], "CHALLENGE_EXPIRED_OR_EXHAUSTED");

    // The real code no longer works either.
    assert_eq!(verify(&app, "frank@example.com", &code).await.status, StatusCode::GONE);
}

#[tokio::test]
async fn test_code_expires() {
    let app = helpers::TestApp::new();
    send(&app, "gina@example.com").await;
    let code = app.notices.last_code_for("gina@example.com").unwrap();

    app.clock.advance(Duration::seconds(121));

    let response = verify(&app, "gina@example.com", &code).await;
    assert_eq!(response.status, StatusCode::GONE);
}

#[tokio::test]
async fn test_identifier_rate_limit() {
    let app = helpers::TestApp::new();
    for _ in 0..3 {
        assert_eq!(send(&app, "hank@example.com").await.status, StatusCode::OK);
    }

    let limited = send(&app, "hank@example.com").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "RATE_LIMITED");
    let retry: u64 = limited.retry_after.as_deref().unwrap().parse().unwrap();
    assert!(retry > 0);
    assert_eq!(app.notices.count(), 3);

    app.clock.advance(Duration::hours(1));
    assert_eq!(send(&app, "hank@example.com").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_address_rate_limit_spans_identifiers() {
    let app = helpers::TestApp::new();
    for i in 0..5 {
        let response = app
            .request_from(
                "POST",
                "/api/auth/otp/send",
                Some(json!({ "identifier": format!("user{i}@example.com") })),
                None,
                "192.0.2.7",
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let limited = app
        .request_from(
            "POST",
            "/api/auth/otp/send",
            Some(json!({ "identifier": "user9@example.com" })),
            None,
            "192.0.2.7",
        )
        .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

    let elsewhere = app
        .request_from(
            "POST",
            "/api/auth/otp/send",
            Some(json!({ "identifier": "user9@example.com" })),
            None,
            "192.0.2.8",
        )
        .await;
    assert_eq!(elsewhere.status, StatusCode::OK);
}

#[tokio::test]
async fn test_phone_identifier_is_normalized() {
    let app = helpers::TestApp::new();
    let sent = send(&app, "98765 43210").await;
    assert_eq!(sent.status, StatusCode::OK);
    assert_eq!(sent.body["data"]["identifier"], "+919876543210");

    let code = app.notices.last_code_for("+919876543210").unwrap();
    let verified = verify(&app, "+91 98765-43210", &code).await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["data"]["user"]["phone_number"], "+919876543210");
}

#[tokio::test]
async fn test_delivery_failure_is_bad_gateway() {
    let app = helpers::TestApp::new();
    app.notices.fail_next();

    let response = send(&app, "ivy@example.com").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "EXTERNAL_SERVICE");
}
