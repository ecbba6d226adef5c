//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use murmur_api::{AppState, build_app, build_state};
use murmur_core::clock::ManualClock;
use murmur_core::config::AppConfig;
use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_core::traits::NoticeSender;

/// Captures outbound notices instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl RecordingSender {
    /// The six-digit code from the latest notice sent to `identifier`.
    pub fn last_code_for(&self, identifier: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .rev()
            .find(|(to, _)| to == identifier)
            .and_then(|(_, message)| {
                message
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|chunk| chunk.len() == 6)
                    .map(str::to_string)
            })
    }

    /// Number of notices sent so far.
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Make every following send fail.
    pub fn fail_next(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl NoticeSender for RecordingSender {
    async fn send(&self, identifier: &str, message: &str) -> AppResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::external_service("provider down"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((identifier.to_string(), message.to_string()));
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state behind the router
    pub state: AppState,
    /// Clock driving OTP expiry and rate-limit windows
    pub clock: Arc<ManualClock>,
    /// Captured OTP notices
    pub notices: Arc<RecordingSender>,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a new test application from `config`
    pub fn with_config(config: AppConfig) -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let notices = Arc::new(RecordingSender::default());
        let state = build_state(config, notices.clone(), clock.clone());
        Self {
            router: build_app(state.clone()),
            state,
            clock,
            notices,
        }
    }

    /// Register an account and return its bearer token
    pub async fn register(&self, email: &str, password: &str, name: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(serde_json::json!({
                    "email": email,
                    "password": password,
                    "display_name": name,
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"]["token"]
            .as_str()
            .expect("token in response")
            .to_string()
    }

    /// Make a JSON request against the app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_from(method, path, body, token, "10.0.0.1").await
    }

    /// Make a JSON request appearing to come from `client_addr`
    pub async fn request_from(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        client_addr: &str,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", client_addr);

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Send a prepared request
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            retry_after,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
    /// `Retry-After` header, when present
    pub retry_after: Option<String>,
}
