//! Integration tests for real-time delivery over the engine behind `/ws`.

mod helpers;

use std::time::Duration;

use http::StatusCode;
use serde_json::{Value, json};
use tokio::sync::mpsc::Receiver;

use murmur_realtime::connection::manager::ConnectionGuard;

struct Client {
    guard: ConnectionGuard,
    rx: Receiver<String>,
    user_id: String,
}

impl Client {
    async fn connect(app: &helpers::TestApp, token: &str) -> Self {
        let state = app
            .state
            .realtime
            .authenticator
            .authenticate(Some(&format!("Bearer {token}")));
        let (guard, mut rx) = app.state.realtime.connections.register(state).await;

        let connected = next_of_type(&mut rx, "connected").await;
        assert_eq!(connected["authenticated"], true);
        let user_id = connected["user_id"].as_str().unwrap().to_string();

        Self { guard, rx, user_id }
    }

    async fn send(&self, app: &helpers::TestApp, frame: Value) {
        app.state
            .realtime
            .connections
            .handle_inbound(self.guard.handle(), &frame.to_string())
            .await;
    }

    async fn expect(&mut self, frame_type: &str) -> Value {
        next_of_type(&mut self.rx, frame_type).await
    }
}

/// Next frame of `frame_type`, skipping unrelated frames.
async fn next_of_type(rx: &mut Receiver<String>, frame_type: &str) -> Value {
    loop {
        let raw = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {frame_type}"))
            .expect("connection closed");
        let frame: Value = serde_json::from_str(&raw).unwrap();
        if frame["type"] == frame_type {
            return frame;
        }
    }
}

#[tokio::test]
async fn test_private_message_delivers_and_notifies() {
    let app = helpers::TestApp::new();
    let alice_token = app.register("alice@example.com", "password123", "Alice").await;
    let bob_token = app.register("bob@example.com", "password123", "Bob").await;

    let mut alice = Client::connect(&app, &alice_token).await;
    let mut bob = Client::connect(&app, &bob_token).await;

    alice
        .send(
            &app,
            json!({ "type": "private_message", "receiver_id": bob.user_id, "content": "hello bob" }),
        )
        .await;

    let received = bob.expect("message").await;
    assert_eq!(received["message"]["content"], "hello bob");
    assert_eq!(received["sender_name"], "Alice");

    let echo = alice.expect("message").await;
    assert_eq!(echo["message"]["id"], received["message"]["id"]);

    let notification = bob.expect("notification").await;
    assert_eq!(notification["notification"]["title"], "New message from Alice");

    let listed = app
        .request("GET", "/api/notifications", None, Some(&bob_token))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed.body["data"][0]["body"], "hello bob");
}

#[tokio::test]
async fn test_muted_chat_suppresses_notification_only() {
    let app = helpers::TestApp::new();
    let alice_token = app.register("alice@example.com", "password123", "Alice").await;
    let bob_token = app.register("bob@example.com", "password123", "Bob").await;

    let alice = Client::connect(&app, &alice_token).await;
    let mut bob = Client::connect(&app, &bob_token).await;

    let muted = app
        .request(
            "PUT",
            "/api/notifications/settings",
            Some(json!({ "muted_chat_ids": [alice.user_id] })),
            Some(&bob_token),
        )
        .await;
    assert_eq!(muted.status, StatusCode::OK);

    alice
        .send(
            &app,
            json!({ "type": "private_message", "receiver_id": bob.user_id, "content": "psst" }),
        )
        .await;
    assert_eq!(bob.expect("message").await["message"]["content"], "psst");

    let listed = app
        .request("GET", "/api/notifications", None, Some(&bob_token))
        .await;
    assert!(listed.body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_presence_follows_connections() {
    let app = helpers::TestApp::new();
    let alice_token = app.register("alice@example.com", "password123", "Alice").await;
    let bob_token = app.register("bob@example.com", "password123", "Bob").await;

    let phone = Client::connect(&app, &bob_token).await;
    let laptop = Client::connect(&app, &bob_token).await;
    let path = format!("/api/presence/{}", phone.user_id);

    let online = app.request("GET", &path, None, Some(&alice_token)).await;
    assert_eq!(online.status, StatusCode::OK);
    assert_eq!(online.body["data"]["online"], true);
    assert_eq!(online.body["data"]["active_connections"], 2);

    drop(phone);
    let still_online = app.request("GET", &path, None, Some(&alice_token)).await;
    assert_eq!(still_online.body["data"]["online"], true);
    assert_eq!(still_online.body["data"]["active_connections"], 1);

    drop(laptop);
    let offline = app.request("GET", &path, None, Some(&alice_token)).await;
    assert_eq!(offline.body["data"]["online"], false);
    assert!(offline.body["data"]["last_seen_at"].is_string());
}

#[tokio::test]
async fn test_room_membership_and_broadcast() {
    let app = helpers::TestApp::new();
    let alice_token = app.register("alice@example.com", "password123", "Alice").await;
    let bob_token = app.register("bob@example.com", "password123", "Bob").await;

    let mut alice = Client::connect(&app, &alice_token).await;
    let mut bob = Client::connect(&app, &bob_token).await;

    alice.send(&app, json!({ "type": "join_room", "room_id": "lobby" })).await;
    bob.send(&app, json!({ "type": "join_room", "room_id": "lobby" })).await;

    let members = app
        .request("GET", "/api/rooms/lobby/members", None, Some(&alice_token))
        .await;
    assert_eq!(members.body["data"]["members"].as_array().unwrap().len(), 2);

    bob.send(
        &app,
        json!({ "type": "room_message", "room_id": "lobby", "content": "hi all" }),
    )
    .await;
    assert_eq!(alice.expect("message").await["message"]["content"], "hi all");
    assert_eq!(bob.expect("message").await["message"]["room_id"], "lobby");

    drop(bob);
    let members = app
        .request("GET", "/api/rooms/lobby/members", None, Some(&alice_token))
        .await;
    assert_eq!(members.body["data"]["members"], json!([alice.user_id]));
}

#[tokio::test]
async fn test_non_member_cannot_post_to_room() {
    let app = helpers::TestApp::new();
    let token = app.register("alice@example.com", "password123", "Alice").await;
    let mut alice = Client::connect(&app, &token).await;

    alice
        .send(
            &app,
            json!({ "type": "room_message", "room_id": "private", "content": "let me in" }),
        )
        .await;
    assert_eq!(alice.expect("error").await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_topic_subscription_and_publish() {
    let app = helpers::TestApp::new();
    let alice_token = app.register("alice@example.com", "password123", "Alice").await;
    let bob_token = app.register("bob@example.com", "password123", "Bob").await;

    let mut alice = Client::connect(&app, &alice_token).await;
    let mut bob = Client::connect(&app, &bob_token).await;

    bob.send(&app, json!({ "type": "subscribe", "topic": "group:rustaceans" })).await;
    assert_eq!(bob.expect("subscribed").await["topic"], "group:rustaceans");

    alice
        .send(
            &app,
            json!({ "type": "publish", "topic": "group:rustaceans", "content": "ferris says hi" }),
        )
        .await;
    assert_eq!(bob.expect("message").await["message"]["content"], "ferris says hi");

    alice
        .send(
            &app,
            json!({ "type": "publish", "topic": "presence", "content": "nope" }),
        )
        .await;
    assert_eq!(alice.expect("error").await["code"], "VALIDATION");
}

#[tokio::test]
async fn test_read_receipt_reaches_author() {
    let app = helpers::TestApp::new();
    let alice_token = app.register("alice@example.com", "password123", "Alice").await;
    let bob_token = app.register("bob@example.com", "password123", "Bob").await;
    let mallory_token = app
        .register("mallory@example.com", "password123", "Mallory")
        .await;

    let mut alice = Client::connect(&app, &alice_token).await;
    let mut bob = Client::connect(&app, &bob_token).await;
    let mut mallory = Client::connect(&app, &mallory_token).await;

    alice
        .send(
            &app,
            json!({ "type": "private_message", "receiver_id": bob.user_id, "content": "read me" }),
        )
        .await;
    let message_id = bob.expect("message").await["message"]["id"].clone();

    mallory
        .send(
            &app,
            json!({
                "type": "message_status",
                "message_id": message_id,
                "sender_id": mallory.user_id,
                "status": "read",
            }),
        )
        .await;
    assert_eq!(mallory.expect("error").await["code"], "FORBIDDEN");

    // A wrong sender_id from the client does not redirect the receipt.
    bob.send(
        &app,
        json!({
            "type": "message_status",
            "message_id": message_id,
            "sender_id": mallory.user_id,
            "status": "read",
        }),
    )
    .await;

    let receipt = alice.expect("message_status").await;
    assert_eq!(receipt["message_id"], message_id);
    assert_eq!(receipt["reader_id"], bob.user_id);
    assert_eq!(receipt["status"], "read");
}

#[tokio::test]
async fn test_invalid_token_falls_back_to_anonymous() {
    let app = helpers::TestApp::new();
    let state = app
        .state
        .realtime
        .authenticator
        .authenticate(Some("Bearer forged"));
    assert!(state.principal().is_none());

    let (guard, mut rx) = app.state.realtime.connections.register(state).await;
    assert_eq!(next_of_type(&mut rx, "connected").await["authenticated"], false);

    app.state
        .realtime
        .connections
        .handle_inbound(guard.handle(), r#"{"type":"join_room","room_id":"lobby"}"#)
        .await;
    assert_eq!(next_of_type(&mut rx, "error").await["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_private_history_and_conversations() {
    let app = helpers::TestApp::new();
    let alice_token = app.register("alice@example.com", "password123", "Alice").await;
    let bob_token = app.register("bob@example.com", "password123", "Bob").await;
    let carol_token = app.register("carol@example.com", "password123", "Carol").await;

    let mut alice = Client::connect(&app, &alice_token).await;
    let bob = Client::connect(&app, &bob_token).await;

    for content in ["a1", "a2", "a3"] {
        alice
            .send(
                &app,
                json!({ "type": "private_message", "receiver_id": bob.user_id, "content": content }),
            )
            .await;
        app.clock.advance(chrono::Duration::seconds(1));
    }
    bob.send(
        &app,
        json!({ "type": "private_message", "receiver_id": alice.user_id, "content": "b1" }),
    )
    .await;

    let contents = |body: &Value| -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap().to_string())
            .collect()
    };
    let newest = app
        .request(
            "GET",
            &format!("/api/private/{}/messages?per_page=2", alice.user_id),
            None,
            Some(&bob_token),
        )
        .await;
    assert_eq!(newest.status, StatusCode::OK);
    assert_eq!(contents(&newest.body), ["a3", "b1"]);
    let older = app
        .request(
            "GET",
            &format!("/api/private/{}/messages?page=2&per_page=2", alice.user_id),
            None,
            Some(&bob_token),
        )
        .await;
    assert_eq!(contents(&older.body), ["a1", "a2"]);

    let unrelated = app
        .request(
            "GET",
            &format!("/api/private/{}/messages", bob.user_id),
            None,
            Some(&carol_token),
        )
        .await;
    assert!(unrelated.body["data"].as_array().unwrap().is_empty());

    let conversations = app
        .request("GET", "/api/private/conversations", None, Some(&bob_token))
        .await;
    assert_eq!(conversations.status, StatusCode::OK);
    let list = conversations.body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["peer_id"], alice.user_id.as_str());
    assert_eq!(list[0]["peer_name"], "Alice");
    assert_eq!(list[0]["peer_online"], true);
    assert_eq!(list[0]["unread_count"], 3);
    assert_eq!(list[0]["last_message"]["content"], "b1");

    let marked = app
        .request(
            "PUT",
            &format!("/api/private/mark-read/{}", alice.user_id),
            None,
            Some(&bob_token),
        )
        .await;
    assert_eq!(marked.body["data"]["count"], 3);
    assert_eq!(alice.expect("message_status").await["status"], "read");

    let conversations = app
        .request("GET", "/api/private/conversations", None, Some(&bob_token))
        .await;
    assert_eq!(conversations.body["data"][0]["unread_count"], 0);

    let anonymous = app
        .request("GET", "/api/private/conversations", None, None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_notification_read_state() {
    let app = helpers::TestApp::new();
    let alice_token = app.register("alice@example.com", "password123", "Alice").await;
    let bob_token = app.register("bob@example.com", "password123", "Bob").await;

    let alice = Client::connect(&app, &alice_token).await;
    let bob_id = {
        let me = app.request("GET", "/api/auth/me", None, Some(&bob_token)).await;
        me.body["data"]["user_id"].as_str().unwrap().to_string()
    };
    for content in ["one", "two"] {
        alice
            .send(
                &app,
                json!({ "type": "private_message", "receiver_id": bob_id, "content": content }),
            )
            .await;
    }

    let unread = app
        .request("GET", "/api/notifications/unread-count", None, Some(&bob_token))
        .await;
    assert_eq!(unread.status, StatusCode::OK);
    assert_eq!(unread.body["data"]["count"], 2);

    let listed = app
        .request("GET", "/api/notifications", None, Some(&bob_token))
        .await;
    let first_id = listed.body["data"][0]["id"].as_str().unwrap().to_string();

    let foreign = app
        .request(
            "PUT",
            &format!("/api/notifications/{first_id}/read"),
            None,
            Some(&alice_token),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let marked = app
        .request(
            "PUT",
            &format!("/api/notifications/{first_id}/read"),
            None,
            Some(&bob_token),
        )
        .await;
    assert_eq!(marked.status, StatusCode::OK);
    assert_eq!(marked.body["data"]["read"], true);

    let unread = app
        .request("GET", "/api/notifications/unread-count", None, Some(&bob_token))
        .await;
    assert_eq!(unread.body["data"]["count"], 1);

    let all = app
        .request("PUT", "/api/notifications/mark-all-read", None, Some(&bob_token))
        .await;
    assert_eq!(all.body["data"]["count"], 1);

    let unread = app
        .request("GET", "/api/notifications/unread-count", None, Some(&bob_token))
        .await;
    assert_eq!(unread.body["data"]["count"], 0);
}
