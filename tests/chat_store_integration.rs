//! Chat store integration tests
//!
//! Exercises the chat record CRUD calls and the history load mapping
//! against a `wiremock` mock backend.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatwire::api::ApiClient;
use chatwire::auth::StaticCredentials;
use chatwire::{ChatStore, PartKind, Role};

fn make_store(base_url: &str) -> ChatStore {
    let api = ApiClient::new(
        base_url,
        Duration::from_secs(5),
        Arc::new(StaticCredentials::new("test-token")),
    )
    .expect("failed to create api client");
    ChatStore::new(api)
}

/// Listing returns the backend's records with camelCase wire names mapped.
#[tokio::test]
async fn test_list_chats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chats"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "chatId": "c1", "userId": "u1", "title": "First", "createdAt": 1700000000000i64 },
            { "chatId": "c2", "userId": "u1", "createdAt": 1700000100000i64 }
        ])))
        .mount(&server)
        .await;

    let store = make_store(&server.uri());
    let records = store.list().await.expect("list should succeed");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].chat_id, "c1");
    assert_eq!(records[0].title.as_deref(), Some("First"));
    assert!(records[1].title.is_none());
    assert!(records[0].created_at_utc().is_some());
}

/// Creating a chat posts the user id and returns the new chat id.
#[tokio::test]
async fn test_create_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chats/create"))
        .and(body_partial_json(json!({ "user_id": "u1", "title": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "chat_id": "c9" })))
        .mount(&server)
        .await;

    let store = make_store(&server.uri());
    let chat_id = store.create("u1", None).await.expect("create should succeed");
    assert_eq!(chat_id, "c9");
}

/// Renaming patches the record with the new title.
#[tokio::test]
async fn test_rename_chat() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/chats/c1"))
        .and(body_partial_json(json!({ "title": "Renamed" })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let store = make_store(&server.uri());
    store.rename("c1", "Renamed").await.expect("rename should succeed");
}

/// Deleting issues a DELETE and tolerates an empty 204 response.
#[tokio::test]
async fn test_delete_chat() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/chats/c1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let store = make_store(&server.uri());
    store.delete("c1").await.expect("delete should succeed");
}

/// History rows map to messages: text from `content` (escapes restored),
/// a typed media part from `media_url`/`media_type`.
#[tokio::test]
async fn test_load_messages_maps_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chats/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "role": "user", "content": "line one\\nline two", "messageId": "m1" },
            {
                "role": "user",
                "content": "",
                "media_url": "https://x/clip.mp4",
                "media_type": "video/mp4",
                "messageId": "m2"
            },
            { "role": "assistant", "content": "hello", "messageId": "m3" }
        ])))
        .mount(&server)
        .await;

    let store = make_store(&server.uri());
    let messages = store.load_messages("c1").await.expect("load should succeed");
    assert_eq!(messages.len(), 3);

    assert_eq!(messages[0].id, "m1");
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].text(), "line one\nline two");

    assert_eq!(messages[1].parts.len(), 1);
    assert_eq!(messages[1].parts[0].kind, PartKind::Video);
    assert_eq!(messages[1].parts[0].text, "https://x/clip.mp4");

    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].text(), "hello");
}

/// Non-success responses surface the backend's `detail` message.
#[tokio::test]
async fn test_api_error_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chats/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "chat not found" })))
        .mount(&server)
        .await;

    let store = make_store(&server.uri());
    let err = store.load_messages("missing").await.unwrap_err();
    assert!(err.to_string().contains("chat not found"), "got: {err}");
}

/// Non-success responses without a `detail` body fall back to the status
/// reason.
#[tokio::test]
async fn test_api_error_without_detail_uses_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = make_store(&server.uri());
    let err = store.list().await.unwrap_err();
    assert!(
        err.to_string().contains("Internal Server Error"),
        "got: {err}"
    );
}
