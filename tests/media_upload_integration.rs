//! Media upload integration tests
//!
//! Verifies the presign-then-PUT upload flow against a `wiremock` backend:
//! part typing, the all-or-nothing policy, local guardrails, and silent
//! cancellation of an in-flight upload batch.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatwire::{MediaAttachment, PartKind, Role, SessionPhase};

mod common;
use common::{make_session, make_session_with_config, test_config};

/// Mount a presign mock that targets `PUT {server}/put/blob` and a PUT mock
/// accepting the upload.
async fn mount_upload_path(server: &MockServer, public_url: &str) {
    Mock::given(method("POST"))
        .and(path("/api/upload-url"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/put/blob", server.uri()),
            "public_url": public_url,
        })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/put/blob"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

/// Submitting one image with empty text yields a user message with a
/// single image part holding the durable URL, and no text part.
#[tokio::test]
async fn test_image_only_submission() {
    let server = MockServer::start().await;
    mount_upload_path(&server, "https://x/y.png").await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"{\"response\":\"nice photo\"}\n".to_vec(),
            "application/x-ndjson",
        ))
        .mount(&server)
        .await;

    let session = make_session(&server.uri());
    session.select_chat("c1");

    let file = MediaAttachment::new("y.png", "image/png", vec![0u8; 32]);
    session.submit("", vec![file]).await.expect("submit should succeed");

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].parts.len(), 1, "no text part for empty text");
    assert_eq!(messages[0].parts[0].kind, PartKind::Image);
    assert_eq!(messages[0].parts[0].text, "https://x/y.png");
    assert_eq!(messages[0].parts[0].mime_type.as_deref(), Some("image/png"));
    assert_eq!(messages[1].text(), "nice photo");
}

/// Media parts are ordered before the text part when both are present.
#[tokio::test]
async fn test_media_parts_precede_text_part() {
    let server = MockServer::start().await;
    mount_upload_path(&server, "https://x/y.png").await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"{\"response\":\"ok\"}\n".to_vec(),
            "application/x-ndjson",
        ))
        .mount(&server)
        .await;

    let session = make_session(&server.uri());
    session.select_chat("c1");

    let file = MediaAttachment::new("y.png", "image/png", vec![0u8; 32]);
    session.submit("look at this", vec![file]).await.unwrap();

    let user = &session.messages()[0];
    assert_eq!(user.parts.len(), 2);
    assert_eq!(user.parts[0].kind, PartKind::Image);
    assert_eq!(user.parts[1].kind, PartKind::Text);
    assert_eq!(user.parts[1].text, "look at this");
}

/// When one of three uploads fails, no part of the submission survives:
/// the user message is absent from the conversation after settling.
#[tokio::test]
async fn test_all_or_nothing_on_failed_upload() {
    let server = MockServer::start().await;

    // The presign for b.png fails; a.png and c.png would succeed.
    Mock::given(method("POST"))
        .and(path("/api/upload-url"))
        .and(body_string_contains("b.png"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "bucket unavailable" })),
        )
        .mount(&server)
        .await;
    mount_upload_path(&server, "https://x/ok.png").await;

    let session = make_session(&server.uri());
    session.select_chat("c1");

    let files = vec![
        MediaAttachment::new("a.png", "image/png", vec![0u8; 8]),
        MediaAttachment::new("b.png", "image/png", vec![0u8; 8]),
        MediaAttachment::new("c.png", "image/png", vec![0u8; 8]),
    ];
    let err = session.submit("with media", files).await.unwrap_err();
    assert!(err.to_string().contains("Upload error"), "got: {err}");

    assert!(
        session.messages().is_empty(),
        "no user message and no parts may survive a failed batch"
    );
    assert_eq!(session.phase(), SessionPhase::Idle);

    // The chat endpoint must never have been reached.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/chat"));
}

/// The attachment count guardrail rejects locally, before any network call.
#[tokio::test]
async fn test_attachment_count_guardrail() {
    let server = MockServer::start().await;
    let mut config = test_config(&server.uri());
    config.uploads.max_attachments = 2;
    let session = make_session_with_config(&config);
    session.select_chat("c1");

    let files = (0..3)
        .map(|i| MediaAttachment::new(format!("f{i}.png"), "image/png", vec![0u8; 4]))
        .collect();
    let err = session.submit("", files).await.unwrap_err();
    assert!(err.to_string().contains("too many attachments"), "got: {err}");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "guardrails must not hit the network");
}

/// The file size guardrail rejects locally, before any network call.
#[tokio::test]
async fn test_file_size_guardrail() {
    let server = MockServer::start().await;
    let mut config = test_config(&server.uri());
    config.uploads.max_file_bytes = 16;
    let session = make_session_with_config(&config);
    session.select_chat("c1");

    let file = MediaAttachment::new("big.png", "image/png", vec![0u8; 64]);
    let err = session.submit("", vec![file]).await.unwrap_err();
    assert!(err.to_string().contains("too large"), "got: {err}");

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "guardrails must not hit the network");
}

/// Cancelling while uploads are in flight aborts the submission silently.
#[tokio::test]
async fn test_cancel_during_upload_is_silent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-url"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "url": format!("{}/put/blob", server.uri()),
                    "public_url": "https://x/late.png",
                }))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let session = make_session(&server.uri());
    session.select_chat("c1");

    let worker = session.clone();
    let file = MediaAttachment::new("late.png", "image/png", vec![0u8; 8]);
    let handle = tokio::spawn(async move { worker.submit("", vec![file]).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    session.cancel();

    let outcome = handle.await.expect("task must not panic");
    assert!(outcome.is_ok(), "cancelled uploads must not surface an error");
    assert!(session.messages().is_empty());
    assert_eq!(session.phase(), SessionPhase::Idle);
}

/// A failed storage PUT fails the submission even when the presign worked.
#[tokio::test]
async fn test_failed_storage_put_aborts_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/put/blob", server.uri()),
            "public_url": "https://x/y.png",
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/put/blob"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let session = make_session(&server.uri());
    session.select_chat("c1");

    let file = MediaAttachment::new("y.png", "image/png", vec![0u8; 8]);
    let err = session.submit("", vec![file]).await.unwrap_err();
    assert!(err.to_string().contains("storage upload failed"), "got: {err}");
    assert!(session.messages().is_empty());
}
