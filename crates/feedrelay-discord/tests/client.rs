//! Integration tests for `DiscordClient` using wiremock HTTP mocks.

use feedrelay_discord::{ChannelSink, DiscordClient, Embed, OutboundMessage, SinkError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> DiscordClient {
    DiscordClient::with_base_url("test-token", "feedrelay-test/0", 5, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn send_posts_message_and_parses_ref() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/111/messages"))
        .and(header("authorization", "Bot test-token"))
        .and(body_partial_json(
            serde_json::json!({ "content": "hello channel" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "555",
            "channel_id": "111"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let message_ref = client
        .send(111, &OutboundMessage::text("hello channel"))
        .await
        .expect("send should succeed");

    assert_eq!(message_ref.id, "555");
    assert_eq!(message_ref.channel_id, "111");
}

#[tokio::test]
async fn send_serializes_embeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/222/messages"))
        .and(body_partial_json(serde_json::json!({
            "embeds": [{ "title": "new upload", "url": "https://youtu.be/v1" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "556",
            "channel_id": "222"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let message = OutboundMessage::embed(Embed {
        title: Some("new upload".to_string()),
        url: Some("https://youtu.be/v1".to_string()),
        ..Embed::default()
    });
    client.send(222, &message).await.expect("send");
}

#[tokio::test]
async fn forbidden_maps_to_gone() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .send(111, &OutboundMessage::text("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::Gone { status: 403 }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn not_found_maps_to_gone() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .send(111, &OutboundMessage::text("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::Gone { status: 404 }));
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(serde_json::json!({ "retry_after": 1.5, "global": false })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .send(111, &OutboundMessage::text("x"))
        .await
        .unwrap_err();

    match err {
        SinkError::RateLimited { retry_after_ms } => {
            assert_eq!(retry_after_ms, Some(1500));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .send(111, &OutboundMessage::text("x"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SinkError::UnexpectedStatus { status: 500, .. }
    ));
    assert!(err.is_transient());
}
