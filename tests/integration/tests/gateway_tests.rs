//! Gateway client tests against a real WebSocket server
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use guilded_core::{Channel, ChannelKind};
use guilded_gateway::{ConnectError, EventArg, GatewayError, SupervisorState};
use integration_tests::{FakeGateway, STEP_TIMEOUT, TEST_COOKIE};
use serde_json::json;
use tokio_tungstenite::tungstenite::http::StatusCode;

const WAIT: Option<std::time::Duration> = Some(STEP_TIMEOUT);

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_handshake_then_ready() {
    let gateway = FakeGateway::start().await.expect("Failed to start gateway");
    let client = gateway.client(gateway.options());

    let ready = client.wait_for("ready", WAIT);
    client.connect().await.expect("Connect failed");
    let mut socket = gateway.accept().await.unwrap();

    assert!(ready.await.unwrap().is_none());
    assert!(client.is_ready());
    assert_eq!(client.state(), SupervisorState::Connected);
    assert_eq!(socket.cookie.as_deref(), Some(TEST_COOKIE));
    assert!(socket.path.starts_with("/socket.io/"));
    assert!(!socket.path.contains("teamId"));

    // The first frame after the upgrade is a heartbeat
    assert_eq!(socket.recv_text().await.unwrap(), "2");

    client.close().await;
    assert_eq!(socket.recv_text().await.unwrap(), r#"42["logout"]"#);
    assert_eq!(socket.recv_close().await.unwrap(), Some(1000));
    assert!(!client.is_ready());
}

#[tokio::test]
async fn test_rejected_upgrade_fails_connect() {
    let gateway = FakeGateway::rejecting(StatusCode::UNAUTHORIZED)
        .await
        .expect("Failed to start gateway");
    let client = gateway.client(gateway.options());

    let error = client.wait_for("error", WAIT);
    let err = client.connect().await.unwrap_err();

    assert!(matches!(err, ConnectError::Handshake { status: 401 }));
    let arg = error.await.unwrap().into_single().unwrap();
    assert!(matches!(
        arg.as_error(),
        Some(GatewayError::Connect(ConnectError::Handshake { status: 401 }))
    ));
    assert!(!client.is_ready());
}

#[tokio::test]
async fn test_team_sockets_carry_team_id() {
    let gateway = FakeGateway::start().await.expect("Failed to start gateway");
    let client = gateway.client(gateway.options().with_team_ids(vec!["t1".to_string()]));

    let team_connect = client.wait_for("team_connect", WAIT);
    client.connect().await.expect("Connect failed");

    let first = gateway.accept().await.unwrap();
    let second = gateway.accept().await.unwrap();
    let mut paths = vec![first.path.clone(), second.path.clone()];
    paths.sort_by_key(|path| path.contains("teamId"));
    assert!(!paths[0].contains("teamId"));
    assert!(paths[1].ends_with("&teamId=t1"));

    let arg = team_connect.await.unwrap().into_single().unwrap();
    assert_eq!(arg.as_str(), Some("t1"));

    client.close().await;
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_message_event_is_cached_and_published() {
    let gateway = FakeGateway::start().await.expect("Failed to start gateway");
    let client = gateway.client(gateway.options());
    client
        .cache()
        .insert_channel(Channel::new("c1", ChannelKind::Chat, Some("t1".to_string())));

    client.connect().await.expect("Connect failed");
    let mut socket = gateway.accept().await.unwrap();

    let message = client.wait_for("message", WAIT);
    socket
        .send_event(
            "ChatMessageCreated",
            json!({
                "type": "ChatMessageCreated",
                "channelId": "c1",
                "teamId": "t1",
                "createdBy": "u1",
                "message": {
                    "id": "m1",
                    "content": {"document": {"nodes": []}},
                    "createdAt": "2021-05-01T12:30:00.000Z"
                }
            }),
        )
        .await
        .unwrap();

    let arg = message.await.unwrap().into_single().unwrap();
    let published = arg.as_message().expect("message argument");
    assert_eq!(published.id, "m1");
    assert_eq!(published.author_id.as_deref(), Some("u1"));
    assert_eq!(client.get_message("m1").map(|m| m.channel_id), Some("c1".to_string()));

    let typing = client.wait_for("typing", WAIT);
    socket
        .send_event(
            "ChatChannelTyping",
            json!({"channelId": "c1", "userId": "u2"}),
        )
        .await
        .unwrap();
    let args = typing.await.unwrap().into_vec();
    assert_eq!(args.len(), 3);
    assert_eq!(args[0].as_str(), Some("c1"));
    assert_eq!(args[1].as_str(), Some("u2"));

    client.close().await;
}

#[tokio::test]
async fn test_unknown_event_is_ignored() {
    let gateway = FakeGateway::start().await.expect("Failed to start gateway");
    let client = gateway.client(gateway.options());
    client.connect().await.expect("Connect failed");
    let mut socket = gateway.accept().await.unwrap();

    let response = client.wait_for_match(
        "socket_response",
        |args| {
            let kind = args.first().and_then(EventArg::as_raw).and_then(|raw| raw.get("type"));
            Ok(kind.and_then(|kind| kind.as_str()) == Some("SomethingNew"))
        },
        WAIT,
    );
    socket
        .send_event("SomethingNew", json!({"foo": "bar"}))
        .await
        .unwrap();

    assert!(response.await.is_ok());
    assert!(client.is_ready());
    assert!(client.cached_messages().is_empty());

    client.close().await;
}

// ============================================================================
// Reconnect
// ============================================================================

#[tokio::test]
async fn test_server_close_triggers_reconnect() {
    let gateway = FakeGateway::start().await.expect("Failed to start gateway");
    let client = gateway.client(gateway.options());
    client.connect().await.expect("Connect failed");
    let mut first = gateway.accept().await.unwrap();

    let disconnect = client.wait_for("disconnect", WAIT);
    let reconnect = client.wait_for("connect", WAIT);
    first.close(4000).await.unwrap();

    let arg = disconnect.await.unwrap().into_single().unwrap();
    assert!(matches!(arg, EventArg::CloseCode(Some(4000))));

    let mut second = gateway.accept().await.unwrap();
    reconnect.await.unwrap();
    assert_eq!(second.recv_text().await.unwrap(), "2");
    assert_eq!(client.state(), SupervisorState::Connected);
    assert!(client.is_ready());

    client.close().await;
    assert_eq!(second.recv_text().await.unwrap(), r#"42["logout"]"#);
    assert_eq!(client.state(), SupervisorState::Disconnected);
}
