//! WebSocket transport tests
//!
//! The router is served on a local port and driven with a tungstenite
//! client, so every frame passes through the upgrade handler and the
//! socket's reader and writer tasks.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use chatline::backend::realtime::Gateway;
use common::{spawn_app, TestUser};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn open(addr: SocketAddr, user: &TestUser) -> Client {
    let url = format!("ws://{}/ws?token={}", addr, user.token);
    let (mut socket, _) = connect_async(url).await.expect("websocket handshake");

    let welcome = next_event(&mut socket).await;
    assert_eq!(welcome["event"], "connected");
    assert_eq!(welcome["data"]["userId"], user.id.to_string());
    socket
}

/// Next JSON frame from the server, whatever its event
async fn next_frame(socket: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(WAIT, socket.next())
            .await
            .expect("frame before timeout")
            .expect("socket still open")
            .expect("valid frame");
        match frame {
            WsMessage::Text(text) => return serde_json::from_str(text.as_str()).expect("JSON event"),
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
            other => panic!("Unexpected frame: {:?}", other),
        }
    }
}

/// Next event other than the periodic `ping`
async fn next_event(socket: &mut Client) -> Value {
    loop {
        let event = next_frame(socket).await;
        if event["event"] != "ping" {
            return event;
        }
    }
}

async fn send_json(socket: &mut Client, event: Value) {
    socket
        .send(WsMessage::Text(event.to_string().into()))
        .await
        .expect("send frame");
}

fn chat_message(chat_id: Uuid, text: &str) -> Value {
    json!({
        "event": "send-individual-message",
        "data": { "chatId": chat_id, "message": text }
    })
}

/// Wait until the gateway no longer lists the user
async fn wait_offline(gateway: &Gateway, user_id: Uuid) {
    tokio::time::timeout(WAIT, async {
        while gateway.is_online(user_id) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("user went offline");
}

/// The socket ends with a Close frame or EOF
async fn expect_closed(socket: &mut Client) {
    loop {
        let frame = tokio::time::timeout(WAIT, socket.next())
            .await
            .expect("close before timeout");
        match frame {
            None | Some(Ok(WsMessage::Close(_))) | Some(Err(_)) => return,
            Some(Ok(WsMessage::Text(text))) => {
                let event: Value = serde_json::from_str(text.as_str()).expect("JSON event");
                assert_eq!(event["event"], "ping", "Unexpected event before close: {}", event);
            }
            Some(Ok(_)) => continue,
        }
    }
}

#[tokio::test]
async fn test_connected_frame_registers_the_connection() {
    let app = spawn_app();
    let ada = app.user("Ada", "ada@example.com").await;
    let addr = app.listen().await;

    let url = format!("ws://{}/ws?token={}", addr, ada.token);
    let (mut socket, _) = connect_async(url).await.expect("websocket handshake");

    let welcome = next_event(&mut socket).await;
    assert_eq!(welcome["event"], "connected");
    assert_eq!(welcome["data"]["userId"], ada.id.to_string());
    assert_eq!(welcome["data"]["pingIntervalSecs"], 1);
    assert!(welcome["data"]["connectionId"].is_u64());

    assert!(app.state.gateway.is_online(ada.id));
    assert_eq!(app.state.gateway.connection_count(ada.id), 1);
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    let app = spawn_app();
    let ada = app.user("Ada", "ada@example.com").await;
    let addr = app.listen().await;

    let mut request = format!("ws://{}/ws", addr).into_client_request().expect("request");
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", ada.token).parse().expect("header value"),
    );
    let (mut socket, _) = connect_async(request).await.expect("websocket handshake");

    let welcome = next_event(&mut socket).await;
    assert_eq!(welcome["event"], "connected");
}

#[tokio::test]
async fn test_writer_sends_periodic_ping() {
    let app = spawn_app();
    let ada = app.user("Ada", "ada@example.com").await;
    let addr = app.listen().await;
    let mut socket = open(addr, &ada).await;

    let frame = next_frame(&mut socket).await;
    assert_eq!(frame, json!({ "event": "ping" }));

    // Answering keeps the connection open
    send_json(&mut socket, json!({ "event": "pong" })).await;
    assert_eq!(next_frame(&mut socket).await["event"], "ping");
    assert!(app.state.gateway.is_online(ada.id));
}

#[tokio::test]
async fn test_malformed_frame_gets_error_event() {
    let app = spawn_app();
    let ada = app.user("Ada", "ada@example.com").await;
    let addr = app.listen().await;
    let mut socket = open(addr, &ada).await;

    socket
        .send(WsMessage::Text("this is not json".to_string().into()))
        .await
        .expect("send frame");
    let error = next_event(&mut socket).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["statusCode"], 400);

    send_json(&mut socket, json!({ "event": "teleport", "data": {} })).await;
    let error = next_event(&mut socket).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["statusCode"], 400);

    // A membership failure is reported the same way
    send_json(&mut socket, chat_message(Uuid::new_v4(), "into the void")).await;
    let error = next_event(&mut socket).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["statusCode"], 404);

    // The connection survives bad input
    assert!(app.state.gateway.is_online(ada.id));
}

#[tokio::test]
async fn test_client_close_unregisters() {
    let app = spawn_app();
    let ada = app.user("Ada", "ada@example.com").await;
    let addr = app.listen().await;

    let mut phone = open(addr, &ada).await;
    let mut laptop = open(addr, &ada).await;
    assert_eq!(app.state.gateway.connection_count(ada.id), 2);

    phone.close(None).await.expect("close phone");
    tokio::time::timeout(WAIT, async {
        while app.state.gateway.connection_count(ada.id) != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("phone unregistered");
    assert!(app.state.gateway.is_online(ada.id));

    laptop.close(None).await.expect("close laptop");
    wait_offline(&app.state.gateway, ada.id).await;
}

#[tokio::test]
async fn test_consecutive_sends_arrive_in_order() {
    let app = spawn_app();
    let ada = app.user("Ada", "ada@example.com").await;
    let grace = app.user("Grace", "grace@example.com").await;
    let chat_id = app.chat(&ada, &grace).await;
    let addr = app.listen().await;

    let mut ada_socket = open(addr, &ada).await;
    let mut grace_socket = open(addr, &grace).await;

    send_json(&mut ada_socket, chat_message(chat_id, "first")).await;
    send_json(&mut ada_socket, chat_message(chat_id, "second")).await;

    for expected in ["first", "second"] {
        let delivered = next_event(&mut grace_socket).await;
        assert_eq!(delivered["event"], "send-individual-message");
        assert_eq!(delivered["data"]["message"], expected);
        assert_eq!(delivered["data"]["senderId"], ada.id.to_string());

        let ack = next_event(&mut ada_socket).await;
        assert_eq!(ack["event"], "message-sent");
        assert_eq!(ack["data"]["id"], delivered["data"]["id"]);
    }

    let history: Value = app
        .server
        .get(&format!("/api/v1/chat/individual/get-messages/{}", chat_id))
        .authorization_bearer(&grace.token)
        .await
        .json();
    let bodies: Vec<&str> = history["data"]
        .as_array()
        .expect("history")
        .iter()
        .filter_map(|m| m["message"].as_str())
        .collect();
    assert_eq!(bodies, vec!["first", "second"]);
}

#[tokio::test]
async fn test_invalid_query_token_refused() {
    let app = spawn_app();
    let addr = app.listen().await;

    let result = connect_async(format!("ws://{}/ws?token=not-a-jwt", addr)).await;
    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        Err(other) => panic!("Expected an HTTP refusal, got {:?}", other),
        Ok(_) => panic!("Upgrade with an invalid token succeeded"),
    }
    assert_eq!(app.state.gateway.online_users(), 0);
}

#[tokio::test]
async fn test_logout_closes_live_sockets() {
    let app = spawn_app();
    let ada = app.user("Ada", "ada@example.com").await;
    let grace = app.user("Grace", "grace@example.com").await;
    let addr = app.listen().await;

    let mut ada_socket = open(addr, &ada).await;
    let mut grace_socket = open(addr, &grace).await;

    app.server
        .post("/api/v1/users/logout")
        .authorization_bearer(&ada.token)
        .await
        .assert_status_ok();

    expect_closed(&mut ada_socket).await;
    wait_offline(&app.state.gateway, ada.id).await;

    // The revoked token cannot reconnect
    let result = connect_async(format!("ws://{}/ws?token={}", addr, ada.token)).await;
    assert!(matches!(result, Err(WsError::Http(ref r)) if r.status().as_u16() == 401));

    // Other identities are untouched
    assert!(app.state.gateway.is_online(grace.id));
    assert_eq!(next_frame(&mut grace_socket).await["event"], "ping");
}

#[tokio::test]
async fn test_password_change_closes_live_sockets() {
    let app = spawn_app();
    let ada = app.user("Ada", "ada@example.com").await;
    let addr = app.listen().await;
    let mut socket = open(addr, &ada).await;

    app.server
        .post("/api/v1/users/change-password")
        .authorization_bearer(&ada.token)
        .json(&json!({ "oldPassword": "password123", "newPassword": "brand-new-pass" }))
        .await
        .assert_status_ok();

    expect_closed(&mut socket).await;
    wait_offline(&app.state.gateway, ada.id).await;
}
