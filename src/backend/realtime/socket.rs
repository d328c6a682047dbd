//! WebSocket transport for the gateway
//!
//! `GET /ws?token=<jwt>` (or an `Authorization: Bearer` header) upgrades into
//! a gateway connection. The credential is checked before the upgrade; a
//! missing or invalid one is refused with 401 and the connection never
//! becomes active.
//!
//! Each socket gets a writer task draining its event queue (plus a periodic
//! `ping`) and a reader loop that parses frames and hands them to the
//! dispatcher one at a time.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::backend::auth::users::User;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::auth::bearer_token;
use crate::backend::realtime::connection::Connection;
use crate::backend::realtime::delivery::{Dispatcher, Origin};
use crate::backend::realtime::gateway::GatewayError;
use crate::backend::server::state::AppState;
use crate::shared::event::{ClientEvent, ServerEvent};

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// WebSocket upgrade handler
///
/// GET /ws
///
/// The credential is checked before the upgrade headers, so a plain request
/// without a token gets 401 rather than an upgrade error.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> BackendResult<Response> {
    let mut connection = state.gateway.open_connection().map_err(|e| {
        tracing::warn!("[Gateway] Refusing upgrade: {}", e);
        BackendError::unavailable(e.to_string())
    })?;

    let token = params
        .token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| bearer_token(&headers).ok().map(str::to_string));
    let Some(token) = token else {
        connection.disconnect();
        tracing::warn!("[Gateway] Upgrade without credential refused");
        return Err(BackendError::unauthenticated("Missing access token"));
    };

    let user = match state.identity.authenticate(&token).await {
        Ok(user) => user,
        Err(e) => {
            connection.disconnect();
            tracing::warn!("[Gateway] Upgrade with invalid credential refused: {}", e.message());
            return Err(e);
        }
    };
    connection
        .authenticate(user.id)
        .map_err(|e| BackendError::internal(e.to_string()))?;

    let ws = ws.map_err(|e| {
        connection.disconnect();
        BackendError::invalid_argument(e.body_text())
    })?;

    tracing::info!("[Gateway] Upgrade request from user {}", user.id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection, user)))
}

async fn handle_socket(socket: WebSocket, state: AppState, mut connection: Connection, user: User) {
    let gateway = state.gateway.clone();
    let events = match gateway.register(&mut connection) {
        Ok(rx) => rx,
        Err(GatewayError::Closed) => {
            tracing::info!("[Gateway] Shutting down, closing new socket for user {}", user.id);
            return;
        }
        Err(e) => {
            tracing::error!("[Gateway] Failed to register connection for user {}: {}", user.id, e);
            return;
        }
    };

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, events, gateway.settings().ping_interval));

    let origin = Origin {
        user_id: user.id,
        connection_id: connection.id(),
        first_name: user.to_summary().first_name().to_string(),
    };

    tokio::select! {
        _ = read_loop(stream, &state.dispatcher, &origin) => {
            writer.abort();
        }
        _ = &mut writer => {
            tracing::debug!("[Gateway] Writer for connection {} finished", origin.connection_id);
        }
    }

    gateway.unregister(&mut connection);
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, WsMessage>,
    mut events: mpsc::Receiver<ServerEvent>,
    ping_every: Duration,
) {
    let mut ping = tokio::time::interval(ping_every);
    // The first tick completes immediately
    ping.tick().await;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                None => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
            },
            _ = ping.tick() => {
                if send_event(&mut sink, &ServerEvent::Ping).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn send_event(sink: &mut SplitSink<WebSocket, WsMessage>, event: &ServerEvent) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("[Gateway] Failed to serialize {}: {}", event.name(), e);
            return Ok(());
        }
    };
    sink.send(WsMessage::Text(json.into())).await
}

async fn read_loop(mut stream: SplitStream<WebSocket>, dispatcher: &Dispatcher, origin: &Origin) {
    while let Some(frame) = stream.next().await {
        let event = match frame {
            Ok(WsMessage::Text(text)) => serde_json::from_str::<ClientEvent>(text.as_str()),
            Ok(WsMessage::Binary(bytes)) => serde_json::from_slice::<ClientEvent>(&bytes),
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => continue,
            Ok(WsMessage::Close(_)) => {
                tracing::debug!("[Gateway] Connection {} closed by client", origin.connection_id);
                break;
            }
            Err(e) => {
                tracing::warn!("[Gateway] Socket error on connection {}: {}", origin.connection_id, e);
                break;
            }
        };

        let result = match event {
            Ok(event) => dispatcher.dispatch(origin, event).await,
            Err(e) => Err(BackendError::invalid_argument(format!("Malformed event: {}", e))),
        };

        if let Err(e) = result {
            if e.is_internal() {
                tracing::error!("[Gateway] Event from user {} failed: {}", origin.user_id, e.message());
            }
            let reply = ServerEvent::error(e.status_code().as_u16(), e.public_message());
            dispatcher
                .gateway()
                .send_to_connection(origin.user_id, origin.connection_id, &reply);
        }
    }
}
