//! Event routing and fan-out
//!
//! `Dispatcher` is the single router for inbound socket events and the
//! publisher for writes made over HTTP. New messages are always persisted
//! through the `MessageService` before anything is fanned out.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::messaging::MessageService;
use crate::backend::realtime::connection::ConnectionId;
use crate::backend::realtime::gateway::Gateway;
use crate::shared::event::{ClientEvent, SendIndividualMessage, ServerEvent, Typing, TypingNotification};
use crate::shared::messaging::Message;

/// The authenticated origin of an inbound event
#[derive(Debug, Clone)]
pub struct Origin {
    pub user_id: Uuid,
    pub connection_id: ConnectionId,
    /// Used for the default "<name> is typing" hint
    pub first_name: String,
}

#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<Gateway>,
    messages: MessageService,
}

impl Dispatcher {
    pub fn new(gateway: Arc<Gateway>, messages: MessageService) -> Self {
        Self { gateway, messages }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    /// Route one inbound event
    ///
    /// An error here concerns the origin's own event and should be reported
    /// back to that connection only.
    pub async fn dispatch(&self, origin: &Origin, event: ClientEvent) -> BackendResult<()> {
        tracing::debug!("[Gateway] {} from user {} ({})", event.name(), origin.user_id, origin.connection_id);

        if let Some((kind, signal)) = event.as_signal() {
            let relay = ServerEvent::signal(kind, signal.relay_from(origin.user_id));
            self.gateway.send_to_user(signal.receiver, &relay);
            return Ok(());
        }

        match event {
            ClientEvent::SendIndividualMessage(payload) => self.send_message(origin, payload).await,
            ClientEvent::Typing(typing) => {
                self.relay_typing(origin, typing);
                Ok(())
            }
            ClientEvent::Pong => Ok(()),
            // Signaling variants are handled above
            ClientEvent::AudioCallOffer(_)
            | ClientEvent::AudioCallAnswer(_)
            | ClientEvent::IceCandidate(_)
            | ClientEvent::CloseAudioCall(_) => Ok(()),
        }
    }

    async fn send_message(&self, origin: &Origin, payload: SendIndividualMessage) -> BackendResult<()> {
        if let Some(claimed) = payload.sender_id {
            if claimed != origin.user_id {
                tracing::warn!("[Gateway] User {} claimed to send as {}", origin.user_id, claimed);
                return Err(BackendError::forbidden("senderId does not match the authenticated user"));
            }
        }

        let media = payload.media_ref();
        let message = self
            .messages
            .create_message(payload.chat_id, origin.user_id, &payload.message, media)
            .await?;
        let recipients = self.messages.recipients(&message).await?;

        self.publish_new_message(&message, &recipients, Some(origin.connection_id));
        Ok(())
    }

    fn relay_typing(&self, origin: &Origin, typing: Typing) {
        if typing.receiver == origin.user_id {
            return;
        }
        let message = if typing.message.trim().is_empty() {
            format!("{} is typing", origin.first_name)
        } else {
            typing.message
        };
        let event = ServerEvent::TypingNotification(TypingNotification {
            sender: origin.user_id,
            message,
            is_typing: typing.is_typing,
        });
        self.gateway.send_to_user(typing.receiver, &event);
    }

    /// Fan out a stored message
    ///
    /// Recipients get `send-individual-message`. When the message came from
    /// a socket, that connection gets a `message-sent` acknowledgement.
    pub fn publish_new_message(&self, message: &Message, recipients: &[Uuid], origin: Option<ConnectionId>) {
        let event = ServerEvent::IndividualMessage(message.clone());
        let delivered: usize = recipients
            .iter()
            .map(|&user_id| self.gateway.send_to_user(user_id, &event))
            .sum();

        if let Some(connection_id) = origin {
            self.gateway
                .send_to_connection(message.sender_id, connection_id, &ServerEvent::MessageSent(message.clone()));
        }

        tracing::debug!("[Gateway] Message {} delivered to {} connections", message.id, delivered);
    }

    /// Fan out an edited message to the other members
    pub fn publish_edit(&self, message: &Message, recipients: &[Uuid]) {
        let event = ServerEvent::MessageEdited(message.clone());
        for &user_id in recipients {
            self.gateway.send_to_user(user_id, &event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::connection::Connection;
    use crate::backend::store::{ChatStore, MemoryStore};
    use crate::shared::event::Signal;
    use assert_matches::assert_matches;
    use serde_json::{json, Map, Value};
    use tokio::sync::mpsc;

    struct Fixture {
        dispatcher: Dispatcher,
        chat_id: Uuid,
        a: Uuid,
        b: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (chat, _) = store.get_or_insert_conversation(a, b).await.unwrap();
        let gateway = Arc::new(Gateway::default());
        Fixture {
            dispatcher: Dispatcher::new(gateway, MessageService::new(store, 20, 1000)),
            chat_id: chat.id,
            a,
            b,
        }
    }

    fn connect(gateway: &Gateway, user: Uuid) -> (Connection, mpsc::Receiver<ServerEvent>) {
        let mut connection = gateway.open_connection().unwrap();
        connection.authenticate(user).unwrap();
        let mut rx = gateway.register(&mut connection).unwrap();
        assert_matches!(rx.try_recv(), Ok(ServerEvent::Connected(_)));
        (connection, rx)
    }

    fn origin(user_id: Uuid, connection: &Connection) -> Origin {
        Origin {
            user_id,
            connection_id: connection.id(),
            first_name: "Ada".to_string(),
        }
    }

    #[tokio::test]
    async fn test_message_fans_out_and_acks() {
        let f = fixture().await;
        let gateway = f.dispatcher.gateway().clone();
        let (conn_a, mut rx_a) = connect(&gateway, f.a);
        let (_conn_b, mut rx_b) = connect(&gateway, f.b);

        let event = ClientEvent::SendIndividualMessage(SendIndividualMessage {
            sender_id: Some(f.a),
            chat_id: f.chat_id,
            message: "hello".to_string(),
            media: None,
            media_type: None,
        });
        f.dispatcher.dispatch(&origin(f.a, &conn_a), event).await.unwrap();

        let received = match rx_b.try_recv() {
            Ok(ServerEvent::IndividualMessage(m)) => m,
            other => panic!("Expected IndividualMessage, got {:?}", other),
        };
        assert_eq!(received.message, "hello");
        assert_eq!(received.sender_id, f.a);

        assert_matches!(rx_a.try_recv(), Ok(ServerEvent::MessageSent(m)) if m.id == received.id);
    }

    #[tokio::test]
    async fn test_spoofed_sender_rejected() {
        let f = fixture().await;
        let gateway = f.dispatcher.gateway().clone();
        let (conn_a, _rx_a) = connect(&gateway, f.a);
        let (_conn_b, mut rx_b) = connect(&gateway, f.b);

        let event = ClientEvent::SendIndividualMessage(SendIndividualMessage {
            sender_id: Some(f.b),
            chat_id: f.chat_id,
            message: "forged".to_string(),
            media: None,
            media_type: None,
        });
        let err = f.dispatcher.dispatch(&origin(f.a, &conn_a), event).await.unwrap_err();
        assert_matches!(err, BackendError::Forbidden { .. });
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_typing_uses_default_hint() {
        let f = fixture().await;
        let gateway = f.dispatcher.gateway().clone();
        let (conn_a, _rx_a) = connect(&gateway, f.a);
        let (_conn_b, mut rx_b) = connect(&gateway, f.b);

        let event = ClientEvent::Typing(Typing {
            message: String::new(),
            is_typing: true,
            receiver: f.b,
        });
        f.dispatcher.dispatch(&origin(f.a, &conn_a), event).await.unwrap();

        assert_matches!(
            rx_b.try_recv(),
            Ok(ServerEvent::TypingNotification(n)) if n.sender == f.a && n.message == "Ada is typing" && n.is_typing
        );
    }

    #[tokio::test]
    async fn test_typing_to_offline_user_is_dropped() {
        let f = fixture().await;
        let gateway = f.dispatcher.gateway().clone();
        let (conn_a, mut rx_a) = connect(&gateway, f.a);

        let event = ClientEvent::Typing(Typing {
            message: "Ada is typing".to_string(),
            is_typing: true,
            receiver: f.b,
        });
        f.dispatcher.dispatch(&origin(f.a, &conn_a), event).await.unwrap();

        assert!(rx_a.try_recv().is_err());
        assert!(!gateway.is_online(f.b));
        assert_eq!(gateway.online_users(), 1);
    }

    #[tokio::test]
    async fn test_signal_relayed_verbatim() {
        let f = fixture().await;
        let gateway = f.dispatcher.gateway().clone();
        let (conn_a, _rx_a) = connect(&gateway, f.a);
        let (_conn_b, mut rx_b) = connect(&gateway, f.b);

        let mut payload = Map::new();
        payload.insert("candidate".to_string(), json!({ "candidate": "candidate:1 1 udp", "sdpMLineIndex": 0 }));
        let event = ClientEvent::IceCandidate(Signal {
            receiver: f.b,
            payload,
        });
        f.dispatcher.dispatch(&origin(f.a, &conn_a), event).await.unwrap();

        match rx_b.try_recv() {
            Ok(ServerEvent::IceCandidate(relay)) => {
                assert_eq!(relay.sender, f.a);
                assert_eq!(relay.payload["candidate"]["sdpMLineIndex"], Value::from(0));
            }
            other => panic!("Expected IceCandidate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_to_foreign_chat_fails_without_fan_out() {
        let f = fixture().await;
        let gateway = f.dispatcher.gateway().clone();
        let outsider = Uuid::new_v4();
        let (conn_x, _rx_x) = connect(&gateway, outsider);
        let (_conn_b, mut rx_b) = connect(&gateway, f.b);

        let event = ClientEvent::SendIndividualMessage(SendIndividualMessage {
            sender_id: None,
            chat_id: f.chat_id,
            message: "let me in".to_string(),
            media: None,
            media_type: None,
        });
        let err = f.dispatcher.dispatch(&origin(outsider, &conn_x), event).await.unwrap_err();
        assert_matches!(err, BackendError::NotFound { .. });
        assert!(rx_b.try_recv().is_err());
    }
}
