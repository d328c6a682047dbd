/**
 * Realtime Event Types
 *
 * This module defines the closed set of frames exchanged over the realtime
 * socket. Every frame is a JSON object of the form
 *
 * ```json
 * { "event": "typing", "data": { "message": "Ada is typing", "isTyping": true, "receiver": "..." } }
 * ```
 *
 * `ClientEvent` lists what a client may send, `ServerEvent` what the gateway
 * delivers. Call signaling payloads (SDP offers/answers, ICE candidates) are
 * opaque: every field besides `receiver` is relayed verbatim.
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::shared::envelope::ErrorBody;
use crate::shared::messaging::{media_ref, MediaKind, MediaRef, Message};

/// Payload of an inbound `send-individual-message`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendIndividualMessage {
    /// Optional, must match the authenticated identity when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<Uuid>,
    pub chat_id: Uuid,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaKind>,
}

impl SendIndividualMessage {
    pub fn media_ref(&self) -> Option<MediaRef> {
        media_ref(self.media.as_deref(), self.media_type)
    }
}

fn typing_default() -> bool {
    true
}

/// Payload of an inbound `typing`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Typing {
    /// Display hint, e.g. "Ada is typing"
    #[serde(default)]
    pub message: String,
    #[serde(default = "typing_default")]
    pub is_typing: bool,
    pub receiver: Uuid,
}

/// Payload of an outbound `typing_notification`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotification {
    pub sender: Uuid,
    pub message: String,
    pub is_typing: bool,
}

/// Inbound call-signaling payload addressed to one peer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub receiver: Uuid,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Signal {
    /// Turn into the outbound relay, stamping the authenticated sender
    pub fn relay_from(&self, sender: Uuid) -> SignalRelay {
        let mut payload = self.payload.clone();
        payload.remove("sender");
        SignalRelay { sender, payload }
    }
}

/// Outbound call-signaling payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalRelay {
    pub sender: Uuid,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Call-signaling event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    Close,
}

/// Frames a client may send
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "send-individual-message")]
    SendIndividualMessage(SendIndividualMessage),
    #[serde(rename = "typing")]
    Typing(Typing),
    #[serde(rename = "audio-call-offer")]
    AudioCallOffer(Signal),
    #[serde(rename = "audio-call-answer")]
    AudioCallAnswer(Signal),
    #[serde(rename = "ice-candidate")]
    IceCandidate(Signal),
    #[serde(rename = "close-audio-call")]
    CloseAudioCall(Signal),
    #[serde(rename = "pong")]
    Pong,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SendIndividualMessage(_) => "send-individual-message",
            ClientEvent::Typing(_) => "typing",
            ClientEvent::AudioCallOffer(_) => "audio-call-offer",
            ClientEvent::AudioCallAnswer(_) => "audio-call-answer",
            ClientEvent::IceCandidate(_) => "ice-candidate",
            ClientEvent::CloseAudioCall(_) => "close-audio-call",
            ClientEvent::Pong => "pong",
        }
    }

    /// The signaling kind and payload, for the four call events
    pub fn as_signal(&self) -> Option<(SignalKind, &Signal)> {
        match self {
            ClientEvent::AudioCallOffer(s) => Some((SignalKind::Offer, s)),
            ClientEvent::AudioCallAnswer(s) => Some((SignalKind::Answer, s)),
            ClientEvent::IceCandidate(s) => Some((SignalKind::IceCandidate, s)),
            ClientEvent::CloseAudioCall(s) => Some((SignalKind::Close, s)),
            _ => None,
        }
    }
}

/// Sent once after a connection becomes active
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub user_id: Uuid,
    pub connection_id: u64,
    /// Quiet interval after which clients clear a typing indicator
    pub typing_timeout_ms: u64,
    pub ping_interval_secs: u64,
}

/// Frames the gateway delivers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "connected")]
    Connected(Welcome),
    #[serde(rename = "ping")]
    Ping,
    /// A new message from another member
    #[serde(rename = "send-individual-message")]
    IndividualMessage(Message),
    /// Acknowledgement to the sending connection
    #[serde(rename = "message-sent")]
    MessageSent(Message),
    #[serde(rename = "message-edited")]
    MessageEdited(Message),
    #[serde(rename = "typing_notification")]
    TypingNotification(TypingNotification),
    #[serde(rename = "audio-call-offer")]
    AudioCallOffer(SignalRelay),
    #[serde(rename = "audio-call-answer")]
    AudioCallAnswer(SignalRelay),
    #[serde(rename = "ice-candidate")]
    IceCandidate(SignalRelay),
    #[serde(rename = "close-audio-call")]
    CloseAudioCall(SignalRelay),
    #[serde(rename = "error")]
    Error(ErrorBody),
}

impl ServerEvent {
    pub fn signal(kind: SignalKind, relay: SignalRelay) -> Self {
        match kind {
            SignalKind::Offer => ServerEvent::AudioCallOffer(relay),
            SignalKind::Answer => ServerEvent::AudioCallAnswer(relay),
            SignalKind::IceCandidate => ServerEvent::IceCandidate(relay),
            SignalKind::Close => ServerEvent::CloseAudioCall(relay),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorBody::new(status_code, message))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected(_) => "connected",
            ServerEvent::Ping => "ping",
            ServerEvent::IndividualMessage(_) => "send-individual-message",
            ServerEvent::MessageSent(_) => "message-sent",
            ServerEvent::MessageEdited(_) => "message-edited",
            ServerEvent::TypingNotification(_) => "typing_notification",
            ServerEvent::AudioCallOffer(_) => "audio-call-offer",
            ServerEvent::AudioCallAnswer(_) => "audio-call-answer",
            ServerEvent::IceCandidate(_) => "ice-candidate",
            ServerEvent::CloseAudioCall(_) => "close-audio-call",
            ServerEvent::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_send_individual_message() {
        let chat_id = Uuid::new_v4();
        let frame = json!({
            "event": "send-individual-message",
            "data": { "chatId": chat_id, "message": "hi", "media": "/media/a.png", "mediaType": "image" }
        });

        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        match event {
            ClientEvent::SendIndividualMessage(payload) => {
                assert_eq!(payload.chat_id, chat_id);
                assert_eq!(payload.message, "hi");
                assert!(payload.sender_id.is_none());
                assert_eq!(payload.media_ref().unwrap().kind, MediaKind::Image);
            }
            other => panic!("Expected SendIndividualMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_typing_defaults() {
        let receiver = Uuid::new_v4();
        let event: ClientEvent =
            serde_json::from_value(json!({ "event": "typing", "data": { "receiver": receiver } })).unwrap();
        assert_eq!(
            event,
            ClientEvent::Typing(Typing {
                message: String::new(),
                is_typing: true,
                receiver,
            })
        );
    }

    #[test]
    fn test_signal_payload_is_opaque() {
        let receiver = Uuid::new_v4();
        let sender = Uuid::new_v4();
        let frame = json!({
            "event": "audio-call-offer",
            "data": { "receiver": receiver, "offer": { "type": "offer", "sdp": "v=0" }, "sender": "spoofed" }
        });

        let event: ClientEvent = serde_json::from_value(frame).unwrap();
        let (kind, signal) = event.as_signal().unwrap();
        assert_eq!(kind, SignalKind::Offer);

        let outbound = ServerEvent::signal(kind, signal.relay_from(sender));
        let json = serde_json::to_value(&outbound).unwrap();
        assert_eq!(json["event"], "audio-call-offer");
        assert_eq!(json["data"]["sender"], json!(sender));
        assert_eq!(json["data"]["offer"]["sdp"], "v=0");
        assert!(json["data"].get("receiver").is_none());
    }

    #[test]
    fn test_pong_without_data() {
        let event: ClientEvent = serde_json::from_str(r#"{"event":"pong"}"#).unwrap();
        assert_eq!(event, ClientEvent::Pong);
    }

    #[test]
    fn test_unknown_event_rejected() {
        let result: Result<ClientEvent, _> = serde_json::from_str(r#"{"event":"launch-missiles","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_names_match_wire() {
        let events = vec![
            ServerEvent::Ping,
            ServerEvent::error(403, "nope"),
            ServerEvent::TypingNotification(TypingNotification {
                sender: Uuid::new_v4(),
                message: "typing".to_string(),
                is_typing: true,
            }),
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }
}
