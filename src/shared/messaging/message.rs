//! Chat Message Data Structure
//!
//! Represents a message in a conversation, the request bodies that create and
//! edit one, and the page shape returned by paged history reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Longest accepted message body, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Kind of media attached to a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        }
    }

    /// Parse from the stored string, unknown values map to `Other`
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "image" => MediaKind::Image,
            "video" => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }

    /// Detect the kind from a MIME type such as `image/png`
    pub fn from_mime(mime: &str) -> Self {
        let top = mime.split('/').next().unwrap_or_default();
        match top.trim().to_ascii_lowercase().as_str() {
            "image" => MediaKind::Image,
            "video" => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }
}

/// Reference to an uploaded media file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRef {
    /// Durable URL returned by the media store
    pub url: String,
    /// Detected media kind
    pub kind: MediaKind,
}

/// A message stored in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,
    /// Conversation this message belongs to
    pub chat_id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// Message body, empty only when media is attached
    pub message: String,
    /// Optional attached media
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
    /// Store-assigned insertion sequence, breaks creation-time ties
    pub sequence: i64,
    /// Whether the body was edited after creation
    #[serde(default)]
    pub edited: bool,
    /// Time of the last edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Ordering key inside a conversation
    pub fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.sequence)
    }
}

/// Check that a message has content and the body is within bounds
pub fn validate_content(body: &str, media: Option<&MediaRef>) -> Result<(), SharedError> {
    if body.trim().is_empty() && media.is_none() {
        return Err(SharedError::validation(
            "message",
            "Message text cannot be empty without media",
        ));
    }
    if body.chars().count() > MAX_MESSAGE_CHARS {
        return Err(SharedError::validation(
            "message",
            format!("Message text exceeds {} characters", MAX_MESSAGE_CHARS),
        ));
    }
    if let Some(media) = media {
        if media.url.trim().is_empty() {
            return Err(SharedError::validation("media", "Media URL cannot be empty"));
        }
    }
    Ok(())
}

/// Body of `POST /individual/send-message/{chatId}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
    /// Media URL returned by the upload endpoint
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaKind>,
}

impl SendMessageRequest {
    /// Combine the flat `media`/`mediaType` fields into a media reference
    pub fn media_ref(&self) -> Option<MediaRef> {
        media_ref(self.media.as_deref(), self.media_type)
    }
}

/// Build a media reference from the flat wire fields; a missing kind means `Other`
pub fn media_ref(url: Option<&str>, kind: Option<MediaKind>) -> Option<MediaRef> {
    url.filter(|u| !u.trim().is_empty()).map(|u| MediaRef {
        url: u.to_string(),
        kind: kind.unwrap_or(MediaKind::Other),
    })
}

/// Body of `PUT /individual/editMessage/{messageId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditMessageRequest {
    pub message: String,
}

/// One page of a conversation's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Zero-based page index, page 0 is the most recent
    pub page: u32,
    pub page_size: u32,
    /// Whether older pages exist
    pub has_more: bool,
    /// Messages of this page in chronological order
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(body: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            chat_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            message: body.to_string(),
            media: None,
            created_at: Utc::now(),
            sequence: 1,
            edited: false,
            edited_at: None,
        }
    }

    #[test]
    fn test_validate_rejects_empty_without_media() {
        assert!(validate_content("   ", None).is_err());
        assert!(validate_content("hi", None).is_ok());
    }

    #[test]
    fn test_validate_accepts_empty_with_media() {
        let media = MediaRef {
            url: "/media/a.png".to_string(),
            kind: MediaKind::Image,
        };
        assert!(validate_content("", Some(&media)).is_ok());
    }

    #[test]
    fn test_validate_rejects_long_body() {
        let body = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate_content(&body, None).is_err());
    }

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Other);
        assert_eq!(MediaKind::parse("VIDEO"), MediaKind::Video);
    }

    #[test]
    fn test_send_request_media_ref() {
        let request: SendMessageRequest = serde_json::from_str(
            r#"{"message":"","media":"/media/x.mp4","mediaType":"video"}"#,
        )
        .unwrap();
        assert_eq!(
            request.media_ref(),
            Some(MediaRef {
                url: "/media/x.mp4".to_string(),
                kind: MediaKind::Video
            })
        );

        let plain: SendMessageRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(plain.media_ref().is_none());
    }

    #[test]
    fn test_message_wire_names() {
        let json = serde_json::to_value(sample("hello")).unwrap();
        assert!(json.get("chatId").is_some());
        assert!(json.get("senderId").is_some());
        assert_eq!(json["edited"], false);
        assert!(json.get("media").is_none());
    }
}
