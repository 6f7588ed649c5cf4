//! Message Data Structures
//!
//! Represents a message in a conversation. Message history is append-only:
//! edits and deletions mutate flags and content on the existing row, never
//! its identity or its position in the conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
}

impl MessageKind {
    /// String form for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Video => "video",
            MessageKind::Audio => "audio",
            MessageKind::File => "file",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "image" => MessageKind::Image,
            "video" => MessageKind::Video,
            "audio" => MessageKind::Audio,
            "file" => MessageKind::File,
            _ => MessageKind::Text,
        }
    }
}

/// Attachment metadata for non-text messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaDescriptor {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Duration in seconds (audio/video)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Represents a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// Message this one replies to (threading)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<Uuid>,
    /// Text content; `None` once the message has been deleted
    pub content: Option<String>,
    /// Type of message
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Attachment, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaDescriptor>,
    pub is_edited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the message was sent; defines its position in the conversation
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(
        conversation_id: Uuid,
        sender_id: Uuid,
        content: Option<String>,
        kind: MessageKind,
        media: Option<MediaDescriptor>,
        parent_message_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            parent_message_id,
            content,
            kind,
            media,
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    /// Create a new plain text message
    pub fn new_text(conversation_id: Uuid, sender_id: Uuid, content: String) -> Self {
        Self::new(
            conversation_id,
            sender_id,
            Some(content),
            MessageKind::Text,
            None,
            None,
        )
    }
}

/// Request to send a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub media: Option<MediaDescriptor>,
    #[serde(default)]
    pub parent_message_id: Option<Uuid>,
}

/// Response for listing messages in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<Message>,
    pub total: i64,
}

/// Request to edit a message's content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

/// Request to acknowledge messages as read up to a point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadRequest {
    pub message_id: Uuid,
}

/// Response carrying a user's total unread count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_text_message() {
        let conversation_id = Uuid::new_v4();
        let sender_id = Uuid::new_v4();
        let message = Message::new_text(conversation_id, sender_id, "hello".to_string());

        assert_eq!(message.conversation_id, conversation_id);
        assert_eq!(message.sender_id, sender_id);
        assert_eq!(message.content.as_deref(), Some("hello"));
        assert_eq!(message.kind, MessageKind::Text);
        assert!(!message.is_edited);
        assert!(!message.is_deleted);
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let message = Message::new_text(Uuid::new_v4(), Uuid::new_v4(), "hi".to_string());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "text");
        assert!(json.get("media").is_none());
        assert!(json.get("edited_at").is_none());
    }

    #[test]
    fn test_send_request_defaults() {
        let request: SendMessageRequest = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert_eq!(request.content.as_deref(), Some("hi"));
        assert_eq!(request.kind, MessageKind::Text);
        assert!(request.media.is_none());
        assert!(request.parent_message_id.is_none());
    }

    #[test]
    fn test_media_message_round_trip() {
        let request: SendMessageRequest = serde_json::from_str(
            r#"{"type": "image", "media": {"url": "https://cdn.example/a.png", "size": 512}}"#,
        )
        .unwrap();
        assert_eq!(request.kind, MessageKind::Image);
        let media = request.media.unwrap();
        assert_eq!(media.url, "https://cdn.example/a.png");
        assert_eq!(media.size, Some(512));
        assert!(media.duration.is_none());
    }
}
