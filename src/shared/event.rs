/**
 * Real-time Event System
 *
 * This module defines the wire types for live delivery: events pushed from
 * the server to subscribed connections, and the small set of frames clients
 * send upstream over an open WebSocket.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::messaging::{Conversation, Message};

/// Type of live event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A message was persisted to a conversation
    NewMessage,
    /// A message's content changed
    MessageEdited,
    /// A message was soft-deleted
    MessageDeleted,
    /// A participant started typing
    Typing,
    /// A participant stopped typing
    StopTyping,
    /// A participant acknowledged messages as read
    Read,
    /// A user's presence changed
    OnlineStatus,
    /// A conversation was created or its metadata changed
    ConversationUpdated,
}

/// Live event pushed to subscribed connections
///
/// Events are transient signals layered over persisted state. Delivery is
/// best-effort; the durable record always lives in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveEvent {
    /// Type of event
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    /// Full message for new_message and message_edited events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// Event-specific payload for everything else
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl LiveEvent {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            conversation_id: None,
            user_id: None,
            message: None,
            payload: None,
        }
    }

    /// A message was persisted
    pub fn new_message(message: &Message) -> Self {
        Self {
            conversation_id: Some(message.conversation_id),
            user_id: Some(message.sender_id),
            message: Some(message.clone()),
            ..Self::new(EventKind::NewMessage)
        }
    }

    /// A message's content changed
    pub fn message_edited(message: &Message) -> Self {
        Self {
            conversation_id: Some(message.conversation_id),
            user_id: Some(message.sender_id),
            message: Some(message.clone()),
            ..Self::new(EventKind::MessageEdited)
        }
    }

    /// A message was soft-deleted
    pub fn message_deleted(conversation_id: Uuid, message_id: Uuid) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            payload: Some(serde_json::json!({ "message_id": message_id })),
            ..Self::new(EventKind::MessageDeleted)
        }
    }

    /// A participant started typing
    pub fn typing(conversation_id: Uuid, user_id: Uuid) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            user_id: Some(user_id),
            ..Self::new(EventKind::Typing)
        }
    }

    /// A participant stopped typing
    pub fn stop_typing(conversation_id: Uuid, user_id: Uuid) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            user_id: Some(user_id),
            ..Self::new(EventKind::StopTyping)
        }
    }

    /// A participant acknowledged messages as read up to `message_id`
    pub fn read(conversation_id: Uuid, user_id: Uuid, message_id: Uuid) -> Self {
        Self {
            conversation_id: Some(conversation_id),
            user_id: Some(user_id),
            payload: Some(serde_json::json!({ "message_id": message_id })),
            ..Self::new(EventKind::Read)
        }
    }

    /// A user's presence changed
    pub fn online_status(user_id: Uuid, online: bool) -> Self {
        Self {
            user_id: Some(user_id),
            payload: Some(serde_json::json!({ "online": online })),
            ..Self::new(EventKind::OnlineStatus)
        }
    }

    /// A conversation was created or its metadata changed
    pub fn conversation_updated(conversation: &Conversation) -> Self {
        Self {
            conversation_id: Some(conversation.id),
            payload: serde_json::to_value(conversation).ok(),
            ..Self::new(EventKind::ConversationUpdated)
        }
    }
}

/// Frame sent by a client over an open WebSocket
///
/// Everything durable goes through the HTTP API; these frames only manage
/// live delivery and transient signals. Unknown frames are skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Opt in to live events for a conversation
    Subscribe { conversation_id: Uuid },
    /// Opt out of live events for a conversation
    Unsubscribe { conversation_id: Uuid },
    /// Notify other participants that the user is typing
    Typing { conversation_id: Uuid },
    /// Notify other participants that the user stopped typing
    StopTyping { conversation_id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::messaging::MessageKind;

    #[test]
    fn test_new_message_event() {
        let message = Message::new_text(Uuid::new_v4(), Uuid::new_v4(), "hello".to_string());
        let event = LiveEvent::new_message(&message);

        assert_eq!(event.kind, EventKind::NewMessage);
        assert_eq!(event.conversation_id, Some(message.conversation_id));
        assert_eq!(event.user_id, Some(message.sender_id));
        assert_eq!(event.message.as_ref().unwrap().id, message.id);
    }

    #[test]
    fn test_event_kind_wire_names() {
        let message = Message::new_text(Uuid::new_v4(), Uuid::new_v4(), "hi".to_string());
        let json = serde_json::to_value(LiveEvent::new_message(&message)).unwrap();
        assert_eq!(json["type"], "new_message");
        assert_eq!(json["message"]["type"], "text");

        let json = serde_json::to_value(LiveEvent::typing(Uuid::new_v4(), Uuid::new_v4())).unwrap();
        assert_eq!(json["type"], "typing");
        assert!(json.get("message").is_none());
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_message_deleted_payload() {
        let conversation_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let event = LiveEvent::message_deleted(conversation_id, message_id);

        assert_eq!(event.kind, EventKind::MessageDeleted);
        let payload = event.payload.unwrap();
        assert_eq!(payload["message_id"], message_id.to_string());
    }

    #[test]
    fn test_read_event_payload() {
        let message_id = Uuid::new_v4();
        let event = LiveEvent::read(Uuid::new_v4(), Uuid::new_v4(), message_id);
        assert_eq!(event.payload.unwrap()["message_id"], message_id.to_string());
    }

    #[test]
    fn test_online_status_payload() {
        let user_id = Uuid::new_v4();
        let event = LiveEvent::online_status(user_id, true);
        assert_eq!(event.kind, EventKind::OnlineStatus);
        assert_eq!(event.user_id, Some(user_id));
        assert_eq!(event.payload.unwrap()["online"], true);
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let message = Message::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some("hey".to_string()),
            MessageKind::Text,
            None,
            None,
        );
        let event = LiveEvent::message_edited(&message);
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: LiveEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_client_frame_parsing() {
        let conversation_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"type": "subscribe", "conversation_id": "{}"}}"#,
            conversation_id
        );
        let frame: ClientFrame = serde_json::from_str(&raw).unwrap();
        assert_eq!(frame, ClientFrame::Subscribe { conversation_id });
    }

    #[test]
    fn test_unknown_client_frame_is_error() {
        let raw = r#"{"type": "launch_missiles", "conversation_id": "not-a-uuid"}"#;
        assert!(serde_json::from_str::<ClientFrame>(raw).is_err());
    }
}
