//! Conversation Data Structures
//!
//! Represents a conversation between two or more users, plus each user's
//! membership row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    /// One-to-one conversation, unique per unordered pair of users
    Direct,
    /// Named conversation with any number of members
    Group,
}

impl ConversationKind {
    /// String form for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::Direct => "direct",
            ConversationKind::Group => "group",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "group" => ConversationKind::Group,
            _ => ConversationKind::Direct,
        }
    }
}

/// Role of a participant within a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Admin,
    Member,
}

impl ParticipantRole {
    /// String form for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Admin => "admin",
            ParticipantRole::Member => "member",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => ParticipantRole::Admin,
            _ => ParticipantRole::Member,
        }
    }
}

/// A user's membership in a conversation
///
/// Membership is soft: leaving sets `left_at` instead of deleting the row,
/// so read cursors and counters survive a rejoin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
    /// Set when the user leaves; `None` while the membership is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read_message_id: Option<Uuid>,
    pub is_muted: bool,
    pub is_archived: bool,
    /// Messages from other senders since this user's last read acknowledgement
    pub unread_count: i64,
}

/// Represents a conversation between users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// Direct or group
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    /// Display name (group conversations only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display image (group conversations only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// User who created the conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    /// Most recent message, denormalized for conversation lists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Active participants, embedded in API responses
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Unread counter of the requesting user
    #[serde(default)]
    pub unread_count: i64,
}

impl Conversation {
    /// Create a new conversation
    pub fn new(
        kind: ConversationKind,
        name: Option<String>,
        image_url: Option<String>,
        created_by: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            image_url,
            created_by,
            last_message_id: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
            participants: Vec::new(),
            unread_count: 0,
        }
    }

    /// Check if a user is among the embedded active participants
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    /// Get the other participant (for direct conversations)
    pub fn other_participant(&self, current_user_id: Uuid) -> Option<Uuid> {
        self.participants
            .iter()
            .map(|p| p.user_id)
            .find(|&id| id != current_user_id)
    }
}

/// Request to create a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub participant_ids: Vec<Uuid>,
}

/// Response for listing conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<Conversation>,
    pub total: i64,
}
