//! Messaging Module
//!
//! This module contains all the data structures for the messaging system:
//!
//! - `Conversation` - A direct or group conversation
//! - `Participant` - A user's membership in a conversation
//! - `Message` - A message in a conversation
//!
//! # Usage
//!
//! ```rust
//! use ripple::shared::messaging::{Conversation, Message, Participant};
//! ```

pub mod conversation;
pub mod message;

// Re-export all types
pub use conversation::{
    Conversation, ConversationKind, CreateConversationRequest, ListConversationsResponse,
    Participant, ParticipantRole,
};
pub use message::{
    EditMessageRequest, ListMessagesResponse, MarkReadRequest, MediaDescriptor, Message,
    MessageKind, SendMessageRequest, UnreadCountResponse,
};
