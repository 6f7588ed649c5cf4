//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the backend and API clients. These types are used for serialization and
//! communication over HTTP and WebSocket.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization
//! and transmission over the wire.

/// Real-time event system
pub mod event;

/// Messaging types for conversations and messages
pub mod messaging;

/// Re-export commonly used types for convenience
pub use event::{ClientFrame, EventKind, LiveEvent};
pub use messaging::conversation::{Conversation, ConversationKind, Participant, ParticipantRole};
pub use messaging::message::{MediaDescriptor, Message, MessageKind};
