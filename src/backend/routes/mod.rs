//! Route Configuration Module
//!
//! Assembles the HTTP surface: the REST API under `/api` and the WebSocket
//! upgrade at `/live`, all behind the identity middleware.
//!
//! # Route Overview
//!
//! ```text
//! POST   /api/conversations                  create (direct or group)
//! GET    /api/conversations                  list, most recent first
//! GET    /api/conversations/{id}             fetch one
//! POST   /api/conversations/{id}/leave       leave
//! POST   /api/conversations/direct/{user_id} get-or-create direct
//! POST   /api/conversations/{id}/messages    send
//! GET    /api/conversations/{id}/messages    list, newest first
//! POST   /api/conversations/{id}/read        mark read up to a message
//! PUT    /api/messages/{id}                  edit (sender only)
//! DELETE /api/messages/{id}                  soft delete (sender only)
//! GET    /api/messages/unread                total unread count
//! GET    /live                               WebSocket upgrade
//! ```

/// Main router creation
pub mod router;

// Re-export commonly used functions
pub use router::create_router;
