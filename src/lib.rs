//! Ripple - Real-time Conversation Messaging Backend
//!
//! Ripple is the messaging core of a social platform: durable conversations
//! and messages stored in SQLite, with a concurrent in-memory hub fanning
//! live events out to subscribed WebSocket connections.
//!
//! # Overview
//!
//! This library provides:
//! - Direct (1:1) and group conversations with soft membership
//! - Append-only message history with edits and soft deletion
//! - Per-participant unread counters and read cursors
//! - Live event delivery (new messages, edits, deletes, typing, read
//!   receipts) over WebSockets with bounded per-connection queues
//!
//! # Module Structure
//!
//! The library is organized into two main modules:
//!
//! - **`shared`** - Types shared with API clients
//!   - Conversation, participant and message structures
//!   - Live event and client frame types
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server and WebSocket sessions
//!   - Conversation store (sqlx/SQLite) and messaging service
//!   - Realtime hub with per-connection outbound queues
//!
//! # Delivery Semantics
//!
//! Persistence is the source of truth: a sender's request succeeds or fails
//! on the database write alone. Live fanout is best-effort. A consumer that
//! cannot keep up loses events instead of blocking anyone else, and clients
//! recover by re-fetching history over HTTP.
//!
//! # Error Handling
//!
//! - `Result<T, E>` for fallible operations
//! - `BackendError` in `backend::error` carries the HTTP mapping
/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
