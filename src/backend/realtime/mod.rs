//! Real-time Delivery Module
//!
//! This module provides live event delivery over WebSockets: a hub that
//! tracks connections and conversation subscriptions, and the per-socket
//! session glue.
//!
//! # Architecture
//!
//! The realtime module is organized into focused submodules:
//!
//! - **`hub`** - Connection registry, subscription index, fanout
//! - **`session`** - WebSocket upgrade handler and per-connection tasks
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs     - Module exports and documentation
//! ├── hub.rs     - RealtimeHub actor and HubHandle
//! └── session.rs - WebSocket session lifecycle
//! ```
//!
//! # Delivery Model
//!
//! Live events are transient signals layered over persisted state. The hub
//! never blocks on a slow consumer: each connection has a bounded queue and
//! an event that does not fit is dropped for that connection only. Clients
//! recover by re-fetching over HTTP, the durable record is already in the
//! store by the time an event is published.
//!
//! # Ordering
//!
//! The hub applies commands from a single stream in arrival order. Events
//! enqueued to one connection arrive in publish order; no ordering is
//! promised across different connections.

/// Connection registry and event fanout
pub mod hub;

/// WebSocket session lifecycle
pub mod session;

// Re-export commonly used types and functions
pub use hub::{ConnectionId, HubHandle, LiveConnection, RealtimeHub, OUTBOUND_QUEUE_CAPACITY};
pub use session::handle_live_upgrade;
