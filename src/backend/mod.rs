//! Backend Module
//!
//! This module contains all server-side code for the messaging backend:
//! an Axum HTTP server, the durable conversation store, and live event
//! delivery over WebSockets.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`messaging`** - Conversation store, messaging service, HTTP handlers
//! - **`realtime`** - Connection hub and WebSocket sessions
//! - **`middleware`** - Upstream-identity extraction
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs       - Module exports and documentation
//! ├── main.rs      - ripple-server entry point
//! ├── server/      - Initialization and state
//! ├── routes/      - Route configuration
//! ├── messaging/   - Store, service, handlers
//! ├── realtime/    - Hub and sessions
//! ├── middleware/  - Identity middleware
//! └── error/       - Error types
//! ```
//!
//! # Request Flow
//!
//! An HTTP request passes through the identity middleware, reaches a thin
//! handler, and lands in `MessagingService`, the single place
//! authorization happens. The service persists through
//! `ConversationStore`, and on success publishes a live event through the
//! hub handle. WebSocket sessions bypass the service for transient frames
//! (typing) and use it only to authorize subscriptions.
//!
//! # Error Handling
//!
//! Fallible operations return `Result<_, BackendError>`; handlers return
//! the error directly and Axum converts it to a JSON response via
//! `IntoResponse`. Hub publishes never produce errors toward the caller.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Durable messaging: store, service, handlers
pub mod messaging;

/// Live event delivery
pub mod realtime;

/// Backend error types
pub mod error;

/// Middleware for request processing
pub mod middleware;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::create_app;
