//! Messaging Module
//!
//! Durable conversation and message handling: the store over SQLite, the
//! service that owns authorization and event publication, and the HTTP
//! handlers.
//!
//! # Module Structure
//!
//! ```text
//! messaging/
//! ├── mod.rs      - Module exports and documentation
//! ├── store.rs    - ConversationStore (SQLite, source of truth)
//! ├── service.rs  - MessagingService (authorization + store/hub orchestration)
//! ├── handlers.rs - HTTP handlers
//! └── schema.sql  - Embedded schema, applied at startup
//! ```

pub mod handlers;
pub mod service;
pub mod store;

pub use service::MessagingService;
pub use store::ConversationStore;
