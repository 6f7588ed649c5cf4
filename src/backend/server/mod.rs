//! Server Module
//!
//! Initialization and configuration for the Axum HTTP server.
//!
//! # Architecture
//!
//! The server module is organized into focused submodules:
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Environment configuration and pool construction
//! - **`init`** - Backend wiring and app creation
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - ServerConfig and SQLite pool
//! └── init.rs   - create_app wiring
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration**: `ServerConfig::from_env` + `build_pool`
//! 2. **Schema**: the store applies its embedded schema idempotently
//! 3. **Hub**: the realtime hub task is spawned first
//! 4. **Service**: constructed with the hub handle injected
//! 5. **Router**: all routes share one `AppState`

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::{build_pool, ServerConfig};
pub use init::create_app;
pub use state::AppState;
