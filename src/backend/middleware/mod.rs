//! Middleware Module
//!
//! This module contains all HTTP middleware for the backend server.
//! Middleware functions are used to process requests before they reach
//! handlers, such as authentication, logging, rate limiting, etc.
//!
//! # Architecture
//!
//! The middleware module currently provides:
//!
//! - **`auth`** - Authentication middleware for protecting routes
//!
//! # Example
//!
//! ```rust,no_run
//! use ripple::backend::middleware::auth_middleware;
//! use axum::{middleware, Router};
//!
//! let protected: Router<()> = Router::new()
//!     .layer(middleware::from_fn(auth_middleware));
//! ```

pub mod auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser, USER_ID_HEADER};
