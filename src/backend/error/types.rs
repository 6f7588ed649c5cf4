/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Authorization Errors
 *
 * `NotParticipant` is raised when a caller targets a conversation they do not
 * belong to (or that does not exist). `Unauthorized` is raised when a caller
 * belongs to the conversation but lacks permission for the specific operation,
 * such as editing someone else's message.
 *
 * ## Request Errors
 *
 * `Validation` covers malformed input: empty message bodies, a direct
 * conversation without exactly one other participant, and similar.
 * `NotFound` covers lookups of resources that do not exist.
 *
 * ## Infrastructure Errors
 *
 * `Database` wraps errors from the persistence layer and `Serialization`
 * wraps JSON errors. Both map to 500 responses and never leak internal
 * detail to the client.
 */

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

/// Backend-specific error types
///
/// This enum represents all possible errors that can occur in the backend.
/// Each variant can be converted to an HTTP response.
///
/// # Usage
///
/// ```rust
/// use ripple::backend::error::BackendError;
///
/// let err = BackendError::validation("message needs content or media");
/// assert_eq!(err.status_code().as_u16(), 400);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Caller is not an active participant of the conversation
    ///
    /// Also raised when the conversation does not exist at all. Both cases
    /// produce the same response so that membership checks cannot be used
    /// to probe which conversation ids exist.
    #[error("not a participant of conversation {conversation_id}")]
    NotParticipant {
        /// Conversation the caller tried to access
        conversation_id: Uuid,
    },

    /// Caller lacks permission for this operation
    ///
    /// Raised when a participant attempts something reserved for another
    /// user, such as editing a message they did not send.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// A requested resource does not exist
    #[error("{resource} not found")]
    NotFound {
        /// Name of the missing resource, e.g. "message"
        resource: String,
    },

    /// Request input failed validation
    #[error("validation error: {message}")]
    Validation {
        /// Human-readable error message
        message: String,
    },

    /// Error from the persistence layer
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a not-participant error for a conversation
    pub fn not_participant(conversation_id: Uuid) -> Self {
        Self::NotParticipant { conversation_id }
    }

    /// Create a new unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    ///
    /// # Arguments
    ///
    /// * `resource` - Name of the missing resource, e.g. "conversation"
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `NotParticipant` - 404 Not Found (indistinguishable from a missing conversation)
    /// - `Unauthorized` - 403 Forbidden
    /// - `NotFound` - 404 Not Found
    /// - `Validation` - 400 Bad Request
    /// - `Database` - 500 Internal Server Error (404 for a missing row)
    /// - `Serialization` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotParticipant { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message used in the HTTP response body
    ///
    /// Infrastructure errors are reduced to a generic message; the full
    /// error is logged server-side, never sent to the client.
    pub fn message(&self) -> String {
        match self {
            // Same body as a missing conversation; membership must not
            // confirm existence.
            Self::NotParticipant { .. } => "conversation not found".to_string(),
            Self::Unauthorized { message } => message.clone(),
            Self::NotFound { resource } => format!("{} not found", resource),
            Self::Validation { message } => message.clone(),
            Self::Database(sqlx::Error::RowNotFound) => "not found".to_string(),
            Self::Database(_) => "database error".to_string(),
            Self::Serialization(_) => "serialization error".to_string(),
        }
    }
}
