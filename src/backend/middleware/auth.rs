/**
 * Authentication Middleware
 *
 * This module provides middleware for protecting routes that require an
 * authenticated caller. Identity arrives as an `x-user-id` header carrying
 * the caller's UUID; the middleware validates it and attaches the caller to
 * request extensions for handlers to read.
 *
 * Credential checks and session issuance live in the identity service in
 * front of this server. By the time a request reaches this layer the caller
 * has already been authenticated, so the only enforcement here is that the
 * identity header is present and well-formed.
 */

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header carrying the authenticated caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user data extracted from the identity header
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Authentication middleware
///
/// This middleware:
/// 1. Reads the `x-user-id` header
/// 2. Parses it as a UUID
/// 3. Attaches the caller to request extensions for use in handlers
///
/// Returns 401 Unauthorized if the header is missing or malformed.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let header = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("[Auth] Missing {} header", USER_ID_HEADER);
            StatusCode::UNAUTHORIZED
        })?;

    let user_id = Uuid::parse_str(header).map_err(|e| {
        tracing::warn!("[Auth] Malformed {} header: {:?}", USER_ID_HEADER, e);
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user
///
/// This can be used as a parameter in handlers to automatically extract
/// the authenticated user from request extensions. Only valid on routes
/// behind `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
                StatusCode::UNAUTHORIZED
            })?;

        Ok(AuthUser(user))
    }
}
