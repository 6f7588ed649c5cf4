/**
 * Router Configuration
 *
 * Builds the Axum router: REST endpoints under `/api`, the WebSocket
 * upgrade at `/live`, and the shared layers.
 *
 * # Layers
 *
 * Every route sits behind the identity middleware; a request without a
 * valid `x-user-id` header is rejected with 401 before any handler runs.
 * `TraceLayer` logs request/response pairs and the CORS layer is
 * permissive, cross-origin policy belongs to the gateway in front.
 */

use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::messaging::handlers;
use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::handle_live_upgrade;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/conversations",
            post(handlers::create_conversation).get(handlers::list_conversations),
        )
        .route("/api/conversations/{id}", get(handlers::get_conversation))
        .route(
            "/api/conversations/{id}/leave",
            post(handlers::leave_conversation),
        )
        .route(
            "/api/conversations/direct/{user_id}",
            post(handlers::get_or_create_direct),
        )
        .route(
            "/api/conversations/{id}/messages",
            post(handlers::send_message).get(handlers::list_messages),
        )
        .route("/api/conversations/{id}/read", post(handlers::mark_read))
        // The static segment must be routed explicitly next to the
        // parameterized message routes.
        .route("/api/messages/unread", get(handlers::unread_count))
        .route(
            "/api/messages/{id}",
            put(handlers::edit_message).delete(handlers::delete_message),
        )
        .route("/live", get(handle_live_upgrade))
        .layer(middleware::from_fn(auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
