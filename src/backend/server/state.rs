/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * `FromRef` trait for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container: the messaging service (which
 * owns the store and publishes to the hub) and the hub handle (used
 * directly by the WebSocket session layer). Both are cheap to clone;
 * cloning the state shares the underlying pool and hub task.
 *
 * # State Extraction
 *
 * The `FromRef` implementation lets messaging handlers take
 * `State(MessagingService)` without seeing the rest of the state; the
 * session layer takes the whole `AppState` since it needs both halves.
 */

use axum::extract::FromRef;

use crate::backend::messaging::MessagingService;
use crate::backend::realtime::HubHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Messaging service: authorization, persistence, event publication
    pub service: MessagingService,

    /// Handle to the realtime hub task
    ///
    /// The session layer registers connections and edits subscriptions
    /// through this; everything else publishes via the service.
    pub hub: HubHandle,
}

/// Allows handlers to extract the messaging service directly
impl FromRef<AppState> for MessagingService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.service.clone()
    }
}
