/**
 * Server Initialization
 *
 * Wires the backend together: connection pool, conversation store, realtime
 * hub, messaging service, router.
 *
 * # Wiring Order
 *
 * The hub is spawned before the service exists and its handle is injected
 * into the service's constructor. The service never owns the hub task, it
 * only publishes through the handle; the session layer holds the same
 * handle for registration and subscriptions.
 */

use axum::Router;
use sqlx::SqlitePool;

use crate::backend::messaging::{ConversationStore, MessagingService};
use crate::backend::realtime::RealtimeHub;
use crate::backend::routes::create_router;
use crate::backend::server::state::AppState;

/// Build the application router over an existing pool
///
/// Applies the schema, spawns the hub task, and constructs the service and
/// router. Tests call this with an in-memory pool; `main` passes the pool
/// built from configuration.
pub async fn create_app(pool: SqlitePool) -> Result<Router, sqlx::Error> {
    let store = ConversationStore::new(pool);
    store.init_schema().await?;
    tracing::info!("[Server] Schema applied");

    let (hub, hub_handle) = RealtimeHub::new();
    tokio::spawn(hub.run());

    let service = MessagingService::new(store, hub_handle.clone());

    let state = AppState {
        service,
        hub: hub_handle,
    };

    tracing::info!("[Server] Backend initialized");
    Ok(create_router(state))
}
