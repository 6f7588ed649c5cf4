//! Shared test fixtures
//!
//! Every suite runs against an in-memory SQLite database, so tests are
//! hermetic and parallel-safe. The fixture wires the same way the server
//! does: schema, hub task, service with the hub handle injected.

// Each suite links its own copy; not every suite uses every helper.
#![allow(dead_code)]

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use uuid::Uuid;

use ripple::backend::messaging::{ConversationStore, MessagingService};
use ripple::backend::realtime::{ConnectionId, HubHandle, LiveConnection, RealtimeHub};

/// Create an in-memory database with the schema applied
///
/// A single connection keeps every query on the same in-memory database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    ConversationStore::new(pool.clone())
        .init_schema()
        .await
        .expect("failed to apply schema");

    pool
}

/// A fully wired backend over an in-memory database
pub struct TestBackend {
    pub store: ConversationStore,
    pub service: MessagingService,
    pub hub: HubHandle,
}

/// Build a store, a running hub, and a service, wired like the server
pub async fn test_backend() -> TestBackend {
    let pool = memory_pool().await;
    let store = ConversationStore::new(pool);

    let (hub, handle) = RealtimeHub::new();
    tokio::spawn(hub.run());

    let service = MessagingService::new(store.clone(), handle.clone());

    TestBackend {
        store,
        service,
        hub: handle,
    }
}

/// Register a live connection for a user and return its event receiver
///
/// The receiver sees exactly what the session writer would drain.
pub fn connect_user(
    hub: &HubHandle,
    user_id: Uuid,
    capacity: usize,
) -> (ConnectionId, mpsc::Receiver<String>) {
    let id = ConnectionId::new();
    let (tx, rx) = mpsc::channel(capacity);
    hub.register(LiveConnection {
        id,
        user_id,
        outbound: tx,
    });
    (id, rx)
}

/// Wait until the hub has applied everything sent before this call
///
/// Presence queries travel the same command stream as mutations, so a
/// completed query doubles as an ordering barrier.
pub async fn hub_barrier(hub: &HubHandle) {
    let _ = hub.is_user_online(Uuid::nil()).await;
}
