/**
 * Realtime Hub
 *
 * In-memory fanout for live events. The hub owns a registry of active
 * connections, a per-user index, and a per-conversation subscription index.
 * All of that state lives inside a single task: every mutation and query
 * arrives as a `HubCommand` over one channel and is fully applied before
 * the next is considered, so an unregister can never race a broadcast into
 * a half-removed connection.
 *
 * # Delivery
 *
 * Each connection has a bounded outbound queue. A broadcast serializes the
 * event once and `try_send`s it to each subscriber; a full queue drops that
 * one recipient's copy instead of blocking the hub or the other recipients.
 * The durable record is written to the store before any event is published,
 * so a dropped event degrades liveness, never correctness.
 *
 * Handle methods are fire-and-forget and never return an error to the
 * publisher; presence queries fall back to offline answers when the hub
 * task is gone.
 */

use std::collections::{HashMap, HashSet};
use std::fmt;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::shared::event::LiveEvent;

/// Bound of each connection's outbound queue
///
/// Deep enough to absorb bursts; a consumer that stays behind this far is
/// considered slow and starts losing events.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Identity of one live connection
///
/// A user on several devices holds several of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A connection as the hub sees it: identity plus the outbound queue the
/// session's writer drains
#[derive(Debug)]
pub struct LiveConnection {
    pub id: ConnectionId,
    pub user_id: Uuid,
    pub outbound: mpsc::Sender<String>,
}

/// Commands applied by the hub task, in arrival order
enum HubCommand {
    Register(LiveConnection),
    Unregister(ConnectionId),
    Subscribe {
        connection_id: ConnectionId,
        conversation_id: Uuid,
    },
    Unsubscribe {
        connection_id: ConnectionId,
        conversation_id: Uuid,
    },
    BroadcastConversation {
        conversation_id: Uuid,
        payload: String,
    },
    BroadcastUser {
        user_id: Uuid,
        payload: String,
    },
    IsUserOnline {
        user_id: Uuid,
        reply: oneshot::Sender<bool>,
    },
    OnlineUsersAmong {
        user_ids: Vec<Uuid>,
        reply: oneshot::Sender<Vec<Uuid>>,
    },
    SubscriberCount {
        conversation_id: Uuid,
        reply: oneshot::Sender<usize>,
    },
}

struct ConnectionEntry {
    user_id: Uuid,
    outbound: mpsc::Sender<String>,
    subscriptions: HashSet<Uuid>,
}

/// Push an already-serialized event onto one connection's queue
fn deliver(connection_id: ConnectionId, entry: &ConnectionEntry, payload: &str) {
    match entry.outbound.try_send(payload.to_string()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            // Slow consumer; the event is dropped for this connection only.
            tracing::warn!(
                "[Hub] Outbound queue full for connection {}, dropping event",
                connection_id
            );
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!("[Hub] Connection {} outbound closed", connection_id);
        }
    }
}

fn serialize(event: &LiveEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!("[Hub] Failed to serialize event: {:?}", e);
            None
        }
    }
}

/// The hub task. Owns all registry state; consumed by `run`.
pub struct RealtimeHub {
    commands: mpsc::UnboundedReceiver<HubCommand>,
    connections: HashMap<ConnectionId, ConnectionEntry>,
    users: HashMap<Uuid, HashSet<ConnectionId>>,
    conversations: HashMap<Uuid, HashSet<ConnectionId>>,
}

impl RealtimeHub {
    /// Create the hub and the handle used to talk to it
    ///
    /// The hub does nothing until `run` is spawned.
    pub fn new() -> (Self, HubHandle) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let hub = Self {
            commands: commands_rx,
            connections: HashMap::new(),
            users: HashMap::new(),
            conversations: HashMap::new(),
        };
        (hub, HubHandle { commands: commands_tx })
    }

    /// Process commands until every handle is dropped
    pub async fn run(mut self) {
        tracing::info!("[Hub] Realtime hub started");
        while let Some(command) = self.commands.recv().await {
            self.apply(command);
        }
        tracing::info!("[Hub] Realtime hub stopped");
    }

    fn apply(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(connection) => self.register(connection),
            HubCommand::Unregister(connection_id) => self.unregister(connection_id),
            HubCommand::Subscribe {
                connection_id,
                conversation_id,
            } => self.subscribe(connection_id, conversation_id),
            HubCommand::Unsubscribe {
                connection_id,
                conversation_id,
            } => self.unsubscribe(connection_id, conversation_id),
            HubCommand::BroadcastConversation {
                conversation_id,
                payload,
            } => self.broadcast_conversation(conversation_id, &payload),
            HubCommand::BroadcastUser { user_id, payload } => {
                self.broadcast_user(user_id, &payload)
            }
            HubCommand::IsUserOnline { user_id, reply } => {
                let _ = reply.send(self.users.contains_key(&user_id));
            }
            HubCommand::OnlineUsersAmong { user_ids, reply } => {
                let online = user_ids
                    .into_iter()
                    .filter(|id| self.users.contains_key(id))
                    .collect();
                let _ = reply.send(online);
            }
            HubCommand::SubscriberCount {
                conversation_id,
                reply,
            } => {
                let count = self
                    .conversations
                    .get(&conversation_id)
                    .map_or(0, HashSet::len);
                let _ = reply.send(count);
            }
        }
    }

    fn register(&mut self, connection: LiveConnection) {
        let LiveConnection {
            id,
            user_id,
            outbound,
        } = connection;

        // First registration wins; a duplicate id keeps its existing entry.
        if self.connections.contains_key(&id) {
            return;
        }

        self.users.entry(user_id).or_default().insert(id);
        self.connections.insert(
            id,
            ConnectionEntry {
                user_id,
                outbound,
                subscriptions: HashSet::new(),
            },
        );
        tracing::debug!("[Hub] Registered connection {} for user {}", id, user_id);
    }

    fn unregister(&mut self, connection_id: ConnectionId) {
        let entry = match self.connections.remove(&connection_id) {
            Some(entry) => entry,
            // Unknown id: duplicate cleanup calls are a no-op.
            None => return,
        };

        if let Some(ids) = self.users.get_mut(&entry.user_id) {
            ids.remove(&connection_id);
            if ids.is_empty() {
                self.users.remove(&entry.user_id);
            }
        }

        for conversation_id in entry.subscriptions {
            if let Some(subscribers) = self.conversations.get_mut(&conversation_id) {
                subscribers.remove(&connection_id);
                if subscribers.is_empty() {
                    self.conversations.remove(&conversation_id);
                }
            }
        }

        // Dropping `entry.outbound` here closes the queue, which stops the
        // session's writer.
        tracing::debug!(
            "[Hub] Unregistered connection {} for user {}",
            connection_id,
            entry.user_id
        );
    }

    fn subscribe(&mut self, connection_id: ConnectionId, conversation_id: Uuid) {
        let entry = match self.connections.get_mut(&connection_id) {
            Some(entry) => entry,
            // The connection closed before the command was applied.
            None => return,
        };

        entry.subscriptions.insert(conversation_id);
        self.conversations
            .entry(conversation_id)
            .or_default()
            .insert(connection_id);
    }

    fn unsubscribe(&mut self, connection_id: ConnectionId, conversation_id: Uuid) {
        if let Some(entry) = self.connections.get_mut(&connection_id) {
            entry.subscriptions.remove(&conversation_id);
        }
        if let Some(subscribers) = self.conversations.get_mut(&conversation_id) {
            subscribers.remove(&connection_id);
            if subscribers.is_empty() {
                self.conversations.remove(&conversation_id);
            }
        }
    }

    fn broadcast_conversation(&self, conversation_id: Uuid, payload: &str) {
        let subscribers = match self.conversations.get(&conversation_id) {
            Some(subscribers) => subscribers,
            // Zero subscribers is a successful broadcast.
            None => return,
        };

        for connection_id in subscribers {
            if let Some(entry) = self.connections.get(connection_id) {
                deliver(*connection_id, entry, payload);
            }
        }
    }

    fn broadcast_user(&self, user_id: Uuid, payload: &str) {
        let connection_ids = match self.users.get(&user_id) {
            Some(ids) => ids,
            None => return,
        };

        for connection_id in connection_ids {
            if let Some(entry) = self.connections.get(connection_id) {
                deliver(*connection_id, entry, payload);
            }
        }
    }
}

/// Cheaply cloneable handle to the hub task
///
/// Mutations are fire-and-forget; sends to a hub that has stopped are
/// silently ignored, matching the best-effort delivery contract.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Attach a connection to the hub
    pub fn register(&self, connection: LiveConnection) {
        let _ = self.commands.send(HubCommand::Register(connection));
    }

    /// Detach a connection and drop all its subscriptions
    ///
    /// Safe to call more than once for the same id.
    pub fn unregister(&self, connection_id: ConnectionId) {
        let _ = self.commands.send(HubCommand::Unregister(connection_id));
    }

    /// Opt a connection in to a conversation's events
    ///
    /// Authorization happens in the messaging service before this is called;
    /// the hub applies the index edit without checks.
    pub fn subscribe(&self, connection_id: ConnectionId, conversation_id: Uuid) {
        let _ = self.commands.send(HubCommand::Subscribe {
            connection_id,
            conversation_id,
        });
    }

    /// Opt a connection out of a conversation's events
    pub fn unsubscribe(&self, connection_id: ConnectionId, conversation_id: Uuid) {
        let _ = self.commands.send(HubCommand::Unsubscribe {
            connection_id,
            conversation_id,
        });
    }

    /// Push an event to every connection subscribed to a conversation
    pub fn broadcast_to_conversation(&self, conversation_id: Uuid, event: &LiveEvent) {
        if let Some(payload) = serialize(event) {
            let _ = self.commands.send(HubCommand::BroadcastConversation {
                conversation_id,
                payload,
            });
        }
    }

    /// Push an event to every connection a user currently holds
    ///
    /// Used for cross-conversation signals such as new-conversation notices.
    pub fn broadcast_to_user(&self, user_id: Uuid, event: &LiveEvent) {
        if let Some(payload) = serialize(event) {
            let _ = self
                .commands
                .send(HubCommand::BroadcastUser { user_id, payload });
        }
    }

    /// Whether a user has at least one live connection
    pub async fn is_user_online(&self, user_id: Uuid) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(HubCommand::IsUserOnline { user_id, reply })
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Filter a set of users down to the ones currently online
    pub async fn online_users_among(&self, user_ids: &[Uuid]) -> Vec<Uuid> {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(HubCommand::OnlineUsersAmong {
                user_ids: user_ids.to_vec(),
                reply,
            })
            .is_err()
        {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// Number of connections subscribed to a conversation (for debugging)
    pub async fn subscriber_count(&self, conversation_id: Uuid) -> usize {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(HubCommand::SubscriberCount {
                conversation_id,
                reply,
            })
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
