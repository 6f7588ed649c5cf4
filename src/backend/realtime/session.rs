/**
 * Connection Session
 *
 * One WebSocket connection is one session is one hub registration. The
 * upgrade handler authenticates, then the session splits the socket into a
 * reader and a writer: the writer drains the hub-fed outbound queue and
 * owns keepalive pings, the reader parses client frames. Whichever side
 * finishes first tears the other down, and the session unregisters from
 * the hub exactly once on the way out.
 *
 * A reconnect is a brand-new session; subscriptions do not survive it, the
 * client re-subscribes and backfills over HTTP.
 */

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use uuid::Uuid;

use crate::backend::middleware::AuthUser;
use crate::backend::realtime::hub::{ConnectionId, LiveConnection, OUTBOUND_QUEUE_CAPACITY};
use crate::backend::server::state::AppState;
use crate::shared::event::{ClientFrame, LiveEvent};

/// Interval between server keepalive pings on an idle connection
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Upgrade handler for `GET /live`
pub async fn handle_live_upgrade(
    ws: WebSocketUpgrade,
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, user.user_id, state))
}

async fn run_session(socket: WebSocket, user_id: Uuid, state: AppState) {
    let connection_id = ConnectionId::new();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

    state.hub.register(LiveConnection {
        id: connection_id,
        user_id,
        outbound: outbound_tx,
    });
    tracing::info!(
        "[Session] Connection {} opened for user {}",
        connection_id,
        user_id
    );

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, outbound_rx));
    let mut reader = tokio::spawn(read_loop(stream, connection_id, user_id, state.clone()));

    // First exit wins; the other half is torn down.
    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    state.hub.unregister(connection_id);
    tracing::info!(
        "[Session] Connection {} closed for user {}",
        connection_id,
        user_id
    );
}

/// Drain the outbound queue into the socket, pinging when idle
async fn write_loop(
    mut sink: SplitSink<WebSocket, WsMessage>,
    mut outbound: mpsc::Receiver<String>,
) {
    let mut keepalive = interval(KEEPALIVE_INTERVAL);
    // The first tick completes immediately; swallow it.
    keepalive.tick().await;

    loop {
        tokio::select! {
            maybe_payload = outbound.recv() => match maybe_payload {
                Some(payload) => {
                    if sink.send(WsMessage::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                None => {
                    // Queue closed by unregister.
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
            },
            _ = keepalive.tick() => {
                if sink.send(WsMessage::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Parse frames from the client until the socket closes
async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    connection_id: ConnectionId,
    user_id: Uuid,
    state: AppState,
) {
    while let Some(result) = stream.next().await {
        match result {
            Ok(WsMessage::Text(text)) => {
                handle_client_frame(text.as_str(), connection_id, user_id, &state).await;
            }
            Ok(WsMessage::Close(_)) => break,
            // Pings are answered by the socket layer; pongs need no action.
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    "[Session] Connection {} read error: {:?}",
                    connection_id,
                    e
                );
                break;
            }
        }
    }
}

/// Apply one client frame
///
/// A subscribe is honored only for conversations the user participates in;
/// everything the frame asks for is live-delivery state, nothing durable.
async fn handle_client_frame(
    raw: &str,
    connection_id: ConnectionId,
    user_id: Uuid,
    state: &AppState,
) {
    let frame: ClientFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(
                "[Session] Ignoring malformed frame from connection {}: {:?}",
                connection_id,
                e
            );
            return;
        }
    };

    match frame {
        ClientFrame::Subscribe { conversation_id } => {
            match state
                .service
                .authorize_subscription(user_id, conversation_id)
                .await
            {
                Ok(()) => state.hub.subscribe(connection_id, conversation_id),
                Err(e) => {
                    tracing::warn!(
                        "[Session] Subscription to {} denied for user {}: {}",
                        conversation_id,
                        user_id,
                        e
                    );
                }
            }
        }
        ClientFrame::Unsubscribe { conversation_id } => {
            state.hub.unsubscribe(connection_id, conversation_id);
        }
        ClientFrame::Typing { conversation_id } => {
            state
                .hub
                .broadcast_to_conversation(conversation_id, &LiveEvent::typing(conversation_id, user_id));
        }
        ClientFrame::StopTyping { conversation_id } => {
            state.hub.broadcast_to_conversation(
                conversation_id,
                &LiveEvent::stop_typing(conversation_id, user_id),
            );
        }
    }
}
