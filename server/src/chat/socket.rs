//! `GET /ws/chat?token=<jwt>`: the chat socket.
//!
//! ```text
//! Client          socket tasks                     ChatHub
//!   │                  │                              │
//!   ├─ join ──────────>│ recv task ── subscribe ─────>│
//!   │<─ joined ────────┤                              │
//!   │                  │  forwarder <── RoomFrame ────┤
//!   │<─ message ───────┤ send task <── outbox         │
//!   ├─ message ───────>│ recv task ── persist+publish>│
//!   │<─ sent ──────────┤                              │
//! ```
//!
//! Each connection runs a send task draining an outbox and a receive task
//! handling client frames; whichever finishes first aborts the other. Every
//! joined room gets a forwarder task that copies room frames into the outbox,
//! skipping frames this connection sent itself. Forwarders are shut down
//! before the hub is pruned, so a closed socket leaves no room behind.

use super::{ClientFrame, ServerFrame, ensure_participant, load_chat, post_message};
use crate::auth::middleware::authenticate;
use crate::auth::{AuthError, SessionUser};
use crate::metrics;
use crate::server::state::AppState;
use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    http::HeaderMap,
    response::Response,
};
use eventmingle_web::{AppError, BearerToken, WebResult};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast::error::RecvError, mpsc};
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Frames queued per connection before room forwarders wait.
const OUTBOX_CAPACITY: usize = 64;

/// Query string of the socket route.
#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    /// Session token. Browsers cannot set headers on a WebSocket handshake.
    pub token: Option<String>,
}

/// Authenticate, then upgrade.
///
/// The token comes from `?token=`, falling back to the `Authorization`
/// header or session cookie.
///
/// # Errors
///
/// 401 without a valid token; 400 when the request is not a WebSocket
/// handshake.
pub async fn chat_socket(
    State(state): State<AppState>,
    Query(params): Query<SocketParams>,
    headers: HeaderMap,
    ws: Option<WebSocketUpgrade>,
) -> WebResult<Response> {
    let token = params
        .token
        .filter(|token| !token.is_empty())
        .or_else(|| BearerToken::from_headers(&headers).map(|bearer| bearer.0))
        .ok_or(AuthError::MissingToken)?;
    let session = authenticate(&state, &token).await?;

    let ws = ws.ok_or_else(|| AppError::bad_request("Expected a WebSocket upgrade request"))?;
    Ok(ws.on_upgrade(move |socket| run_connection(socket, state, session)))
}

async fn run_connection(socket: WebSocket, state: AppState, session: SessionUser) {
    let connection_id = Uuid::new_v4();
    let user_id = session.id();
    let hub = state.chat.clone();
    info!(%connection_id, %user_id, "Chat socket opened");
    metrics::chat_connection_opened();

    let (mut sink, mut stream) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::channel::<ServerFrame>(OUTBOX_CAPACITY);
    let forwarders = Arc::new(Mutex::new(JoinSet::new()));

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbox_rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Failed to serialize chat frame");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
        debug!("Chat send task terminated");
    });

    let task_forwarders = Arc::clone(&forwarders);
    let mut recv_task = tokio::spawn(async move {
        let mut connection = Connection {
            id: connection_id,
            session,
            state,
            outbox,
            rooms: HashMap::new(),
            forwarders: task_forwarders,
        };

        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                WsMessage::Text(text) => connection.handle_text(&text).await,
                WsMessage::Binary(_) => {
                    connection
                        .reply(ServerFrame::Error {
                            message: "Binary frames are not supported".into(),
                        })
                        .await;
                }
                WsMessage::Close(_) => break,
                // Axum answers protocol pings itself.
                WsMessage::Ping(_) | WsMessage::Pong(_) => {}
            }
        }
        debug!("Chat receive task terminated");
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = (&mut recv_task) => {
            send_task.abort();
            let _ = send_task.await;
        }
    }
    // Room receivers must be gone before pruning.
    forwarders.lock().await.shutdown().await;

    metrics::chat_connection_closed();
    hub.prune().await;
    info!(%connection_id, %user_id, "Chat socket closed");
}

/// Per-connection state owned by the receive task.
struct Connection {
    id: Uuid,
    session: SessionUser,
    state: AppState,
    outbox: mpsc::Sender<ServerFrame>,
    rooms: HashMap<Uuid, AbortHandle>,
    forwarders: Arc<Mutex<JoinSet<()>>>,
}

impl Connection {
    async fn reply(&self, frame: ServerFrame) {
        // Fails only once the send task is gone; the loop ends right after.
        let _ = self.outbox.send(frame).await;
    }

    async fn handle_text(&mut self, text: &str) {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(connection_id = %self.id, error = %e, "Invalid chat frame");
                self.reply(ServerFrame::Error {
                    message: format!("Invalid frame: {e}"),
                })
                .await;
                return;
            }
        };

        match frame {
            ClientFrame::Join { room } => self.join(room).await,
            ClientFrame::Leave { room } => {
                if let Some(forwarder) = self.rooms.remove(&room) {
                    forwarder.abort();
                    let mut forwarders = self.forwarders.lock().await;
                    while forwarders.try_join_next().is_some() {}
                }
                self.reply(ServerFrame::Left { room }).await;
            }
            ClientFrame::Message { room, content } => {
                let frame =
                    match post_message(&self.state, room, &self.session, content, Some(self.id)).await {
                        Ok(message) => ServerFrame::Sent { message },
                        Err(err) => ServerFrame::Error {
                            message: err.message().to_string(),
                        },
                    };
                self.reply(frame).await;
            }
            ClientFrame::Ping => self.reply(ServerFrame::Pong).await,
        }
    }

    async fn join(&mut self, room: Uuid) {
        if self.rooms.contains_key(&room) {
            self.reply(ServerFrame::Joined { room }).await;
            return;
        }

        let allowed = match load_chat(&self.state, room).await {
            Ok(chat) => ensure_participant(&chat, &self.session),
            Err(err) => Err(err),
        };
        if let Err(err) = allowed {
            self.reply(ServerFrame::Error {
                message: err.message().to_string(),
            })
            .await;
            return;
        }

        let mut rx = self.state.chat.subscribe(room).await;
        // Confirm before forwarding so `joined` precedes the room's traffic.
        self.reply(ServerFrame::Joined { room }).await;

        let connection_id = self.id;
        let outbox = self.outbox.clone();
        let forwarder = self.forwarders.lock().await.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(frame) if frame.origin == Some(connection_id) => {}
                    Ok(frame) => {
                        let message = ServerFrame::Message {
                            room,
                            message: frame.message,
                        };
                        if outbox.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%connection_id, %room, skipped, "Chat socket lagging, frames skipped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        self.rooms.insert(room, forwarder);
        debug!(connection_id = %self.id, %room, "Joined chat room");
    }
}
