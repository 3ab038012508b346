//! Chat relay.
//!
//! Rooms are chat ids. Messages posted over REST or over the socket are
//! persisted first and then fanned out to every socket that joined the room
//! (except the connection that sent it, which gets a `sent` acknowledgement
//! instead).
//!
//! # Frame Protocol
//!
//! **Client → Server:**
//! ```json
//! {"type": "join", "room": "<chat id>"}
//! {"type": "leave", "room": "<chat id>"}
//! {"type": "message", "room": "<chat id>", "content": "Hello"}
//! {"type": "ping"}
//! ```
//!
//! **Server → Client:**
//! ```json
//! {"type": "joined", "room": "<chat id>"}
//! {"type": "left", "room": "<chat id>"}
//! {"type": "message", "room": "<chat id>", "message": {...}}
//! {"type": "sent", "message": {...}}
//! {"type": "error", "message": "Not a participant of this chat"}
//! {"type": "pong"}
//! ```

pub mod hub;
pub mod socket;

pub use hub::{ChatHub, RoomFrame};

use crate::auth::SessionUser;
use crate::metrics;
use crate::server::state::AppState;
use eventmingle_core::Record;
use eventmingle_core::entities::{Chat, Message as ChatMessage, MessageDraft};
use eventmingle_web::{AppError, WebResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frame sent by a socket client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Start receiving a room's messages.
    Join {
        /// Chat id.
        room: Uuid,
    },
    /// Stop receiving a room's messages.
    Leave {
        /// Chat id.
        room: Uuid,
    },
    /// Post a message.
    Message {
        /// Chat id.
        room: Uuid,
        /// Message text.
        content: String,
    },
    /// Keep-alive.
    Ping,
}

/// Frame sent to a socket client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Join confirmed.
    Joined {
        /// Chat id.
        room: Uuid,
    },
    /// Leave confirmed.
    Left {
        /// Chat id.
        room: Uuid,
    },
    /// Someone else posted in a joined room.
    Message {
        /// Chat id.
        room: Uuid,
        /// The stored message.
        message: ChatMessage,
    },
    /// Own message stored.
    Sent {
        /// The stored message.
        message: ChatMessage,
    },
    /// A frame could not be handled. The connection stays open.
    Error {
        /// Human-readable reason.
        message: String,
    },
    /// Keep-alive answer.
    Pong,
}

/// Load a chat or fail with 404.
///
/// # Errors
///
/// 404 when the chat does not exist, 500 when the store fails.
pub async fn load_chat(state: &AppState, chat_id: Uuid) -> WebResult<Chat> {
    state
        .collection::<Chat>()
        .get(chat_id)
        .await
        .map_err(|e| AppError::store("fetch", Chat::NAME, e))?
        .ok_or_else(|| AppError::not_found(Chat::NAME, chat_id))
}

/// Fail with 403 unless `session` takes part in `chat`.
///
/// # Errors
///
/// 403 for non-participants.
pub fn ensure_participant(chat: &Chat, session: &SessionUser) -> WebResult<()> {
    if chat.has_participant(session.id()) {
        Ok(())
    } else {
        Err(AppError::forbidden("Not a participant of this chat"))
    }
}

/// Persist a message from `sender` and relay it to the room.
///
/// `origin` is the sending socket's connection id; that connection is
/// skipped during fan-out. REST posts pass `None`.
///
/// # Errors
///
/// 404 unknown chat, 403 non-participant, 400 invalid content, 500 store failure.
pub async fn post_message(
    state: &AppState,
    chat_id: Uuid,
    sender: &SessionUser,
    content: String,
    origin: Option<Uuid>,
) -> WebResult<ChatMessage> {
    let chat = load_chat(state, chat_id).await?;
    ensure_participant(&chat, sender)?;

    let message = state
        .collection::<ChatMessage>()
        .create(MessageDraft {
            chat_id,
            sender_id: sender.id(),
            content,
        })
        .await
        .map_err(|e| AppError::write("create", ChatMessage::NAME, e))?;
    metrics::record_chat_message();

    let delivered = state.chat.publish(origin, message.clone()).await;
    tracing::debug!(%chat_id, message_id = %message.id, delivered, "Chat message relayed");
    Ok(message)
}
