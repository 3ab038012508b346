//! Chats and their messages.
//!
//! Any member may list chats and start one. A chat itself can only be read,
//! changed or deleted by its participants or by staff. Messages are not a
//! resource of their own; they are always reached through their chat, and
//! only by its participants.

use super::{RecordId, apply_patch, create, delete, list};
use crate::auth::SessionUser;
use crate::chat::{ensure_participant, load_chat, post_message};
use crate::server::state::AppState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use eventmingle_core::entities::{Chat, ChatPatch, Message};
use eventmingle_core::{ListQuery, Record, SortOrder};
use eventmingle_web::{AppError, JsonBody, WebResult};
use serde::Deserialize;
use uuid::Uuid;

/// Message payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    /// Message text.
    pub content: String,
}

/// CRUD plus `/:id/messages`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<Chat>).post(create::<Chat>))
        .route("/:id", get(fetch).put(update).delete(remove))
        .route("/:id/messages", get(list_messages).post(create_message))
}

/// Load a chat the caller may manage: a participant or staff.
async fn managed_chat(state: &AppState, session: &SessionUser, chat_id: Uuid) -> WebResult<Chat> {
    let chat = load_chat(state, chat_id).await?;
    if !session.is_staff() {
        ensure_participant(&chat, session)?;
    }
    Ok(chat)
}

/// `GET /api/chats/:id`.
///
/// # Errors
///
/// 401 without a session, 403 non-participant, 404 unknown chat, 500 store failure.
pub async fn fetch(
    State(state): State<AppState>,
    session: SessionUser,
    RecordId(chat_id): RecordId,
) -> WebResult<Json<Chat>> {
    managed_chat(&state, &session, chat_id).await.map(Json)
}

/// `PUT /api/chats/:id` - rename or replace the participant list.
///
/// # Errors
///
/// 400 invalid patch, 401 without a session, 403 non-participant,
/// 404 unknown chat, 500 store failure.
pub async fn update(
    State(state): State<AppState>,
    session: SessionUser,
    RecordId(chat_id): RecordId,
    JsonBody(patch): JsonBody<ChatPatch>,
) -> WebResult<Json<Chat>> {
    managed_chat(&state, &session, chat_id).await?;
    apply_patch::<Chat>(&state, chat_id, patch).await.map(Json)
}

/// `DELETE /api/chats/:id`.
///
/// # Errors
///
/// 401 without a session, 403 non-participant, 404 unknown chat, 500 store failure.
pub async fn remove(
    State(state): State<AppState>,
    session: SessionUser,
    RecordId(chat_id): RecordId,
) -> WebResult<Json<Chat>> {
    managed_chat(&state, &session, chat_id).await?;
    delete::<Chat>(&state, chat_id).await.map(Json)
}

/// `GET /api/chats/:id/messages` - oldest first.
///
/// # Errors
///
/// 401 without a session, 403 non-participant, 404 unknown chat, 500 store failure.
pub async fn list_messages(
    State(state): State<AppState>,
    session: SessionUser,
    RecordId(chat_id): RecordId,
) -> WebResult<Json<Vec<Message>>> {
    let chat = load_chat(&state, chat_id).await?;
    ensure_participant(&chat, &session)?;

    let messages = state
        .collection::<Message>()
        .list(
            &ListQuery::all()
                .filter("chat_id", chat_id)
                .order(SortOrder::OldestFirst),
        )
        .await
        .map_err(|e| AppError::store("list", Message::NAME, e))?;
    Ok(Json(messages))
}

/// `POST /api/chats/:id/messages` - store and relay to the chat's sockets.
///
/// # Errors
///
/// 400 invalid content, 401 without a session, 403 non-participant,
/// 404 unknown chat, 500 store failure.
pub async fn create_message(
    State(state): State<AppState>,
    session: SessionUser,
    RecordId(chat_id): RecordId,
    JsonBody(request): JsonBody<PostMessageRequest>,
) -> WebResult<(StatusCode, Json<Message>)> {
    let message = post_message(&state, chat_id, &session, request.content, None).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
