//! Raw RSVP records at `/api/event_responses`.
//!
//! Reads are open to any member. Writes are limited to the RSVP's owner;
//! staff may write any of them.

use super::{RecordId, apply_patch, delete, fetch, insert, list, load};
use crate::auth::SessionUser;
use crate::server::state::AppState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use eventmingle_core::entities::{EventResponse, EventResponseDraft, EventResponsePatch};
use eventmingle_web::{AppError, JsonBody, WebResult};
use uuid::Uuid;

/// RSVP routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<EventResponse>).post(create))
        .route("/:id", get(fetch::<EventResponse>).put(update).delete(remove))
}

fn ensure_owner(session: &SessionUser, user_id: Uuid) -> WebResult<()> {
    if user_id == session.id() || session.is_staff() {
        Ok(())
    } else {
        Err(AppError::forbidden("You can only manage your own responses"))
    }
}

/// `POST /api/event_responses`.
///
/// # Errors
///
/// 400 invalid draft or duplicate RSVP, 401 without a session,
/// 403 `user_id` of someone else, 500 store failure.
pub async fn create(
    State(state): State<AppState>,
    session: SessionUser,
    JsonBody(draft): JsonBody<EventResponseDraft>,
) -> WebResult<(StatusCode, Json<EventResponse>)> {
    ensure_owner(&session, draft.user_id)?;
    let response = insert::<EventResponse>(&state, Some(&session), draft).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `PUT /api/event_responses/:id`.
///
/// # Errors
///
/// 400 invalid patch, 401 without a session, 403 someone else's RSVP,
/// 404 unknown id, 500 store failure.
pub async fn update(
    State(state): State<AppState>,
    session: SessionUser,
    RecordId(id): RecordId,
    JsonBody(patch): JsonBody<EventResponsePatch>,
) -> WebResult<Json<EventResponse>> {
    let response = load::<EventResponse>(&state, id).await?;
    ensure_owner(&session, response.user_id)?;
    apply_patch::<EventResponse>(&state, id, patch).await.map(Json)
}

/// `DELETE /api/event_responses/:id`.
///
/// # Errors
///
/// 401 without a session, 403 someone else's RSVP, 404 unknown id,
/// 500 store failure.
pub async fn remove(
    State(state): State<AppState>,
    session: SessionUser,
    RecordId(id): RecordId,
) -> WebResult<Json<EventResponse>> {
    let response = load::<EventResponse>(&state, id).await?;
    ensure_owner(&session, response.user_id)?;
    delete::<EventResponse>(&state, id).await.map(Json)
}
