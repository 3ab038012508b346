//! Event endpoints beyond plain CRUD.
//!
//! - `POST /api/events/:id/responses` - RSVP as the current user
//! - `GET /api/events/:id/responses` - all RSVPs of an event
//! - `GET /api/events/:id/calendar` - iCalendar export

use super::{RecordId, load, resource_routes};
use crate::auth::SessionUser;
use crate::calendar;
use crate::metrics;
use crate::server::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use eventmingle_core::entities::{Event, EventResponse, EventResponseDraft, RsvpStatus};
use eventmingle_core::{Filter, ListQuery, Record, StoreError, WriteError};
use eventmingle_web::{AppError, JsonBody, WebResult};
use serde::Deserialize;

/// RSVP payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RsvpRequest {
    /// The answer.
    pub status: RsvpStatus,
}

/// CRUD plus the event sub-routes.
pub fn routes() -> Router<AppState> {
    resource_routes::<Event>()
        .route("/:id/responses", get(list_responses).post(respond))
        .route("/:id/calendar", get(calendar_export))
}

fn already_responded() -> AppError {
    AppError::bad_request("You have already responded to this event")
}

/// RSVP to an event.
///
/// # Endpoint
///
/// ```text
/// POST /api/events/:id/responses
/// Authorization: Bearer <token>
///
/// {"status": "going"}
/// ```
///
/// # Response
///
/// `201 Created` with the stored response.
///
/// - `404 Not Found`: unknown event
/// - `400 Bad Request`: the user already responded
pub async fn respond(
    State(state): State<AppState>,
    session: SessionUser,
    RecordId(event_id): RecordId,
    JsonBody(request): JsonBody<RsvpRequest>,
) -> WebResult<(StatusCode, Json<EventResponse>)> {
    load::<Event>(&state, event_id).await?;

    let responses = state.collection::<EventResponse>();
    let mine = [
        Filter::eq("event_id", event_id),
        Filter::eq("user_id", session.id()),
    ];
    if responses
        .exists(&mine)
        .await
        .map_err(|e| AppError::store("fetch", EventResponse::NAME, e))?
    {
        return Err(already_responded());
    }

    let draft = EventResponseDraft {
        event_id,
        user_id: session.id(),
        status: request.status,
    };
    let response = responses.create(draft).await.map_err(|err| match err {
        // Lost a race with a concurrent RSVP.
        WriteError::Store(StoreError::Conflict { .. }) => already_responded(),
        other => AppError::write("create", EventResponse::NAME, other),
    })?;

    tracing::info!(%event_id, user_id = %session.id(), status = request.status.as_str(), "RSVP recorded");
    metrics::record_rsvp(request.status.as_str());
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/events/:id/responses` (signed-in users).
///
/// # Errors
///
/// 401 without a session, 404 unknown event, 500 store failure.
pub async fn list_responses(
    State(state): State<AppState>,
    _session: SessionUser,
    RecordId(event_id): RecordId,
) -> WebResult<Json<Vec<EventResponse>>> {
    load::<Event>(&state, event_id).await?;

    let responses = state
        .collection::<EventResponse>()
        .list(&ListQuery::all().filter("event_id", event_id))
        .await
        .map_err(|e| AppError::store("list", EventResponse::NAME, e))?;
    Ok(Json(responses))
}

/// `GET /api/events/:id/calendar` - `.ics` download (public).
///
/// # Errors
///
/// 404 unknown event, 500 store failure.
pub async fn calendar_export(
    State(state): State<AppState>,
    RecordId(event_id): RecordId,
) -> WebResult<impl IntoResponse> {
    let event = load::<Event>(&state, event_id).await?;
    let body = calendar::event_to_ics(&event, state.clock.now());
    let disposition = format!("attachment; filename=\"{}\"", calendar::file_name(&event));

    Ok((
        [
            (header::CONTENT_TYPE, calendar::CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
