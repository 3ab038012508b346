//! User administration.
//!
//! Users share the generic list/fetch/update routes. Creation and deletion
//! are custom because each user may own a credential record: creating with
//! a `password` stores its hash, deleting removes it.

use super::{CanWrite, RecordId, delete, fetch, list, update};
use crate::auth::handlers::create_account;
use crate::metrics;
use crate::server::state::AppState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use eventmingle_core::Record;
use eventmingle_core::entities::{Credential, User, UserDraft};
use eventmingle_web::{JsonBody, WebResult};

/// User routes (admin only).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<User>).post(create))
        .route("/:id", get(fetch::<User>).put(update::<User>).delete(remove))
}

/// `POST /api/users` - any role; optional `password` creates a login.
///
/// # Errors
///
/// 400 invalid draft, short password or taken email; 401/403 for non-admins;
/// 500 store failure.
pub async fn create(
    State(state): State<AppState>,
    _access: CanWrite<User>,
    JsonBody(draft): JsonBody<UserDraft>,
) -> WebResult<(StatusCode, Json<User>)> {
    let user = create_account(&state, draft).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User created by admin");
    metrics::record_created(User::COLLECTION);
    Ok((StatusCode::CREATED, Json(user)))
}

/// `DELETE /api/users/:id` - removes the user and their credential.
///
/// # Errors
///
/// 404 unknown user, 401/403 for non-admins, 500 store failure.
pub async fn remove(
    State(state): State<AppState>,
    _access: CanWrite<User>,
    RecordId(id): RecordId,
) -> WebResult<Json<User>> {
    let user = delete::<User>(&state, id).await?;

    if let Err(e) = state.collection::<Credential>().delete(id).await {
        // The user is gone, so the orphaned credential can no longer log in.
        tracing::error!(user_id = %id, error = %e, "Failed to remove credential");
    }
    Ok(Json(user))
}
