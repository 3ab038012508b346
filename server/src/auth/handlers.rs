//! Account endpoints: sign-up, login, current user, logout.
//!
//! Login and sign-up answer with `{token, user}` and also set the
//! `session_token` cookie so browser clients never have to store the token
//! themselves.

use super::passwords::validate_password;
use super::{AuthError, SessionUser};
use crate::metrics;
use crate::server::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    routing::{get, post},
};
use eventmingle_core::entities::{Credential, Role, User, UserDraft};
use eventmingle_core::{ListQuery, Record, StoreError, WriteError};
use eventmingle_web::{AppError, ClientIp, JsonBody, SESSION_COOKIE, UserAgent, WebResult};
use serde::{Deserialize, Serialize};

/// Sign-up payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Password, at least eight characters.
    pub password: String,
}

/// Login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Issued session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Bearer token.
    pub token: String,
    /// The signed-in user.
    pub user: User,
}

type SessionReply = (StatusCode, [(header::HeaderName, String); 1], Json<SessionResponse>);

/// Routes mounted under `/api/auth`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Create a user and, when the draft carries a password, its credential.
///
/// The password is checked and hashed before anything is written. If the
/// credential cannot be stored the new user is removed again.
///
/// # Errors
///
/// 400 for an invalid draft, a short password or an email that is already
/// registered; 500 when hashing or the store fails.
pub async fn create_account(state: &AppState, mut draft: UserDraft) -> WebResult<User> {
    let password_hash = match draft.password.take() {
        Some(password) => {
            validate_password(&password)?;
            Some(state.passwords.hash(password).await?)
        }
        None => None,
    };

    let users = state.collection::<User>();
    let user = users.create(draft).await.map_err(|err| match err {
        WriteError::Store(StoreError::Conflict { .. }) => {
            AppError::bad_request("Email is already registered")
        }
        other => AppError::write("create", User::NAME, other),
    })?;

    if let Some(password_hash) = password_hash {
        let credential = Credential {
            id: user.id,
            email: user.email.clone(),
            password_hash,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        if let Err(err) = state.collection::<Credential>().insert(&credential).await {
            if let Err(cleanup) = users.delete(user.id).await {
                tracing::error!(user_id = %user.id, error = %cleanup, "Failed to remove user after credential error");
            }
            return Err(AppError::store("create", Credential::NAME, err));
        }
    }

    Ok(user)
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

fn issue_session(state: &AppState, user: User, status: StatusCode) -> WebResult<SessionReply> {
    let token = state.tokens.issue(&user)?;
    let cookie = session_cookie(&token, state.tokens.ttl_secs());
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse { token, user }),
    ))
}

/// Self-service sign-up.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {"name": "Ada", "email": "ada@example.com", "password": "correct horse"}
/// ```
///
/// # Response
///
/// `201 Created` with `{"token": "...", "user": {...}}`. New accounts always
/// get the `user` role.
///
/// - `400 Bad Request`: invalid name or email, short password, email taken
pub async fn register(
    State(state): State<AppState>,
    client_ip: ClientIp,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> WebResult<SessionReply> {
    let draft = UserDraft {
        name: request.name,
        email: request.email,
        role: Role::User,
        avatar_url: None,
        bio: None,
        interests: Vec::new(),
        password: Some(request.password),
    };
    let user = create_account(&state, draft).await?;

    tracing::info!(user_id = %user.id, client_ip = %client_ip.0, "User registered");
    metrics::record_registration();
    issue_session(&state, user, StatusCode::CREATED)
}

/// Email and password login.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {"email": "ada@example.com", "password": "correct horse"}
/// ```
///
/// # Response
///
/// `200 OK` with `{"token": "...", "user": {...}}`.
///
/// - `401 Unauthorized`: unknown email or wrong password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    client_ip: ClientIp,
    user_agent: UserAgent,
    JsonBody(request): JsonBody<LoginRequest>,
) -> WebResult<SessionReply> {
    let email = request.email.trim().to_lowercase();

    match check_credentials(&state, &email, request.password).await {
        Ok(user) => {
            tracing::info!(
                user_id = %user.id,
                client_ip = %client_ip.0,
                user_agent = %user_agent.0,
                "Login succeeded"
            );
            metrics::record_login(true);
            issue_session(&state, user, StatusCode::OK)
        }
        Err(err) => {
            if err.status() == StatusCode::UNAUTHORIZED {
                tracing::warn!(client_ip = %client_ip.0, user_agent = %user_agent.0, "Login failed");
            }
            metrics::record_login(false);
            Err(err)
        }
    }
}

async fn check_credentials(state: &AppState, email: &str, password: String) -> WebResult<User> {
    let credential = state
        .collection::<Credential>()
        .list(&ListQuery::all().filter("email", email).page(0, 1))
        .await
        .map_err(|e| AppError::store("fetch", Credential::NAME, e))?
        .into_iter()
        .next()
        .ok_or(AuthError::InvalidCredentials)?;

    if !state
        .passwords
        .verify(password, credential.password_hash)
        .await?
    {
        return Err(AuthError::InvalidCredentials.into());
    }

    state
        .collection::<User>()
        .get(credential.id)
        .await
        .map_err(|e| AppError::store("fetch", User::NAME, e))?
        .ok_or_else(|| AuthError::InvalidCredentials.into())
}

/// The signed-in user.
///
/// `GET /api/auth/me`; 401 without a valid token.
pub async fn me(session: SessionUser) -> Json<User> {
    Json(session.user)
}

/// Clear the session cookie.
///
/// `POST /api/auth/logout` always answers `204 No Content`; bearer tokens
/// simply expire.
pub async fn logout() -> (StatusCode, [(header::HeaderName, String); 1]) {
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, session_cookie("", 0))])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", 60);
        assert!(cookie.starts_with("session_token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("Max-Age=60"));
    }
}
