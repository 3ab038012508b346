//! Authentication extractors and role gates.
//!
//! - [`SessionUser`]: requires a valid session token (401 otherwise)
//! - [`MaybeSessionUser`]: the session user if the request carries a valid token
//! - [`Gate`] / [`AccessPolicy`]: role checks for API resources (401 / 403)
//! - [`page_gate`]: the dashboard page guard, which redirects to the login
//!   page instead of answering with an error
//!
//! # Usage
//!
//! ```rust,ignore
//! use eventmingle::auth::{SessionUser, Gate};
//!
//! async fn overview(session: SessionUser) -> WebResult<Json<Overview>> {
//!     Gate::Roles(ADMIN).check(Some(&session))?;
//!     // ...
//! }
//! ```

use super::AuthError;
use crate::server::state::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{Uri, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use eventmingle_core::entities::{Role, User};
use eventmingle_web::{AppError, BearerToken};
use uuid::Uuid;

/// Roles allowed to manage the catalogue and back office.
pub const STAFF: &[Role] = &[Role::Admin, Role::EventManager];

/// Admin only.
pub const ADMIN: &[Role] = &[Role::Admin];

/// Authenticated user, loaded from the store on every request so that role
/// changes and deletions take effect immediately.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The current user record
    pub user: User,
}

impl SessionUser {
    /// The user's id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.user.id
    }

    /// The user's current role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }

    /// Admins and event managers.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        STAFF.contains(&self.user.role)
    }
}

/// Resolve a raw token to its user.
///
/// # Errors
///
/// 401 for an invalid or expired token or a deleted user; 500 if the
/// store fails.
pub async fn authenticate(state: &AppState, token: &str) -> Result<SessionUser, AppError> {
    let claims = state.tokens.verify(token)?;
    let user = state
        .collection::<User>()
        .get(claims.sub)
        .await
        .map_err(|e| AppError::store("fetch", "User", e))?
        .ok_or(AuthError::InvalidToken)?;

    Ok(SessionUser { user })
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = BearerToken::from_request_parts(parts, state).await?;
        authenticate(state, &token.0).await
    }
}

/// Optional authentication.
///
/// `None` when there is no token or the token does not resolve to a user.
/// Store failures still reject with 500.
#[derive(Debug, Clone)]
pub struct MaybeSessionUser(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = BearerToken::from_headers(&parts.headers) else {
            return Ok(Self(None));
        };
        match authenticate(state, &token.0).await {
            Ok(session) => Ok(Self(Some(session))),
            Err(err) if err.status().is_client_error() => Ok(Self(None)),
            Err(err) => Err(err),
        }
    }
}

/// Who may pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users holding one of these roles.
    Roles(&'static [Role]),
}

impl Gate {
    /// Check `session` against this gate.
    ///
    /// # Errors
    ///
    /// 401 when a session is required and missing; 403 when the role does
    /// not match.
    pub fn check(self, session: Option<&SessionUser>) -> Result<(), AppError> {
        match (self, session) {
            (Self::Public, _) | (Self::Authenticated, Some(_)) => Ok(()),
            (_, None) => Err(AuthError::MissingToken.into()),
            (Self::Roles(roles), Some(session)) if roles.contains(&session.role()) => Ok(()),
            (Self::Roles(_), Some(session)) => {
                tracing::debug!(user_id = %session.id(), role = %session.role(), "Role check failed");
                Err(AuthError::Forbidden.into())
            }
        }
    }
}

/// Read and write gates of one REST resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Gate for `GET` routes.
    pub read: Gate,
    /// Gate for `POST`, `PUT` and `DELETE` routes.
    pub write: Gate,
}

impl AccessPolicy {
    /// Public catalogue, staff-managed.
    pub const CATALOGUE: Self = Self {
        read: Gate::Public,
        write: Gate::Roles(STAFF),
    };

    /// Back office: staff only.
    pub const BACK_OFFICE: Self = Self {
        read: Gate::Roles(STAFF),
        write: Gate::Roles(STAFF),
    };

    /// Admin only.
    pub const ADMIN_ONLY: Self = Self {
        read: Gate::Roles(ADMIN),
        write: Gate::Roles(ADMIN),
    };

    /// Any signed-in user.
    pub const MEMBERS: Self = Self {
        read: Gate::Authenticated,
        write: Gate::Authenticated,
    };
}

/// Gate guarding a dashboard page path, if any.
#[must_use]
pub fn page_gate_for(path: &str) -> Option<Gate> {
    let under = |prefix: &str| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    };

    if under("/admin") {
        Some(Gate::Roles(ADMIN))
    } else if under("/manager") {
        Some(Gate::Roles(STAFF))
    } else {
        None
    }
}

/// Login page URL that returns to `uri` afterwards.
#[must_use]
pub fn login_redirect_target(uri: &Uri) -> String {
    let original = uri
        .path_and_query()
        .map_or_else(|| uri.path(), axum::http::uri::PathAndQuery::as_str);
    format!("/login?callbackUrl={}", urlencoding::encode(original))
}

/// Dashboard page guard.
///
/// Requests under `/admin` need an admin, requests under `/manager` need an
/// event manager or admin. Anything else passes through. A request that
/// fails the check is redirected (303) to the login page with the original
/// path as `callbackUrl`.
pub async fn page_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(gate) = page_gate_for(request.uri().path()) else {
        return next.run(request).await;
    };

    let session = match BearerToken::from_headers(request.headers()) {
        Some(token) => match authenticate(&state, &token.0).await {
            Ok(session) => Some(session),
            Err(err) if err.status().is_server_error() => return err.into_response(),
            Err(_) => None,
        },
        None => None,
    };

    if gate.check(session.as_ref()).is_ok() {
        return next.run(request).await;
    }

    let target = login_redirect_target(request.uri());
    tracing::debug!(path = %request.uri().path(), %target, "Redirecting to login");
    Redirect::to(&target).into_response()
}
