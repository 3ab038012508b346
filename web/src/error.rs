//! HTTP error type shared by every handler.
//!
//! Handlers return [`AppError`]; it renders as a JSON body
//! `{"code": "...", "message": "..."}` with the matching status. Server
//! errors keep their source for the log line but never leak it to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use eventmingle_core::{StoreError, ValidationError, WriteError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> WebResult<Json<Event>> {
///     let event = state.events.get(id).await
///         .map_err(|e| AppError::store("fetch", "Event", e))?
///         .ok_or_else(|| AppError::not_found("Event", id))?;
///     Ok(Json(event))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST".to_string())
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHORIZED".to_string())
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message.into(), "FORBIDDEN".to_string())
    }

    /// 404 Not Found, worded as "`<resource>` with id `<id>` not found".
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// 400 for a payload that failed field validation.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "VALIDATION_ERROR".to_string())
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// 503 Service Unavailable.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// Wrap a store failure during `operation` on `resource`.
    ///
    /// Unique-index conflicts are the client's fault and become 400; every
    /// other store error is a generic 500 "Failed to `<operation>` `<resource>`".
    #[must_use]
    pub fn store(operation: &str, resource: &str, err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => Self::bad_request(format!(
                "{resource} conflicts with an existing record"
            ))
            .with_source(err),
            other => Self::internal(format!(
                "Failed to {operation} {}",
                resource.to_lowercase()
            ))
            .with_source(other),
        }
    }

    /// Wrap a failed create or update.
    #[must_use]
    pub fn write(operation: &str, resource: &str, err: WriteError) -> Self {
        match err {
            WriteError::Validation(invalid) => invalid.into(),
            WriteError::Store(store) => Self::store(operation, resource, store),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::store("access", "record", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Event", "123");
        assert_eq!(err.to_string(), "[NOT_FOUND] Event with id 123 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err: AppError = ValidationError::Empty { field: "title" }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.message(), "title must not be empty");
    }

    #[test]
    fn test_store_conflict_is_bad_request() {
        let err = AppError::store(
            "create",
            "User",
            StoreError::Conflict {
                collection: "users".into(),
                detail: "duplicate key".into(),
            },
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_failure_hides_detail() {
        let err = AppError::store(
            "list",
            "Event",
            StoreError::Database("password authentication failed".into()),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to list event");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_write_error_dispatch() {
        let invalid = AppError::write("update", "Event", WriteError::Validation(ValidationError::EndBeforeStart));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let failed = AppError::write(
            "update",
            "Event",
            WriteError::Store(StoreError::Database("down".into())),
        );
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
