//! Shared HTTP plumbing for the EventMingle service.
//!
//! - [`AppError`]: the JSON error body every handler returns
//! - extractors: correlation id, client ip, user agent, bearer token,
//!   and a JSON body whose rejections use the same error shape
//! - [`request_tracking_layer`]: per-request span, completion log and
//!   `http_requests_total` counter
//! - [`TopicBroadcaster`]: topic fan-out used by the chat relay
//!
//! # Example
//!
//! ```ignore
//! use eventmingle_web::{AppError, JsonBody, WebResult, request_tracking_layer};
//! use axum::{Router, routing::post, Json};
//!
//! async fn create(JsonBody(draft): JsonBody<EventDraft>) -> WebResult<Json<Event>> {
//!     // ...
//! }
//!
//! let app = Router::new()
//!     .route("/api/events", post(create))
//!     .layer(request_tracking_layer());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod broadcast;
pub mod error;
pub mod extractors;
pub mod middleware;

pub use broadcast::TopicBroadcaster;
pub use error::AppError;
pub use extractors::{BearerToken, ClientIp, CorrelationId, JsonBody, SESSION_COOKIE, UserAgent};
pub use middleware::{CORRELATION_ID_HEADER, request_tracking_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
