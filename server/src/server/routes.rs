//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::auth::middleware::page_gate;
use crate::{api, auth, chat, dashboard};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use eventmingle_web::request_tracking_layer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS policy for the given origins; an empty list allows any origin.
#[must_use]
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Build the complete Axum router.
///
/// - `/health`, `/ready`: probes (no authentication)
/// - `/api/auth/*`: register, login, logout, me
/// - `/api/<resource>`: CRUD for every resource, plus event RSVPs,
///   calendar export and chat messages
/// - `/api/admin/overview`, `/api/manager/overview`, `/admin`, `/manager`:
///   dashboards
/// - `/ws/chat`: chat relay socket
///
/// Page paths under `/admin` and `/manager` pass through [`page_gate`],
/// which redirects unauthorized visitors to the login page.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api/auth", auth::handlers::routes())
        .merge(api::routes())
        .merge(dashboard::routes())
        .route("/ws/chat", get(chat::socket::chat_socket))
        .layer(from_fn_with_state(state.clone(), page_gate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_tracking_layer())
        .with_state(state)
}
