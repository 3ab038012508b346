//! HTTP server assembly.
//!
//! - [`state`]: shared application state
//! - [`health`]: liveness and readiness probes
//! - [`routes`]: the complete router

pub mod health;
pub mod routes;
pub mod state;

pub use routes::{build_router, cors_layer};
pub use state::AppState;
