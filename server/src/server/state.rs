//! Application state for the EventMingle HTTP server.
//!
//! Contains the shared resources every handler needs:
//! - the record store (Postgres in production, in-memory in tests)
//! - the clock used for timestamps and token expiry
//! - token and password services
//! - the chat room hub

use crate::auth::{PasswordHasher, TokenService};
use crate::chat::ChatHub;
use crate::config::{AuthConfig, ChatConfig};
use eventmingle_core::environment::Clock;
use eventmingle_core::{Collection, Record, RecordStore};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply, via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Document store behind every collection
    pub store: Arc<dyn RecordStore>,
    /// Time source for timestamps and token expiry
    pub clock: Arc<dyn Clock>,
    /// Session token issuer/verifier
    pub tokens: Arc<TokenService>,
    /// Password hasher
    pub passwords: PasswordHasher,
    /// Chat room fan-out
    pub chat: ChatHub,
}

impl AppState {
    /// Create the application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        auth: &AuthConfig,
        chat: &ChatConfig,
    ) -> Self {
        Self {
            tokens: Arc::new(TokenService::new(
                &auth.jwt_secret,
                auth.token_ttl,
                Arc::clone(&clock),
            )),
            passwords: PasswordHasher::new(auth.bcrypt_cost),
            chat: ChatHub::new(chat.channel_capacity),
            store,
            clock,
        }
    }

    /// Typed handle on the collection holding `R`.
    #[must_use]
    pub fn collection<R: Record>(&self) -> Collection<R> {
        Collection::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tokens", &self.tokens)
            .field("passwords", &self.passwords)
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}
