//! Application state.

use std::sync::Arc;

use taskdeck_core::realtime::{ConnectionConfig, Hub};
use taskdeck_db::SharedStore;

use crate::rate_limit::{self, ClientLimiter};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub hub: Hub,
    /// Applied to every WebSocket session.
    pub connection: ConnectionConfig,
    /// Unlimited when `None`.
    pub rate_limiter: Option<Arc<ClientLimiter>>,
}

impl AppState {
    pub fn new(store: SharedStore, hub: Hub, connection: ConnectionConfig) -> Self {
        Self {
            store,
            hub,
            connection,
            rate_limiter: None,
        }
    }

    /// Limit each client to `per_minute` requests; zero disables the limit.
    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limiter = rate_limit::per_minute(per_minute);
        self
    }
}
