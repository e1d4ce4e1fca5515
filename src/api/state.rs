//! Application State
//!
//! Shared state accessible by all handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::Config;
use crate::hub::{Broadcaster, Registry};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Broadcast fan-out, owning the connection registry
    pub broadcaster: Arc<Broadcaster>,
    /// Loaded configuration
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with an empty registry
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(Registry::new());

        Self {
            broadcaster: Arc::new(Broadcaster::new(registry)),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.broadcaster.registry()
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn connection_count(&self) -> usize {
        self.registry().len().await
    }
}
