//! # Relay
//!
//! A real-time message relay. Clients connect over WebSocket; anything a
//! client sends, or anything submitted through `POST /chat`, is broadcast
//! to every other connected client.
//!
//! ## Modules
//!
//! - [`hub`]: Connection registry and broadcast fan-out
//! - [`websocket`]: WebSocket connection lifecycle
//! - [`api`]: HTTP router, submission endpoint and health probes
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay::{serve, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::from_env();
//!     config.server.port = 3000;
//!
//!     serve(AppState::new(config)).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod hub;
pub mod websocket;

pub use api::{build_router, serve, serve_on, ApiError, AppState};

pub use hub::{
    BroadcastReport, Broadcaster, ConnectionHandle, ConnectionId, ConnectionState, DeliveryError,
    Registry, SubmitError,
};

pub use config::{Config, ConfigError, LoggingConfig, RelayConfig, ServerConfig};

pub use websocket::websocket_handler;
