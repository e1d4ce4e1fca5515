//! Relay HTTP API
//!
//! HTTP layer for the relay, built with Axum.
//!
//! # Endpoints
//!
//! ## Chat
//! - `POST /chat` - Broadcast `{"username", "message"}` to every client
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Connection count, broadcast counters, uptime
//!
//! ## WebSocket
//! - `GET /ws` (also `GET /`) - Relay connection
//!
//! # Example
//!
//! ```rust,no_run
//! use relay::api::{serve, AppState};
//! use relay::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(Config::default());
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Largest accepted `/chat` body
const CHAT_BODY_LIMIT: usize = 100 * 1024;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let cors = if state.config.server.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let shared_state = Arc::new(state);

    Router::new()
        .route(
            "/chat",
            post(routes::chat::submit_chat).layer(DefaultBodyLimit::max(CHAT_BODY_LIMIT)),
        )
        .route("/ws", get(websocket_handler))
        .route("/", get(websocket_handler))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Bind the configured address and serve until a shutdown signal arrives
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Relay listening on {}", listener.local_addr()?);

    serve_on(listener, state).await
}

/// Serve on an already bound listener
pub async fn serve_on(listener: tokio::net::TcpListener, state: AppState) -> Result<(), ApiError> {
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Relay shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
