//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        connections: state.connection_count().await,
        broadcasts: state.broadcaster.stats(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hub::ConnectionHandle;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_full_health_counts_connections() {
        let state = Arc::new(AppState::new(Config::default()));
        let (handle, _rx) = ConnectionHandle::channel(4);
        state.registry().add(handle).await;

        let Json(health) = full_health(State(Arc::clone(&state))).await;

        assert_eq!(health.status, "healthy");
        assert_eq!(health.connections, 1);
        assert_eq!(health.broadcasts.broadcasts, 0);
    }
}
