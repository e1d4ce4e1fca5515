//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::hub::{BroadcastReport, StatsSnapshot};

// ============================================
// CHAT DTOs
// ============================================

/// Chat submission request
///
/// Both fields are optional at the JSON level so a missing field reaches
/// validation and yields 400 rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat submission response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Status: "ok"
    pub status: String,
    #[serde(flatten)]
    pub report: BroadcastReport,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Currently registered connections
    pub connections: usize,
    /// Cumulative broadcast counters
    pub broadcasts: StatsSnapshot,
    pub uptime_seconds: u64,
    pub version: String,
}
