//! API response types

use serde::{Deserialize, Serialize};

use crate::actors::PollerStats;

/// Response for `GET /api/v1/health`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`
    pub status: String,
    pub timestamp: String,
    pub storage: StorageHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageHealth {
    pub backend: String,
    pub healthy: bool,
    pub message: String,
}

/// Response for `GET /api/v1/stats`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub timestamp: String,

    /// Samples currently in the store
    pub samples: u64,

    /// Absent when no poller is attached
    pub poller: Option<PollerStats>,
}
