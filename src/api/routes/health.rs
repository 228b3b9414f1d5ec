//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{HealthResponse, StorageHealth},
};

/// GET /api/v1/health
///
/// Always 200 while the process serves requests; `status` turns `"degraded"`
/// when the store fails its health check.
pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<HealthResponse>> {
    let health = state.store.health_check().await?;

    Ok(Json(HealthResponse {
        status: if health.healthy { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage: StorageHealth {
            backend: health.backend.to_string(),
            healthy: health.healthy,
            message: health.message,
        },
    }))
}
