//! Poller and store statistics endpoint

use axum::{Json, extract::State};
use tracing::warn;

use crate::api::{error::ApiResult, state::ApiState, types::StatsResponse};

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<Json<StatsResponse>> {
    let samples = state.store.count().await?;

    let poller = match &state.poller {
        Some(handle) => match handle.get_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("poller stats unavailable: {:#}", e);
                None
            }
        },
        None => None,
    };

    Ok(Json(StatsResponse {
        timestamp: chrono::Utc::now().to_rfc3339(),
        samples,
        poller,
    }))
}
