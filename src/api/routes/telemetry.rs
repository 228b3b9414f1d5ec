//! Telemetry range query endpoint

use std::num::IntErrorKind;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
};
use crate::storage::Sample;

/// Window used when `minutes` is absent or not an integer
pub const DEFAULT_MINUTES: i64 = 1;

#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Kept as a string so a malformed value falls back to the default
    /// instead of being rejected by the extractor
    pub minutes: Option<String>,
}

fn invalid_minutes() -> ApiError {
    ApiError::InvalidRequest("Invalid 'minutes' parameter.".to_string())
}

/// Turn the raw `minutes` parameter into a positive window length.
///
/// Integers beyond the `i64` range keep their sign: a huge positive value
/// becomes `i64::MAX` (everything), a huge negative one is rejected.
pub fn resolve_minutes(raw: Option<&str>) -> ApiResult<i64> {
    match raw.map(|value| value.trim().parse::<i64>()) {
        Some(Ok(minutes)) if minutes <= 0 => Err(invalid_minutes()),
        Some(Ok(minutes)) => Ok(minutes),
        Some(Err(e)) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Err(invalid_minutes()),
            _ => Ok(DEFAULT_MINUTES),
        },
        None => Ok(DEFAULT_MINUTES),
    }
}

/// `now - minutes`, clamped to the earliest representable instant
pub fn threshold(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    Duration::try_minutes(minutes)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// GET /telemetry?minutes=N (also served as /api/snmp)
///
/// Samples from the last `minutes` minutes, oldest first.
pub async fn get_telemetry(
    State(state): State<ApiState>,
    Query(query): Query<TelemetryQuery>,
) -> ApiResult<Json<Vec<Sample>>> {
    let minutes = resolve_minutes(query.minutes.as_deref())?;
    let since = threshold(Utc::now(), minutes);

    debug!("telemetry query for the last {} minutes", minutes);

    let mut samples = state.store.query_since(since).await?;
    samples.sort_by_key(|sample| sample.timestamp);

    Ok(Json(samples))
}
