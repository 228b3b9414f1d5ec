//! HTTP read API for the telemetry store
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Injected store handle** shared with the poller
//!
//! ## Endpoints
//!
//! - `GET /telemetry?minutes=N` - Samples from the last N minutes
//! - `GET /api/snmp?minutes=N` - Same handler, dashboard path
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/stats` - Poller and store statistics

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{HealthResponse, StatsResponse};

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:3001")
    pub bind_addr: SocketAddr,

    /// Enable CORS for the dashboard
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: crate::util::get_bind_addr(),
            enable_cors: true,
        }
    }
}

/// Build the router with every route and middleware layer
pub fn build_router(state: ApiState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route("/telemetry", get(routes::telemetry::get_telemetry))
        .route("/api/snmp", get(routes::telemetry::get_telemetry))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// Starts an Axum HTTP server in a background task and returns the address it
/// is listening on (useful when binding port 0).
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = build_router(state, config.enable_cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
