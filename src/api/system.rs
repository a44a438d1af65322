use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub healthy: bool,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// GET /api/health-check — liveness plus a database ping.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthCheck>> {
    let healthy = state.store().ping().await.is_ok();

    Json(ApiResponse::success(HealthCheck {
        healthy,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}
