use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};

use super::AppState;

/// GET /api/metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics recorder is not installed".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Wraps every request in a span and records counter/latency metrics.
/// The `user_id` field starts empty and is filled in by the auth middleware
/// once the bearer token resolves.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let started = Instant::now();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    // Metric labels use the route template so recipe/tag ids do not inflate
    // label cardinality
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string());

    let span = info_span!(
        "http_request",
        method = %method,
        path = %path,
        route = route.as_deref(),
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let status = response.status().as_u16();
        let elapsed = started.elapsed();

        let labels = [
            ("method", method),
            ("route", route.unwrap_or(path)),
            ("status", status.to_string()),
        ];

        metrics::counter!("larder_requests_total", &labels).increment(1);
        metrics::histogram!("larder_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        info!(
            status_code = status,
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}
