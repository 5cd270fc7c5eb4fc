use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use insta_shared::clients::db;
use insta_shared::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

/// Service health, including a database round-trip.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let pool = state.db.clone();
    let database = match tokio::task::spawn_blocking(move || db::ping(&pool)).await {
        Ok(Ok(())) => HealthCheck::healthy("database"),
        Ok(Err(e)) => HealthCheck::unhealthy("database", e.to_string()),
        Err(e) => HealthCheck::unhealthy("database", format!("probe task failed: {e}")),
    };

    let response = HealthResponse::healthy("insta-social", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![database]);

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

/// Prometheus exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
