//! `GET /health` and `GET /metrics`.

use crate::metrics::uptime_seconds;
use crate::models::HealthResponse;
use crate::server::AppState;
use axum::{extract::State, response::Json};

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_connected = match &state.pool {
        Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
        None => true,
    };

    Json(HealthResponse {
        status: if database_connected { "healthy" } else { "degraded" }.to_string(),
        database_connected,
        uptime_seconds: uptime_seconds(),
        version: state.identity.service_version.clone(),
    })
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|h| h.render())
        .unwrap_or_default()
}
