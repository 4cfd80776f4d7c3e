//! `GET /health`, `GET /metrics`

use crate::models::HealthResponse;
use crate::server::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Json};

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_connected = match &state.pool {
        Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
        None => false,
    };
    Json(HealthResponse {
        status: if database_connected { "ok" } else { "degraded" }.to_string(),
        database_connected,
        uptime_seconds: crate::metrics::uptime_seconds(),
        version: state.identity.service_version.clone(),
    })
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics_handle {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}
