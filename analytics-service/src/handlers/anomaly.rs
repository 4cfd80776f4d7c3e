//! `GET /api/analytics/anomalies`

use crate::analysis::detect_anomalies;
use crate::errors::ApiError;
use crate::metrics;
use crate::models::{AnomalyParams, AnomalyResponse};
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Duration, Utc};
use observability_common::storage::AggregateQuery;
use observability_common::ObservabilityError;
use std::time::Instant;

pub async fn get_anomalies(
    State(state): State<AppState>,
    Query(params): Query<AnomalyParams>,
) -> Result<Json<AnomalyResponse>, ApiError> {
    if params.hours <= 0 {
        return Err(ObservabilityError::validation("hours must be positive").into());
    }

    let start = Instant::now();
    let until = Utc::now();
    let since = until - Duration::hours(params.hours);

    let aggregates = state
        .aggregate_store
        .query_aggregates(AggregateQuery {
            metric_type: Some(params.metric_type),
            service: Some(params.service.clone()),
            since,
            until,
        })
        .await?;
    metrics::record_query(start.elapsed().as_secs_f64());

    let series: Vec<f64> = aggregates.iter().map(|a| a.value).collect();
    let anomalies = detect_anomalies(&series);

    Ok(Json(AnomalyResponse {
        metric_type: params.metric_type,
        service: params.service,
        anomalies,
    }))
}
