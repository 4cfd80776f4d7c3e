//! `GET /api/analytics/trends`

use crate::analysis::compute_trend;
use crate::errors::ApiError;
use crate::metrics;
use crate::models::{TrendParams, TrendResponse};
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Duration, Utc};
use observability_common::storage::AggregateQuery;
use observability_common::ObservabilityError;
use std::time::Instant;

const RULE: &str = "first-vs-last percent change; |delta%| < 10.0 is stable, else sign of delta% decides increasing/decreasing";

pub async fn get_trend(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> Result<Json<TrendResponse>, ApiError> {
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
    let trend = compute_trend(&series);

    Ok(Json(TrendResponse {
        metric_type: params.metric_type,
        service: params.service,
        series,
        direction: trend.as_ref().map(|t| t.direction),
        percent_change: trend.as_ref().map(|t| t.percent_change),
        rule: RULE,
    }))
}
