//! `GET /api/logs`, `GET /api/logs/correlation/:id`, `GET /api/logs/trace/:id/timeline`.

use crate::errors::ApiError;
use crate::metrics;
use crate::models::{
    CorrelationSummaryResponse, LogListResponse, LogQueryParams, TraceTimelineResponse,
};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use observability_common::storage::LogQuery;
use observability_common::ObservabilityError;
use std::time::Instant;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;
const MAX_UNFILTERED_OFFSET: i64 = 10_000;
const TIMELINE_LIMIT: usize = 1000;

pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogQueryParams>,
) -> Result<Json<LogListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let has_selective_filter =
        params.service.is_some() || params.level.is_some() || params.correlation_id.is_some();
    if offset > MAX_UNFILTERED_OFFSET && !has_selective_filter {
        return Err(ObservabilityError::validation(
            "offset beyond 10000 requires a service, level, or correlation_id filter",
        )
        .into());
    }

    let start = Instant::now();
    let entries = state
        .log_store
        .query(LogQuery {
            service: params.service,
            level: params.level,
            correlation_id: params.correlation_id,
            since: None,
            until: None,
            limit,
            offset,
        })
        .await?;
    metrics::record_query(start.elapsed().as_secs_f64());

    Ok(Json(LogListResponse { entries }))
}

pub async fn get_by_correlation(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
) -> Result<Json<CorrelationSummaryResponse>, ApiError> {
    let entries = state.log_store.find_by_correlation(&correlation_id).await?;
    if entries.is_empty() {
        return Err(ObservabilityError::not_found(format!(
            "no entries for correlation id {correlation_id}"
        ))
        .into());
    }

    let mut services: Vec<String> = entries.iter().map(|e| e.service.clone()).collect();
    services.sort_unstable();
    services.dedup();
    let first_seen = entries.iter().map(|e| e.created_at).min().expect("entries is non-empty");
    let last_seen = entries.iter().map(|e| e.created_at).max().expect("entries is non-empty");

    Ok(Json(CorrelationSummaryResponse {
        correlation_id,
        count: entries.len(),
        services,
        first_seen,
        last_seen,
    }))
}

pub async fn get_trace_timeline(
    State(state): State<AppState>,
    Path(trace_id): Path<String>,
) -> Result<Json<TraceTimelineResponse>, ApiError> {
    let (entries, truncated) = state.log_store.trace_timeline(&trace_id, TIMELINE_LIMIT).await?;
    if entries.is_empty() {
        return Err(
            ObservabilityError::not_found(format!("no entries for trace id {trace_id}")).into(),
        );
    }
    Ok(Json(TraceTimelineResponse {
        trace_id,
        entries,
        truncated,
    }))
}
