//! `GET /api/analytics/top-issues`

use crate::errors::ApiError;
use crate::metrics;
use crate::models::{TopIssuesParams, TopIssuesResponse};
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Duration, Utc};
use observability_common::ObservabilityError;
use std::time::Instant;

pub async fn get_top_issues(
    State(state): State<AppState>,
    Query(params): Query<TopIssuesParams>,
) -> Result<Json<TopIssuesResponse>, ApiError> {
    if params.hours <= 0 {
        return Err(ObservabilityError::validation("hours must be positive").into());
    }

    let start = Instant::now();
    let since = Utc::now() - Duration::hours(params.hours);
    let issues = crate::analysis::top_issues::top_issues(state.log_store.as_ref(), since, params.limit).await?;
    metrics::record_query(start.elapsed().as_secs_f64());

    Ok(Json(TopIssuesResponse { issues }))
}
