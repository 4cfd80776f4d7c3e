//! `POST /api/logs` and `POST /api/logs/batch`.

use crate::errors::ApiError;
use crate::metrics;
use crate::models::{IngestBatchRequest, IngestBatchResponse, IngestLogRequest, IngestResponse};
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::Json, Extension};
use chrono::{DateTime, Duration, Utc};
use observability_common::model::{validate_entry, MAX_BATCH_SIZE};
use observability_common::{CorrelationContext, LogEntry, ObservabilityError};
use std::time::Instant;

const MAX_TIMESTAMP_SKEW_HOURS: i64 = 24;

/// Resolves the `created_at` to use for an ingested entry: a caller-supplied
/// `timestamp` is honored when it falls within [`MAX_TIMESTAMP_SKEW_HOURS`] of
/// the server's clock, in either direction. Outside that window the server's
/// own time wins and the rejected value is recorded in `metadata` rather than
/// silently discarded.
fn resolve_timestamp(
    requested: Option<DateTime<Utc>>,
    metadata: &mut serde_json::Value,
) -> DateTime<Utc> {
    let now = Utc::now();
    let Some(requested) = requested else {
        return now;
    };
    let skew = (requested - now).abs();
    if skew <= Duration::hours(MAX_TIMESTAMP_SKEW_HOURS) {
        return requested;
    }
    if let Some(map) = metadata.as_object_mut() {
        map.insert(
            "rejected_timestamp".to_string(),
            serde_json::Value::String(requested.to_rfc3339()),
        );
    }
    now
}

fn build_entry(req: IngestLogRequest, ctx: &CorrelationContext) -> LogEntry {
    let mut context = ctx.clone();
    if let Some(correlation_id) = &req.correlation_id {
        context.correlation_id = correlation_id.clone();
    }
    let mut metadata = req.metadata.unwrap_or_else(|| serde_json::json!({}));
    let created_at = resolve_timestamp(req.timestamp, &mut metadata);
    LogEntry {
        id: None,
        created_at,
        service: req.service,
        level: req.level,
        message: req.message,
        user_id: req.user_id,
        tags: req.tags,
        metadata,
        correlation_id: context.correlation_id.clone(),
        context,
    }
}

pub async fn ingest_log(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
    Json(body): Json<IngestLogRequest>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let entry = build_entry(body, &ctx);
    if let Err(err) = validate_entry(&entry) {
        metrics::record_ingest_rejected();
        return Err(ObservabilityError::validation(err.to_string()).into());
    }

    let start = Instant::now();
    let stored = state.log_store.insert(entry).await.inspect_err(|_| {
        metrics::record_ingest_storage_error();
    })?;
    metrics::record_ingest(1, start.elapsed().as_secs_f64());

    state.stream_hub.publish(stored.clone()).await;
    metrics::record_stream_publish();

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            id: stored.id.unwrap_or_default(),
            correlation_id: stored.correlation_id,
        }),
    ))
}

pub async fn ingest_batch(
    State(state): State<AppState>,
    Extension(ctx): Extension<CorrelationContext>,
    Json(body): Json<IngestBatchRequest>,
) -> Result<(StatusCode, Json<IngestBatchResponse>), ApiError> {
    if body.entries.is_empty() {
        return Err(ObservabilityError::validation("batch must not be empty").into());
    }
    if body.entries.len() > MAX_BATCH_SIZE {
        return Err(ObservabilityError::validation(format!(
            "batch exceeds {MAX_BATCH_SIZE} entries"
        ))
        .into());
    }

    let entries: Vec<LogEntry> = body
        .entries
        .into_iter()
        .map(|req| build_entry(req, &ctx))
        .collect();
    for entry in &entries {
        validate_entry(entry).map_err(|e| {
            metrics::record_ingest_rejected();
            ObservabilityError::validation(e.to_string())
        })?;
    }

    let start = Instant::now();
    let stored = state
        .log_store
        .insert_batch(entries)
        .await
        .inspect_err(|_| metrics::record_ingest_storage_error())?;
    metrics::record_ingest(stored.len(), start.elapsed().as_secs_f64());

    for entry in &stored {
        state.stream_hub.publish(entry.clone()).await;
        metrics::record_stream_publish();
    }

    Ok((
        StatusCode::CREATED,
        Json(IngestBatchResponse {
            ids: stored.iter().filter_map(|e| e.id).collect(),
        }),
    ))
}
