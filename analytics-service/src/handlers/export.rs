//! `GET /api/analytics/export/trends?format=csv|json`
//!
//! Streams one row at a time via `axum::body::Body::from_stream` instead of
//! building the whole response in a `String` first, so the client starts
//! receiving bytes as soon as the first row is serialized rather than after
//! the full result set is encoded.

use crate::errors::ApiError;
use crate::metrics;
use crate::models::ExportParams;
use crate::server::AppState;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use chrono::{Duration, Utc};
use observability_common::storage::AggregateQuery;
use observability_common::{Aggregate, ObservabilityError};

fn csv_row(row: &Aggregate) -> Result<Vec<u8>, ApiError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer
        .write_record(&[
            row.metric_type.as_str().to_string(),
            row.service.clone(),
            row.time_bucket.to_rfc3339(),
            row.value.to_string(),
        ])
        .map_err(|e| ObservabilityError::Internal(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ObservabilityError::Internal(e.to_string()).into())
}

pub async fn export_trends(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    if params.hours <= 0 {
        return Err(ObservabilityError::validation("hours must be positive").into());
    }
    if params.format != "csv" && params.format != "json" {
        return Err(ObservabilityError::validation("format must be csv or json").into());
    }

    let until = Utc::now();
    let since = until - Duration::hours(params.hours);
    let rows = state
        .aggregate_store
        .query_aggregates(AggregateQuery {
            metric_type: params.metric_type,
            service: params.service.clone(),
            since,
            until,
        })
        .await?;
    metrics::record_export_rows(rows.len() as u64);

    if params.format == "csv" {
        let stream = async_stream::stream! {
            yield Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"metric_type,service,time_bucket,value\n"));
            for row in rows {
                match csv_row(&row) {
                    Ok(bytes) => yield Ok(bytes::Bytes::from(bytes)),
                    Err(_) => break,
                }
            }
        };
        let mut response = Response::new(Body::from_stream(stream));
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        Ok(response)
    } else {
        let stream = async_stream::stream! {
            yield Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"["));
            let mut first = true;
            for row in rows {
                if !first {
                    yield Ok(bytes::Bytes::from_static(b","));
                }
                first = false;
                match serde_json::to_vec(&row) {
                    Ok(bytes) => yield Ok(bytes::Bytes::from(bytes)),
                    Err(_) => break,
                }
            }
            yield Ok(bytes::Bytes::from_static(b"]"));
        };
        let mut response = Response::new(Body::from_stream(stream));
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(response)
    }
}
