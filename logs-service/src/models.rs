//! Request/response DTOs for the ingest and query APIs.

use chrono::{DateTime, Utc};
use observability_common::{LogEntry, LogLevel};
use serde::{Deserialize, Serialize};

/// Client-facing ingest payload; the service fills in `context` and
/// `correlation_id` from the request-scoped [`observability_common::CorrelationContext`].
#[derive(Debug, Clone, Deserialize)]
pub struct IngestLogRequest {
    pub service: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Caller-supplied event time. Honored when within 24 hours of the
    /// server's clock; otherwise the server stamps its own time and notes
    /// the rejected value in `metadata`.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestBatchRequest {
    pub entries: Vec<IngestLogRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub id: i64,
    pub correlation_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestBatchResponse {
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogQueryParams {
    pub service: Option<String>,
    pub level: Option<LogLevel>,
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogListResponse {
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationSummaryResponse {
    pub correlation_id: String,
    pub count: usize,
    pub services: Vec<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceTimelineResponse {
    pub trace_id: String,
    pub entries: Vec<LogEntry>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database_connected: bool,
    pub uptime_seconds: u64,
    pub version: String,
}
