//! Narrow storage capability traits used by the ingest, query, and
//! analytics paths. Keeping the trait surface small (insert/query/upsert)
//! means the Stream Hub and handlers never depend on a concrete database.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::model::{Aggregate, LogEntry, MetricType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::{new_memory_stores, InMemoryAggregateStore, InMemoryLogStore};
pub use postgres::{PgAggregateStore, PgLogStore};

/// Filters accepted by `GET /api/logs`.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub service: Option<String>,
    pub level: Option<crate::model::LogLevel>,
    pub correlation_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

/// A (service, level, message) cluster ranked by occurrence count.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TopIssue {
    pub service: String,
    pub level: crate::model::LogLevel,
    pub message: String,
    pub count: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Filters accepted when reading back aggregates.
#[derive(Debug, Clone)]
pub struct AggregateQuery {
    pub metric_type: Option<MetricType>,
    pub service: Option<String>,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

/// Append-only log storage.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn insert(&self, entry: LogEntry) -> Result<LogEntry>;

    /// Inserts every entry in a single transaction; all-or-nothing.
    async fn insert_batch(&self, entries: Vec<LogEntry>) -> Result<Vec<LogEntry>>;

    async fn query(&self, query: LogQuery) -> Result<Vec<LogEntry>>;

    async fn find_by_correlation(&self, correlation_id: &str) -> Result<Vec<LogEntry>>;

    /// Returns up to `limit` entries for a trace, ordered by time, plus
    /// whether the result was truncated.
    async fn trace_timeline(&self, trace_id: &str, limit: usize) -> Result<(Vec<LogEntry>, bool)>;

    async fn top_issues(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<TopIssue>>;
}

/// Hourly rollup storage, written by the Aggregator and read by Analytics.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    async fn upsert_aggregate(&self, aggregate: Aggregate) -> Result<()>;

    async fn query_aggregates(&self, query: AggregateQuery) -> Result<Vec<Aggregate>>;
}
