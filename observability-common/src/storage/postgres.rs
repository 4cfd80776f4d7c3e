//! Postgres-backed implementations of [`super::LogStore`] and
//! [`super::AggregateStore`].
//!
//! Batch writes use `sqlx::QueryBuilder::push_values`, the same shape the
//! ingestion workers in the wider example pack use to fold many rows into
//! one round trip instead of one `INSERT` per row.

use super::{AggregateQuery, LogQuery, LogStore, TopIssue};
use crate::errors::{ObservabilityError, Result};
use crate::model::{Aggregate, CorrelationContext, LogEntry, LogLevel, MetricType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

fn level_from_db(s: &str) -> LogLevel {
    s.parse().unwrap_or(LogLevel::Info)
}

fn row_to_entry(row: &sqlx::postgres::PgRow) -> Result<LogEntry> {
    use sqlx::Row;
    let level_str: String = row.try_get("level")?;
    let context_json: serde_json::Value = row.try_get("context")?;
    let context: CorrelationContext = serde_json::from_value(context_json)
        .map_err(|e| ObservabilityError::Internal(format!("corrupt context column: {e}")))?;
    Ok(LogEntry {
        id: Some(row.try_get("id")?),
        created_at: row.try_get("created_at")?,
        service: row.try_get("service")?,
        level: level_from_db(&level_str),
        message: row.try_get("message")?,
        user_id: row.try_get("user_id")?,
        tags: row.try_get::<Vec<String>, _>("tags")?,
        metadata: row.try_get("metadata")?,
        context,
        correlation_id: row.try_get("correlation_id")?,
    })
}

/// `logs.entries`-backed store.
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn insert(&self, entry: LogEntry) -> Result<LogEntry> {
        let context_json = serde_json::to_value(&entry.context)
            .map_err(|e| ObservabilityError::Internal(e.to_string()))?;
        let row = sqlx::query(
            r"
            INSERT INTO logs.entries
                (created_at, service, level, message, user_id, tags, metadata, context, correlation_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at, service, level, message, user_id, tags, metadata, context, correlation_id
            ",
        )
        .bind(entry.created_at)
        .bind(&entry.service)
        .bind(entry.level.as_str())
        .bind(&entry.message)
        .bind(entry.user_id)
        .bind(&entry.tags)
        .bind(&entry.metadata)
        .bind(&context_json)
        .bind(&entry.correlation_id)
        .fetch_one(&self.pool)
        .await?;
        row_to_entry(&row)
    }

    async fn insert_batch(&self, entries: Vec<LogEntry>) -> Result<Vec<LogEntry>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self.pool.begin().await?;
        let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            "INSERT INTO logs.entries (created_at, service, level, message, user_id, tags, metadata, context, correlation_id) ",
        );
        builder.push_values(&entries, |mut b, entry| {
            let context_json = serde_json::to_value(&entry.context).unwrap_or(serde_json::Value::Null);
            b.push_bind(entry.created_at)
                .push_bind(&entry.service)
                .push_bind(entry.level.as_str())
                .push_bind(&entry.message)
                .push_bind(entry.user_id)
                .push_bind(&entry.tags)
                .push_bind(&entry.metadata)
                .push_bind(context_json)
                .push_bind(&entry.correlation_id);
        });
        builder.push(
            " RETURNING id, created_at, service, level, message, user_id, tags, metadata, context, correlation_id",
        );
        let rows = builder.build().fetch_all(&mut *tx).await?;
        tx.commit().await?;
        rows.iter().map(row_to_entry).collect()
    }

    async fn query(&self, query: LogQuery) -> Result<Vec<LogEntry>> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, created_at, service, level, message, user_id, tags, metadata, context, correlation_id FROM logs.entries WHERE 1=1",
        );
        if let Some(service) = &query.service {
            builder.push(" AND service = ").push_bind(service);
        }
        if let Some(level) = query.level {
            builder.push(" AND level = ").push_bind(level.as_str());
        }
        if let Some(correlation_id) = &query.correlation_id {
            builder
                .push(" AND correlation_id = ")
                .push_bind(correlation_id);
        }
        if let Some(since) = query.since {
            builder.push(" AND created_at >= ").push_bind(since);
        }
        if let Some(until) = query.until {
            builder.push(" AND created_at < ").push_bind(until);
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_entry).collect()
    }

    async fn find_by_correlation(&self, correlation_id: &str) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(
            "SELECT id, created_at, service, level, message, user_id, tags, metadata, context, correlation_id
             FROM logs.entries WHERE correlation_id = $1 ORDER BY created_at ASC",
        )
        .bind(correlation_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_entry).collect()
    }

    async fn trace_timeline(&self, trace_id: &str, limit: usize) -> Result<(Vec<LogEntry>, bool)> {
        let fetch_limit = limit as i64 + 1;
        let rows = sqlx::query(
            "SELECT id, created_at, service, level, message, user_id, tags, metadata, context, correlation_id
             FROM logs.entries WHERE context ->> 'trace_id' = $1 ORDER BY created_at ASC LIMIT $2",
        )
        .bind(trace_id)
        .bind(fetch_limit)
        .fetch_all(&self.pool)
        .await?;
        let truncated = rows.len() > limit;
        let mut entries: Vec<LogEntry> = rows.iter().map(row_to_entry).collect::<Result<_>>()?;
        entries.truncate(limit);
        Ok((entries, truncated))
    }

    async fn top_issues(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<TopIssue>> {
        use sqlx::Row;
        let rows = sqlx::query(
            r"
            SELECT service, level, message, COUNT(*) AS count,
                   MIN(created_at) AS first_seen, MAX(created_at) AS last_seen
            FROM logs.entries
            WHERE created_at >= $1 AND level IN ('warn', 'error')
            GROUP BY service, level, message
            ORDER BY count DESC
            LIMIT $2
            ",
        )
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(TopIssue {
                    service: row.try_get("service")?,
                    level: level_from_db(&row.try_get::<String, _>("level")?),
                    message: row.try_get("message")?,
                    count: row.try_get("count")?,
                    first_seen: row.try_get("first_seen")?,
                    last_seen: row.try_get("last_seen")?,
                })
            })
            .collect()
    }
}

/// `analytics.aggregations`-backed store.
pub struct PgAggregateStore {
    pool: PgPool,
}

impl PgAggregateStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::AggregateStore for PgAggregateStore {
    async fn upsert_aggregate(&self, aggregate: Aggregate) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO analytics.aggregations (metric_type, service, time_bucket, value, metadata)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (metric_type, service, time_bucket)
            DO UPDATE SET value = excluded.value, metadata = excluded.metadata
            ",
        )
        .bind(aggregate.metric_type.as_str())
        .bind(&aggregate.service)
        .bind(aggregate.time_bucket)
        .bind(aggregate.value)
        .bind(&aggregate.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_aggregates(&self, query: AggregateQuery) -> Result<Vec<Aggregate>> {
        use sqlx::Row;
        let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            "SELECT metric_type, service, time_bucket, value, metadata FROM analytics.aggregations WHERE time_bucket >= ",
        );
        builder.push_bind(query.since);
        builder.push(" AND time_bucket < ");
        builder.push_bind(query.until);
        if let Some(metric_type) = query.metric_type {
            builder.push(" AND metric_type = ").push_bind(metric_type.as_str());
        }
        if let Some(service) = &query.service {
            builder.push(" AND service = ").push_bind(service);
        }
        builder.push(" ORDER BY time_bucket ASC");
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                let metric_type_str: String = row.try_get("metric_type")?;
                let metric_type = match metric_type_str.as_str() {
                    "error_frequency" => MetricType::ErrorFrequency,
                    "warn_frequency" => MetricType::WarnFrequency,
                    _ => MetricType::ServiceActivity,
                };
                Ok(Aggregate {
                    metric_type,
                    service: row.try_get("service")?,
                    time_bucket: row.try_get("time_bucket")?,
                    value: row.try_get("value")?,
                    metadata: row.try_get("metadata")?,
                })
            })
            .collect()
    }
}
