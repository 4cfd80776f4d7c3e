//! In-memory storage backends used by handler unit tests, so the test suite
//! never needs a live Postgres instance.

use super::{AggregateQuery, LogQuery, LogStore, TopIssue};
use crate::errors::Result;
use crate::model::{Aggregate, LogEntry, MetricType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// In-memory, append-only log store backed by a `Vec` behind a lock.
#[derive(Default)]
pub struct InMemoryLogStore {
    entries: RwLock<Vec<LogEntry>>,
    next_id: AtomicI64,
}

impl InMemoryLogStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn assign_id(&self, mut entry: LogEntry) -> LogEntry {
        entry.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst));
        entry
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn insert(&self, entry: LogEntry) -> Result<LogEntry> {
        let entry = self.assign_id(entry);
        self.entries.write().push(entry.clone());
        Ok(entry)
    }

    async fn insert_batch(&self, entries: Vec<LogEntry>) -> Result<Vec<LogEntry>> {
        let assigned: Vec<LogEntry> = entries.into_iter().map(|e| self.assign_id(e)).collect();
        self.entries.write().extend(assigned.iter().cloned());
        Ok(assigned)
    }

    async fn query(&self, query: LogQuery) -> Result<Vec<LogEntry>> {
        let guard = self.entries.read();
        let mut matched: Vec<LogEntry> = guard
            .iter()
            .rev()
            .filter(|e| {
                query.service.as_deref().is_none_or(|s| e.service == s)
                    && query.level.is_none_or(|l| e.level == l)
                    && query
                        .correlation_id
                        .as_deref()
                        .is_none_or(|c| e.correlation_id == c)
                    && query.since.is_none_or(|since| e.created_at >= since)
                    && query.until.is_none_or(|until| e.created_at < until)
            })
            .cloned()
            .collect();
        let offset = query.offset.max(0) as usize;
        let limit = query.limit.max(0) as usize;
        if offset >= matched.len() {
            return Ok(Vec::new());
        }
        matched = matched.split_off(offset);
        matched.truncate(limit);
        Ok(matched)
    }

    async fn find_by_correlation(&self, correlation_id: &str) -> Result<Vec<LogEntry>> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|e| e.correlation_id == correlation_id)
            .cloned()
            .collect())
    }

    async fn trace_timeline(&self, trace_id: &str, limit: usize) -> Result<(Vec<LogEntry>, bool)> {
        let all: Vec<LogEntry> = self
            .entries
            .read()
            .iter()
            .filter(|e| e.context.trace_id.as_deref() == Some(trace_id))
            .cloned()
            .collect();
        let truncated = all.len() > limit;
        let mut all = all;
        all.truncate(limit);
        Ok((all, truncated))
    }

    async fn top_issues(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<TopIssue>> {
        use crate::model::LogLevel;
        let guard = self.entries.read();
        let mut groups: FxHashMap<(String, LogLevel, String), (i64, DateTime<Utc>, DateTime<Utc>)> =
            FxHashMap::default();
        for e in guard
            .iter()
            .filter(|e| e.created_at >= since && matches!(e.level, LogLevel::Warn | LogLevel::Error))
        {
            let key = (e.service.clone(), e.level, e.message.clone());
            let entry = groups
                .entry(key)
                .or_insert((0, e.created_at, e.created_at));
            entry.0 += 1;
            if e.created_at < entry.1 {
                entry.1 = e.created_at;
            }
            if e.created_at > entry.2 {
                entry.2 = e.created_at;
            }
        }
        let mut issues: Vec<TopIssue> = groups
            .into_iter()
            .map(|((service, level, message), (count, first_seen, last_seen))| TopIssue {
                service,
                level,
                message,
                count,
                first_seen,
                last_seen,
            })
            .collect();
        issues.sort_by(|a, b| b.count.cmp(&a.count));
        issues.truncate(limit);
        Ok(issues)
    }
}

/// In-memory aggregate store keyed by `(metric_type, service, time_bucket)`.
#[derive(Default)]
pub struct InMemoryAggregateStore {
    rows: RwLock<FxHashMap<(MetricType, String, DateTime<Utc>), Aggregate>>,
}

impl InMemoryAggregateStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(FxHashMap::default()),
        }
    }
}

#[async_trait]
impl super::AggregateStore for InMemoryAggregateStore {
    async fn upsert_aggregate(&self, aggregate: Aggregate) -> Result<()> {
        let key = (
            aggregate.metric_type,
            aggregate.service.clone(),
            aggregate.time_bucket,
        );
        self.rows.write().insert(key, aggregate);
        Ok(())
    }

    async fn query_aggregates(&self, query: AggregateQuery) -> Result<Vec<Aggregate>> {
        let guard = self.rows.read();
        let mut matched: Vec<Aggregate> = guard
            .values()
            .filter(|a| {
                query.metric_type.is_none_or(|m| a.metric_type == m)
                    && query.service.as_deref().is_none_or(|s| a.service == s)
                    && a.time_bucket >= query.since
                    && a.time_bucket < query.until
            })
            .cloned()
            .collect();
        matched.sort_by_key(|a| a.time_bucket);
        Ok(matched)
    }
}

/// Convenience alias used by tests that want a fresh store pair.
#[must_use]
pub fn new_memory_stores() -> (Arc<InMemoryLogStore>, Arc<InMemoryAggregateStore>) {
    (
        Arc::new(InMemoryLogStore::new()),
        Arc::new(InMemoryAggregateStore::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CorrelationContext, LogLevel};

    fn entry(service: &str, level: LogLevel, message: &str) -> LogEntry {
        LogEntry {
            id: None,
            created_at: Utc::now(),
            service: service.to_string(),
            level,
            message: message.to_string(),
            user_id: None,
            tags: vec![],
            metadata: serde_json::json!({}),
            context: CorrelationContext {
                correlation_id: "a".repeat(32),
                trace_id: None,
                span_id: None,
                request_id: None,
                user_id: None,
                session_id: None,
                service: service.to_string(),
                hostname: "localhost".to_string(),
                environment: "test".to_string(),
                version: "0.1.0".to_string(),
                method: None,
                path: None,
                remote_addr: None,
                timestamp: Utc::now(),
            },
            correlation_id: "a".repeat(32),
        }
    }

    #[tokio::test]
    async fn insert_assigns_incrementing_ids() {
        let store = InMemoryLogStore::new();
        let a = store.insert(entry("svc", LogLevel::Info, "a")).await.unwrap();
        let b = store.insert(entry("svc", LogLevel::Info, "b")).await.unwrap();
        assert!(b.id.unwrap() > a.id.unwrap());
    }

    #[tokio::test]
    async fn query_filters_by_service_and_level() {
        let store = InMemoryLogStore::new();
        store.insert(entry("billing", LogLevel::Error, "boom")).await.unwrap();
        store.insert(entry("billing", LogLevel::Info, "ok")).await.unwrap();
        store.insert(entry("auth", LogLevel::Error, "boom")).await.unwrap();

        let results = store
            .query(LogQuery {
                service: Some("billing".to_string()),
                level: Some(LogLevel::Error),
                correlation_id: None,
                since: None,
                until: None,
                limit: 100,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].service, "billing");
    }

    #[tokio::test]
    async fn top_issues_orders_by_count_descending() {
        let store = InMemoryLogStore::new();
        for _ in 0..5 {
            store.insert(entry("billing", LogLevel::Error, "timeout")).await.unwrap();
        }
        for _ in 0..2 {
            store.insert(entry("billing", LogLevel::Error, "rare")).await.unwrap();
        }
        let issues = store.top_issues(Utc::now() - chrono::Duration::hours(1), 10).await.unwrap();
        assert_eq!(issues[0].message, "timeout");
        assert_eq!(issues[0].count, 5);
    }
}
