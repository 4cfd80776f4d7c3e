//! Ranks `(service, level, message)` clusters by occurrence count within a
//! lookback window. The heavy lifting — grouping and counting — happens in
//! the storage layer's `LogStore::top_issues`; this module only applies the
//! sweep cap and documents when it's hit.

use chrono::{DateTime, Utc};
use observability_common::storage::{LogStore, TopIssue};
use observability_common::Result;

const SWEEP_CAP: usize = 100;

pub async fn top_issues(store: &dyn LogStore, since: DateTime<Utc>, limit: usize) -> Result<Vec<TopIssue>> {
    let requested = limit.min(SWEEP_CAP);
    if limit > SWEEP_CAP {
        tracing::warn!(requested = limit, cap = SWEEP_CAP, "top_issues request capped");
    }
    store.top_issues(since, requested).await
}
