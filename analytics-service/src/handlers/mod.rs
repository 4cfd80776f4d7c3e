pub mod anomaly;
pub mod export;
pub mod health;
pub mod top_issues;
pub mod trend;
