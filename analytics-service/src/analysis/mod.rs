pub mod anomaly;
pub mod top_issues;
pub mod trend;

pub use anomaly::{detect_anomalies, Anomaly, Severity};
pub use trend::{compute_trend, Trend, TrendDirection};
