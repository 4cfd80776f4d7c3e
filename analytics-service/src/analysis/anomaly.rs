//! Z-score anomaly detection over a series of hourly aggregate values.

use serde::Serialize;

const ANOMALY_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

fn severity_for(z: f64) -> Option<Severity> {
    let z = z.abs();
    if z > 3.0 {
        Some(Severity::High)
    } else if z >= 2.5 {
        Some(Severity::Medium)
    } else if z >= ANOMALY_THRESHOLD {
        Some(Severity::Low)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    pub index: usize,
    pub value: f64,
    pub z_score: f64,
    pub severity: Severity,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_stddev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Flags points at least 2 population standard deviations from the series
/// mean. Series shorter than 3 points never produce anomalies: there isn't
/// enough data to estimate a meaningful spread. The threshold itself is
/// inclusive, so a point sitting exactly on a band edge (`z == 2.0`,
/// `z == 2.5`) is still flagged at that band's severity rather than
/// silently dropped or bumped up a tier.
#[must_use]
pub fn detect_anomalies(series: &[f64]) -> Vec<Anomaly> {
    if series.len() < 3 {
        return Vec::new();
    }
    let mean = mean(series);
    let stddev = population_stddev(series, mean);
    if stddev == 0.0 {
        return Vec::new();
    }
    series
        .iter()
        .enumerate()
        .filter_map(|(index, &value)| {
            let z_score = (value - mean) / stddev;
            severity_for(z_score).map(|severity| Anomaly {
                index,
                value,
                z_score,
                severity,
            })
        })
        .collect()
}
