//! Trend direction over a series of hourly aggregate values.

use serde::Serialize;

const STABLE_THRESHOLD_PERCENT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub percent_change: f64,
}

/// Compares the first and last points in a series; a change smaller than
/// `STABLE_THRESHOLD_PERCENT` in magnitude is reported as `Stable`
/// regardless of sign.
#[must_use]
pub fn compute_trend(series: &[f64]) -> Option<Trend> {
    let first = *series.first()?;
    let last = *series.last()?;

    let percent_change = if first == 0.0 {
        if last == 0.0 { 0.0 } else { 100.0 }
    } else {
        ((last - first) / first) * 100.0
    };

    let direction = if percent_change.abs() < STABLE_THRESHOLD_PERCENT {
        TrendDirection::Stable
    } else if percent_change > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    Some(Trend {
        direction,
        percent_change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decreasing_series_is_flagged_decreasing() {
        let trend = compute_trend(&[100.0, 90.0, 80.0]).unwrap();
        assert_eq!(trend.direction, TrendDirection::Decreasing);
        assert!((trend.percent_change - (-20.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn series_within_threshold_is_stable() {
        let trend = compute_trend(&[100.0, 104.0, 108.0]).unwrap();
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn increasing_series_is_flagged_increasing() {
        let trend = compute_trend(&[100.0, 120.0, 150.0]).unwrap();
        assert_eq!(trend.direction, TrendDirection::Increasing);
        assert!((trend.percent_change - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_series_has_no_trend() {
        assert!(compute_trend(&[]).is_none());
    }

    #[test]
    fn single_point_is_stable_by_definition() {
        let trend = compute_trend(&[42.0]).unwrap();
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.percent_change, 0.0);
    }
}
