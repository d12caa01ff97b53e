use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::config::Thresholds;
use crate::models::{DailyPoint, ProjectionResult};
use crate::stats::{mean, round1};

const DEGENERATE_DENOMINATOR: f64 = 1e-9;

/// Weight for each index of an `n`-point slice, oldest first; the most recent
/// point has weight 1.
pub fn recency_weights(n: usize, decay: f64) -> Vec<f64> {
    (0..n).map(|i| decay.powi((n - 1 - i) as i32)).collect()
}

/// Weighted least-squares fit of `value = slope * index + intercept`.
///
/// Falls back to a flat line through the unweighted mean when the normal
/// equations are degenerate.
pub fn fit_weighted(values: &[f64], decay: f64) -> (f64, f64) {
    let weights = recency_weights(values.len(), decay);
    let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);

    for (i, (value, weight)) in values.iter().zip(&weights).enumerate() {
        let x = i as f64;
        sw += weight;
        sx += weight * x;
        sy += weight * value;
        sxx += weight * x * x;
        sxy += weight * x * value;
    }

    let denominator = sw * sxx - sx * sx;
    if denominator.abs() < DEGENERATE_DENOMINATOR {
        return (0.0, mean(values.iter().copied()).unwrap_or(0.0));
    }

    let slope = (sw * sxy - sx * sy) / denominator;
    let intercept = (sy - slope * sx) / sw;
    (slope, intercept)
}

/// Projects a declining capacity trend forward.
///
/// Returns `None` when fewer than `min_projection_days` days fall in the
/// lookback ending at `reference`, or when the fitted slope is not steep
/// enough to count as a decline.
pub fn project_trend(
    points: &[DailyPoint],
    reference: NaiveDate,
    thresholds: &Thresholds,
) -> Option<ProjectionResult> {
    let lookback = Duration::days(thresholds.projection_lookback_days.max(1) as i64 - 1);
    let lookback_start = reference.checked_sub_signed(lookback).unwrap_or(NaiveDate::MIN);
    let recent: Vec<f64> = points
        .iter()
        .filter(|point| point.date >= lookback_start && point.date <= reference)
        .map(|point| point.value)
        .collect();

    // A line needs two points whatever the configured gate says.
    let required = thresholds.min_projection_days.max(2);
    if recent.len() < required {
        debug!(
            days = recent.len(),
            required,
            "not enough recent days to project"
        );
        return None;
    }

    let skip = recent.len().saturating_sub(thresholds.projection_slice_days.max(2));
    let slice = &recent[skip..];
    let (slope, intercept) = fit_weighted(slice, thresholds.projection_decay);

    if slope > thresholds.decline_slope {
        debug!(slope, "trend is flat or improving; no projection");
        return None;
    }

    let last_index = (slice.len() - 1) as f64;
    let series: Vec<f64> = (1..=thresholds.projection_horizon_days)
        .map(|step| (slope * (last_index + step as f64) + intercept).clamp(0.0, 100.0))
        .collect();

    let weeks_to_critical = series
        .iter()
        .position(|value| *value <= thresholds.critical_level)
        .map(|index| round1((index + 1) as f64 / 7.0));

    debug!(slope, ?weeks_to_critical, "declining trend projected");

    Some(ProjectionResult {
        series,
        weekly_rate: round1(slope * 7.0),
        weeks_to_critical,
        slope,
        intercept,
    })
}
