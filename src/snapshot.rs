//! Lightweight pattern path: windowed metrics, a chart series and the
//! decline projection, without the full quarterly report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{covered_window, daily_means};
use crate::config::EngineConfig;
use crate::downsample::downsample;
use crate::error::EngineResult;
use crate::models::{DailyPoint, DateWindow, Observation, PatternMetrics, ProjectionResult};
use crate::pattern::classify;
use crate::projection::project_trend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    /// Window the caller asked for.
    pub window: DateWindow,
    /// Earliest to latest observed date inside `window`.
    pub covered: DateWindow,
    pub metrics: PatternMetrics,
    pub daily: Vec<DailyPoint>,
    pub chart: Vec<f64>,
    pub projection: Option<ProjectionResult>,
}

/// Computes the pattern snapshot, or `None` when fewer than
/// `config.minimum_days` distinct dates carry observations.
pub fn pattern_snapshot(
    observations: &[Observation],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> EngineResult<Option<PatternSnapshot>> {
    config.validate()?;
    let offset = config.reporting_offset()?;
    let window = config.resolve_window(now)?;
    let daily = daily_means(observations, &window, offset);

    if daily.len() < config.minimum_days {
        debug!(
            unique_days = daily.len(),
            required = config.minimum_days,
            "not enough observed days for a pattern snapshot"
        );
        return Ok(None);
    }

    let covered = covered_window(&daily).unwrap_or(window);
    let metrics = classify(&daily, &covered);
    let values: Vec<f64> = daily.iter().map(|point| point.value).collect();
    let chart = downsample(&values, config.chart_points);
    let projection = project_trend(&daily, window.end, &config.thresholds);

    debug!(
        continuity = metrics.continuity,
        stability = metrics.stability,
        verdict = %metrics.verdict,
        "pattern snapshot computed"
    );

    Ok(Some(PatternSnapshot {
        window,
        covered,
        metrics,
        daily,
        chart,
        projection,
    }))
}
