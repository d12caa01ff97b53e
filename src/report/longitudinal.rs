use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use super::QuarterView;
use crate::error::EngineResult;
use crate::models::Observation;
use crate::stats::{round1, share};

const TREND_BAND: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongitudinalTrend {
    Improving,
    Stable,
    Declining,
}

impl LongitudinalTrend {
    /// `delta` is the change in low-capacity share, in percentage points.
    pub fn from_delta(delta: f64) -> Self {
        if delta < -TREND_BAND {
            LongitudinalTrend::Improving
        } else if delta > TREND_BAND {
            LongitudinalTrend::Declining
        } else {
            LongitudinalTrend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongitudinalComparison {
    pub prior_quarter: String,
    pub prior_observations: usize,
    pub prior_low_percent: f64,
    pub current_low_percent: f64,
    pub delta: f64,
    pub trend: LongitudinalTrend,
}

/// Compares low-capacity share against the preceding quarter, when that
/// quarter has enough observations of its own.
pub fn compare(
    observations: &[Observation],
    current: &QuarterView<'_>,
    offset: FixedOffset,
    minimum: usize,
) -> EngineResult<Option<LongitudinalComparison>> {
    let prior_quarter = current.quarter.previous()?;
    let prior = QuarterView::new(observations, prior_quarter, offset);
    if prior.len() < minimum.max(1) {
        return Ok(None);
    }

    let prior_low = share(prior.low_count(), prior.len());
    let current_low = share(current.low_count(), current.len());
    let delta = round1(current_low - prior_low);

    Ok(Some(LongitudinalComparison {
        prior_quarter: prior_quarter.to_string(),
        prior_observations: prior.len(),
        prior_low_percent: round1(prior_low),
        current_low_percent: round1(current_low),
        delta,
        trend: LongitudinalTrend::from_delta(delta),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CapacityState::{High, Low};
    use crate::report::fixtures::{at, view};
    use chrono::{TimeZone, Utc};

    fn prior_quarter(low: usize, high: usize) -> Vec<Observation> {
        let mut observations = Vec::new();
        for i in 0..low {
            let ts = Utc.with_ymd_and_hms(2025, 11, 1 + i as u32, 9, 0, 0).unwrap();
            observations.push(Observation::new(Low, ts));
        }
        for i in 0..high {
            let ts = Utc.with_ymd_and_hms(2025, 12, 1 + i as u32, 9, 0, 0).unwrap();
            observations.push(Observation::new(High, ts));
        }
        observations
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn trend_bands() {
        assert_eq!(LongitudinalTrend::from_delta(-5.1), LongitudinalTrend::Improving);
        assert_eq!(LongitudinalTrend::from_delta(-5.0), LongitudinalTrend::Stable);
        assert_eq!(LongitudinalTrend::from_delta(5.0), LongitudinalTrend::Stable);
        assert_eq!(LongitudinalTrend::from_delta(5.1), LongitudinalTrend::Declining);
    }

    #[test]
    fn fewer_low_entries_is_improving() {
        let mut observations = prior_quarter(5, 5);
        observations.extend((1..=10).map(|d| at(1, d, 9, if d <= 2 { Low } else { High })));
        let current = view(&observations);
        let comparison = compare(&observations, &current, utc(), 7).unwrap().unwrap();
        assert_eq!(comparison.prior_quarter, "2025-Q4");
        assert_eq!(comparison.prior_low_percent, 50.0);
        assert_eq!(comparison.current_low_percent, 20.0);
        assert_eq!(comparison.delta, -30.0);
        assert_eq!(comparison.trend, LongitudinalTrend::Improving);
    }

    #[test]
    fn empty_prior_quarter_is_skipped_even_without_a_gate() {
        let observations: Vec<Observation> = (1..=10).map(|d| at(1, d, 9, High)).collect();
        let current = view(&observations);
        assert!(compare(&observations, &current, utc(), 0).unwrap().is_none());
    }

    #[test]
    fn thin_prior_quarter_is_skipped() {
        let mut observations = prior_quarter(3, 3);
        observations.extend((1..=10).map(|d| at(1, d, 9, High)));
        let current = view(&observations);
        assert!(compare(&observations, &current, utc(), 7).unwrap().is_none());
    }
}
