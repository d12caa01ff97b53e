use serde::{Deserialize, Serialize};

use super::QuarterView;
use crate::models::DailyPoint;
use crate::pattern;
use crate::stats::{mean, round1};

const TRANSITION_SCALE: f64 = 150.0;
const RECOVERY_SCALE: f64 = 4.0;

/// Quarter-level stability, switching and recovery measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDynamics {
    /// From day-level means, same scale as the pattern classifier.
    pub stability: u32,
    pub day_volatility: f64,
    /// Share of consecutive observations whose state differs, 0-100.
    pub transition_rate: f64,
    pub volatility_score: u32,
    pub recoveries: usize,
    pub recovery_lag_hours: f64,
    pub recovery_lag_score: u32,
}

pub fn analyze(view: &QuarterView<'_>, daily: &[DailyPoint]) -> ReportDynamics {
    let day_volatility = pattern::volatility(daily);

    let transition_fraction = if view.len() < 2 {
        0.0
    } else {
        let switches = view
            .entries
            .windows(2)
            .filter(|pair| pair[0].observation.state != pair[1].observation.state)
            .count();
        switches as f64 / (view.len() - 1) as f64
    };

    let lags = recovery_lags(view);
    let lag_hours = mean(lags.iter().copied()).unwrap_or(0.0);

    ReportDynamics {
        stability: pattern::stability(day_volatility),
        day_volatility: round1(day_volatility),
        transition_rate: round1(transition_fraction * 100.0),
        volatility_score: scaled_score(transition_fraction * TRANSITION_SCALE),
        recoveries: lags.len(),
        recovery_lag_hours: round1(lag_hours),
        recovery_lag_score: scaled_score(lag_hours * RECOVERY_SCALE),
    }
}

/// Hours from the first low entry of each run to the entry that ends it.
/// A run still open at the end of the quarter is not a recovery.
fn recovery_lags(view: &QuarterView<'_>) -> Vec<f64> {
    let mut lags = Vec::new();
    let mut run_start = None;

    for entry in &view.entries {
        match (entry.is_low(), run_start) {
            (true, None) => run_start = Some(entry.observation.timestamp),
            (false, Some(started)) => {
                let minutes = (entry.observation.timestamp - started).num_minutes();
                lags.push(minutes as f64 / 60.0);
                run_start = None;
            }
            _ => {}
        }
    }

    lags
}

fn scaled_score(raw: f64) -> u32 {
    raw.round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CapacityState::{High, Low, Moderate};
    use crate::report::fixtures::{at, view};

    #[test]
    fn steady_high_quarter_is_calm() {
        let observations: Vec<_> = (1..=10).map(|d| at(1, d, 9, High)).collect();
        let view = view(&observations);
        let dynamics = analyze(&view, &view.daily_means());
        assert_eq!(dynamics.stability, 100);
        assert_eq!(dynamics.volatility_score, 0);
        assert_eq!(dynamics.recoveries, 0);
        assert_eq!(dynamics.recovery_lag_score, 0);
    }

    #[test]
    fn measures_recovery_from_low_run() {
        let observations = vec![
            at(1, 1, 9, High),
            at(1, 2, 9, Low),
            at(1, 2, 21, Low),
            at(1, 3, 9, Moderate),
        ];
        let view = view(&observations);
        let dynamics = analyze(&view, &view.daily_means());
        assert_eq!(dynamics.recoveries, 1);
        assert_eq!(dynamics.recovery_lag_hours, 24.0);
        assert_eq!(dynamics.recovery_lag_score, 96);
        // Two switches over three transitions, scaled past the cap.
        assert_eq!(dynamics.transition_rate, 66.7);
        assert_eq!(dynamics.volatility_score, 100);
    }

    #[test]
    fn open_low_run_is_not_a_recovery() {
        let observations = vec![at(1, 1, 9, High), at(1, 2, 9, Low), at(1, 5, 9, Low)];
        let view = view(&observations);
        let dynamics = analyze(&view, &view.daily_means());
        assert_eq!(dynamics.recoveries, 0);
        assert_eq!(dynamics.recovery_lag_hours, 0.0);
    }

    #[test]
    fn occasional_switching_scales_by_one_and_a_half() {
        // One switch in ten transitions: 10% * 1.5 = 15.
        let mut observations: Vec<_> = (1..=5).map(|d| at(1, d, 9, High)).collect();
        observations.extend((6..=11).map(|d| at(1, d, 9, Moderate)));
        let view = view(&observations);
        let dynamics = analyze(&view, &view.daily_means());
        assert_eq!(dynamics.volatility_score, 15);
    }
}
