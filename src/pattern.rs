//! Continuity, stability and the interpretability verdict.
//!
//! Scores live on the fixed 0-100 capacity scale, so the largest possible
//! day-over-day change is 100 and volatility needs no further normalization
//! before it is subtracted from 100.

use crate::models::{ContinuityRating, DailyPoint, DateWindow, PatternMetrics, Verdict};
use crate::temporal::inclusive_days;

/// Rounded share of window days that carry data, clamped to 0-100.
pub fn continuity(days_with_data: u32, days_in_window: u32) -> u32 {
    if days_in_window == 0 {
        return 0;
    }
    let percent = (100.0 * days_with_data as f64 / days_in_window as f64).round();
    percent.clamp(0.0, 100.0) as u32
}

pub fn continuity_rating(continuity: u32) -> ContinuityRating {
    if continuity >= 70 {
        ContinuityRating::High
    } else if continuity >= 40 {
        ContinuityRating::Moderate
    } else {
        ContinuityRating::Low
    }
}

/// Mean absolute day-over-day change of the daily means.
pub fn volatility(points: &[DailyPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let total: f64 = points
        .windows(2)
        .map(|pair| (pair[1].value - pair[0].value).abs())
        .sum();
    total / (points.len() - 1) as f64
}

pub fn stability(volatility: f64) -> u32 {
    (100.0 - volatility.min(100.0)).round().clamp(0.0, 100.0) as u32
}

struct VerdictRule {
    applies: fn(u32, u32) -> bool,
    verdict: Verdict,
}

fn sparse(_stability: u32, continuity: u32) -> bool {
    continuity < 40
}

fn steady_dense(stability: u32, continuity: u32) -> bool {
    stability >= 80 && continuity >= 70
}

fn steady(stability: u32, _continuity: u32) -> bool {
    stability >= 80
}

fn variable_dense(stability: u32, continuity: u32) -> bool {
    stability >= 50 && continuity >= 70
}

fn variable(stability: u32, _continuity: u32) -> bool {
    stability >= 50
}

fn unstable_dense(_stability: u32, continuity: u32) -> bool {
    continuity >= 70
}

fn always(_stability: u32, _continuity: u32) -> bool {
    true
}

/// Evaluated top to bottom; the first matching rule decides.
const VERDICT_RULES: &[VerdictRule] = &[
    VerdictRule {
        applies: sparse,
        verdict: Verdict::InsufficientObservation,
    },
    VerdictRule {
        applies: steady_dense,
        verdict: Verdict::InterpretableTrends,
    },
    VerdictRule {
        applies: steady,
        verdict: Verdict::PartialTrends,
    },
    VerdictRule {
        applies: variable_dense,
        verdict: Verdict::VariablePatterns,
    },
    VerdictRule {
        applies: variable,
        verdict: Verdict::PartialPatterns,
    },
    VerdictRule {
        applies: unstable_dense,
        verdict: Verdict::HighlyVariable,
    },
    VerdictRule {
        applies: always,
        verdict: Verdict::InsufficientStability,
    },
];

pub fn verdict(stability: u32, continuity: u32) -> Verdict {
    VERDICT_RULES
        .iter()
        .find(|rule| (rule.applies)(stability, continuity))
        .map(|rule| rule.verdict)
        .unwrap_or(Verdict::InsufficientStability)
}

/// Classifies a daily series over the window it covers.
pub fn classify(points: &[DailyPoint], window: &DateWindow) -> PatternMetrics {
    let days_with_data = points.iter().filter(|p| window.contains(p.date)).count() as u32;
    let days_in_window = inclusive_days(window.start, window.end);
    let continuity = continuity(days_with_data, days_in_window);
    let volatility = volatility(points);
    let stability = stability(volatility);

    PatternMetrics {
        days_with_data,
        days_in_window,
        continuity,
        continuity_rating: continuity_rating(continuity),
        volatility,
        stability,
        verdict: verdict(stability, continuity),
    }
}
