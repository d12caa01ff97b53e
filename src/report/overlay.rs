//! Explanatory overlay: capacity composition and low-week event correlation.
//!
//! These are heuristics, not causal inference. Nothing else in the report
//! depends on them and they are dropped when `include_heuristics` is off.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::drivers::{top_depleters, DriverCorrelation};
use super::rhythm::{lowest_week, WeeklyPoint};
use super::{Entry, QuarterView};
use crate::models::Category;
use crate::stats::{mean, round1, share};

const IMPACT_SCALE: f64 = 2.0;
const IMPACT_BAND: i32 = 15;
const MIN_WEEKS: usize = 3;
const PRECEDING_DAYS: i64 = 10;
const EARLY_MORNING: std::ops::Range<u32> = 5..9;
const AFTERNOON: std::ops::Range<u32> = 12..17;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicOverlay {
    pub composition: Vec<CompositionFactor>,
    pub event: Option<EventCorrelation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionKind {
    EarlyMorning,
    Afternoon,
    ContextDemands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLabel {
    Depleting,
    Neutral,
    Compensatory,
}

impl ImpactLabel {
    pub fn from_impact(impact: i32) -> Self {
        if impact <= -IMPACT_BAND {
            ImpactLabel::Depleting
        } else if impact >= IMPACT_BAND {
            ImpactLabel::Compensatory
        } else {
            ImpactLabel::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionFactor {
    pub kind: CompositionKind,
    pub basis: usize,
    pub low_rate: f64,
    /// Negative when the factor is lower-capacity than the quarter overall.
    pub impact: i32,
    pub label: ImpactLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventConclusion {
    InsufficientHistory,
    DepletedMornings,
    CumulativeDemand,
    PreexistingDecline,
    NoClearPrecursor,
}

impl EventConclusion {
    pub fn sentence(self) -> &'static str {
        match self {
            EventConclusion::InsufficientHistory => {
                "There were too few entries before the lowest week to suggest what preceded it."
            }
            EventConclusion::DepletedMornings => {
                "The lowest week followed a run of depleted early mornings, suggesting \
                 overnight recovery was not restoring capacity."
            }
            EventConclusion::CumulativeDemand => {
                "The lowest week followed a period dense with demand-related entries, \
                 consistent with cumulative load."
            }
            EventConclusion::PreexistingDecline => {
                "Capacity was already running below the quarterly baseline in the days \
                 before the lowest week."
            }
            EventConclusion::NoClearPrecursor => {
                "The lowest week arrived without a clear preceding signal; it may reflect \
                 factors not captured in the log."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCorrelation {
    pub week_start: chrono::NaiveDate,
    pub week_mean: f64,
    pub weeks_considered: usize,
    pub preceding_entries: usize,
    pub early_morning_low_rate: Option<f64>,
    pub baseline_delta: Option<f64>,
    pub demand_density: Option<f64>,
    pub conclusion: EventConclusion,
    pub explanation: String,
}

pub fn analyze(
    view: &QuarterView<'_>,
    drivers: &[DriverCorrelation],
    weekly: &[WeeklyPoint],
) -> HeuristicOverlay {
    HeuristicOverlay {
        composition: composition(view, drivers),
        event: event_correlation(view, weekly),
    }
}

fn low_rate(entries: &[&Entry<'_>]) -> f64 {
    share(entries.iter().filter(|entry| entry.is_low()).count(), entries.len())
}

fn factor(
    kind: CompositionKind,
    basis: usize,
    factor_low: f64,
    overall_low: f64,
) -> CompositionFactor {
    let impact = ((overall_low - factor_low) * IMPACT_SCALE)
        .round()
        .clamp(-100.0, 100.0) as i32;
    CompositionFactor {
        kind,
        basis,
        low_rate: round1(factor_low),
        impact,
        label: ImpactLabel::from_impact(impact),
    }
}

pub fn composition(
    view: &QuarterView<'_>,
    drivers: &[DriverCorrelation],
) -> Vec<CompositionFactor> {
    let all: Vec<&Entry<'_>> = view.entries.iter().collect();
    let overall = low_rate(&all);
    let mut factors = Vec::new();

    for (kind, hours) in [
        (CompositionKind::EarlyMorning, EARLY_MORNING),
        (CompositionKind::Afternoon, AFTERNOON),
    ] {
        let bucket: Vec<&Entry<'_>> = all
            .iter()
            .copied()
            .filter(|entry| hours.contains(&entry.hour()))
            .collect();
        if !bucket.is_empty() {
            factors.push(factor(kind, bucket.len(), low_rate(&bucket), overall));
        }
    }

    let top = top_depleters(drivers);
    if let Some(depletion) = mean(top.iter().map(|driver| driver.depletion_rate)) {
        let basis = top.iter().map(|driver| driver.count).sum();
        factors.push(factor(CompositionKind::ContextDemands, basis, depletion, overall));
    }

    factors
}

pub fn event_correlation(
    view: &QuarterView<'_>,
    weekly: &[WeeklyPoint],
) -> Option<EventCorrelation> {
    if weekly.len() < MIN_WEEKS {
        return None;
    }
    let week = lowest_week(weekly)?;
    let from = week.week_start - Duration::days(PRECEDING_DAYS);
    let preceding: Vec<&Entry<'_>> = view
        .entries
        .iter()
        .filter(|entry| entry.date >= from && entry.date < week.week_start)
        .collect();

    let mornings: Vec<&Entry<'_>> = preceding
        .iter()
        .copied()
        .filter(|entry| EARLY_MORNING.contains(&entry.hour()))
        .collect();
    let early_morning_low_rate = (!mornings.is_empty()).then(|| low_rate(&mornings));

    let quarter_mean = mean(view.entries.iter().map(|entry| entry.score()));
    let preceding_mean = mean(preceding.iter().map(|entry| entry.score()));
    let baseline_delta = preceding_mean.zip(quarter_mean).map(|(p, q)| p - q);

    let demand_density = (!preceding.is_empty()).then(|| {
        let demand = preceding
            .iter()
            .filter(|entry| entry.observation.category == Some(Category::Demand))
            .count();
        share(demand, preceding.len())
    });

    let conclusion = if preceding.is_empty() {
        EventConclusion::InsufficientHistory
    } else if early_morning_low_rate.is_some_and(|rate| rate > 50.0) {
        EventConclusion::DepletedMornings
    } else if demand_density.is_some_and(|density| density > 40.0) {
        EventConclusion::CumulativeDemand
    } else if baseline_delta.is_some_and(|delta| delta < -10.0) {
        EventConclusion::PreexistingDecline
    } else {
        EventConclusion::NoClearPrecursor
    };

    Some(EventCorrelation {
        week_start: week.week_start,
        week_mean: round1(week.mean_score),
        weeks_considered: weekly.len(),
        preceding_entries: preceding.len(),
        early_morning_low_rate: early_morning_low_rate.map(round1),
        baseline_delta: baseline_delta.map(round1),
        demand_density: demand_density.map(round1),
        conclusion,
        explanation: conclusion.sentence().to_string(),
    })
}
