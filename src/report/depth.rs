use serde::{Deserialize, Serialize};

use super::QuarterView;
use crate::models::CapacityState;
use crate::stats::percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthRating {
    Comprehensive,
    Substantial,
    Moderate,
    Limited,
}

impl DepthRating {
    pub fn from_coverage(coverage_percent: u32) -> Self {
        if coverage_percent >= 80 {
            DepthRating::Comprehensive
        } else if coverage_percent >= 50 {
            DepthRating::Substantial
        } else if coverage_percent >= 25 {
            DepthRating::Moderate
        } else {
            DepthRating::Limited
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDepth {
    pub total_observations: usize,
    pub unique_days: usize,
    pub days_elapsed: u32,
    pub coverage_percent: u32,
    pub rating: DepthRating,
}

pub fn record_depth(view: &QuarterView<'_>, days_elapsed: u32) -> RecordDepth {
    let unique_days = view.dates().len();
    let coverage_percent = percent(unique_days, days_elapsed as usize);
    RecordDepth {
        total_observations: view.len(),
        unique_days,
        days_elapsed,
        coverage_percent,
        rating: DepthRating::from_coverage(coverage_percent),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateShare {
    pub count: usize,
    pub percent: u32,
}

/// Counts are exact; rounded percents may sum to 99 or 101.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDistribution {
    pub total: usize,
    pub high: StateShare,
    pub moderate: StateShare,
    pub low: StateShare,
}

impl StateDistribution {
    pub fn share(&self, state: CapacityState) -> StateShare {
        match state {
            CapacityState::High => self.high,
            CapacityState::Moderate => self.moderate,
            CapacityState::Low => self.low,
        }
    }
}

pub fn distribution(view: &QuarterView<'_>) -> StateDistribution {
    let total = view.len();
    let share = |state: CapacityState| {
        let count = view
            .entries
            .iter()
            .filter(|entry| entry.observation.state == state)
            .count();
        StateShare {
            count,
            percent: percent(count, total),
        }
    };

    StateDistribution {
        total,
        high: share(CapacityState::High),
        moderate: share(CapacityState::Moderate),
        low: share(CapacityState::Low),
    }
}
