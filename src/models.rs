use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Self-reported functional capacity at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityState {
    High,
    Moderate,
    Low,
}

impl CapacityState {
    /// Fixed 0-100 score used by every numeric analysis.
    pub fn score(self) -> f64 {
        match self {
            CapacityState::High => 100.0,
            CapacityState::Moderate => 50.0,
            CapacityState::Low => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CapacityState::High => "high",
            CapacityState::Moderate => "moderate",
            CapacityState::Low => "low",
        }
    }

    pub fn is_low(self) -> bool {
        self == CapacityState::Low
    }
}

impl fmt::Display for CapacityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapacityState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "high-capacity" | "high_capacity" => Ok(CapacityState::High),
            "moderate" | "moderate-capacity" | "moderate_capacity" => Ok(CapacityState::Moderate),
            "low" | "low-capacity" | "low_capacity" => Ok(CapacityState::Low),
            other => Err(format!("unknown capacity state: {other}")),
        }
    }
}

/// Context taxonomy attached to an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sensory,
    Demand,
    Social,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sensory" => Ok(Category::Sensory),
            "demand" => Ok(Category::Demand),
            "social" => Ok(Category::Social),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// One capacity self-report. Produced upstream and never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub state: CapacityState,
    pub timestamp: DateTime<Utc>,
    /// Explicit calendar date; wins over the date derived from `timestamp`.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Observation {
    pub fn new(state: CapacityState, timestamp: DateTime<Utc>) -> Self {
        Self {
            state,
            timestamp,
            date: None,
            tags: Vec::new(),
            category: None,
            note: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn score(&self) -> f64 {
        self.state.score()
    }
}

/// Closed calendar-date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Mean score of every observation on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuityRating {
    High,
    Moderate,
    Low,
}

/// Interpretability label chosen from the (stability, continuity) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Insufficient Observation")]
    InsufficientObservation,
    #[serde(rename = "Interpretable Capacity Trends")]
    InterpretableTrends,
    #[serde(rename = "Partial Capacity Trends")]
    PartialTrends,
    #[serde(rename = "Variable Capacity Patterns")]
    VariablePatterns,
    #[serde(rename = "Partial Capacity Patterns")]
    PartialPatterns,
    #[serde(rename = "Highly Variable Capacity")]
    HighlyVariable,
    #[serde(rename = "Insufficient Stability")]
    InsufficientStability,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::InsufficientObservation => "Insufficient Observation",
            Verdict::InterpretableTrends => "Interpretable Capacity Trends",
            Verdict::PartialTrends => "Partial Capacity Trends",
            Verdict::VariablePatterns => "Variable Capacity Patterns",
            Verdict::PartialPatterns => "Partial Capacity Patterns",
            Verdict::HighlyVariable => "Highly Variable Capacity",
            Verdict::InsufficientStability => "Insufficient Stability",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMetrics {
    pub days_with_data: u32,
    pub days_in_window: u32,
    pub continuity: u32,
    pub continuity_rating: ContinuityRating,
    pub volatility: f64,
    pub stability: u32,
    pub verdict: Verdict,
}

/// Forward projection, only produced when the fitted trend is declining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub series: Vec<f64>,
    pub weekly_rate: f64,
    pub weeks_to_critical: Option<f64>,
    pub slope: f64,
    pub intercept: f64,
}
