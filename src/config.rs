use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::DateWindow;
use crate::temporal::{self, Quarter};

/// Longest day span any configured window, lookback or horizon may cover.
pub const MAX_SPAN_DAYS: u64 = 36_525;

fn check_span(name: &str, days: u64) -> EngineResult<()> {
    if days == 0 || days > MAX_SPAN_DAYS {
        return Err(EngineError::InvalidThreshold(format!("{name} = {days}")));
    }
    Ok(())
}

/// Accepts a quoted `YYYY-MM-DD` string or a native TOML local date.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match toml::Value::deserialize(deserializer)? {
        toml::Value::String(raw) => temporal::parse_date(&raw)
            .map(Some)
            .map_err(de::Error::custom),
        toml::Value::Datetime(datetime) => {
            let date = datetime
                .date
                .ok_or_else(|| {
                    <D::Error as de::Error>::custom(format!("{datetime} has no calendar date"))
                })?;
            NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid calendar date: {datetime}")))
        }
        other => Err(de::Error::custom(format!(
            "expected a date, found {}",
            other.type_str()
        ))),
    }
}

/// Product-policy constants. None of these are statistically derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_report_observations: usize,
    pub min_projection_days: usize,
    pub projection_lookback_days: u32,
    pub projection_slice_days: usize,
    pub projection_horizon_days: usize,
    pub projection_decay: f64,
    pub decline_slope: f64,
    pub critical_level: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_report_observations: 7,
            min_projection_days: 14,
            projection_lookback_days: 30,
            projection_slice_days: 21,
            projection_horizon_days: 42,
            projection_decay: 0.95,
            decline_slope: -0.15,
            critical_level: 33.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> EngineResult<()> {
        check_span("projection_lookback_days", self.projection_lookback_days.into())?;
        check_span("projection_horizon_days", self.projection_horizon_days as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(deserialize_with = "deserialize_date")]
    pub window_start: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_date")]
    pub window_end: Option<NaiveDate>,
    pub default_window_days: u32,
    pub minimum_days: usize,
    pub id_seed: Option<String>,
    pub quarter: Option<String>,
    pub include_clinical_notes: bool,
    pub include_prior_comparison: bool,
    pub include_heuristics: bool,
    pub chart_points: usize,
    pub utc_offset_minutes: i32,
    pub thresholds: Thresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_start: None,
            window_end: None,
            default_window_days: 92,
            minimum_days: 90,
            id_seed: None,
            quarter: None,
            include_clinical_notes: true,
            include_prior_comparison: true,
            include_heuristics: true,
            chart_points: 6,
            utc_offset_minutes: 0,
            thresholds: Thresholds::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn with_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.window_start = Some(start);
        self.window_end = Some(end);
        self
    }

    pub fn with_minimum_days(mut self, minimum_days: usize) -> Self {
        self.minimum_days = minimum_days;
        self
    }

    pub fn with_quarter(mut self, quarter: impl Into<String>) -> Self {
        self.quarter = Some(quarter.into());
        self
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.id_seed = Some(seed.into());
        self
    }

    /// Rejects configurations that indicate a caller defect.
    pub fn validate(&self) -> EngineResult<()> {
        if let (Some(start), Some(end)) = (self.window_start, self.window_end) {
            if end < start {
                return Err(EngineError::InvalidWindow { start, end });
            }
        }
        temporal::offset_from_minutes(self.utc_offset_minutes)?;
        check_span("default_window_days", self.default_window_days.into())?;
        self.thresholds.validate()?;
        if let Some(quarter) = &self.quarter {
            Quarter::parse(quarter)?;
        }
        Ok(())
    }

    pub fn reporting_offset(&self) -> EngineResult<FixedOffset> {
        temporal::offset_from_minutes(self.utc_offset_minutes)
    }

    pub fn today(&self, now: DateTime<Utc>) -> EngineResult<NaiveDate> {
        Ok(temporal::local_time(now, self.reporting_offset()?).date_naive())
    }

    /// Configured window: explicit bounds, else `default_window_days` ending today.
    pub fn resolve_window(&self, now: DateTime<Utc>) -> EngineResult<DateWindow> {
        let end = match self.window_end {
            Some(end) => end,
            None => self.today(now)?,
        };
        let start = match self.window_start {
            Some(start) => start,
            None => end
                .checked_sub_signed(Duration::days(self.default_window_days.max(1) as i64 - 1))
                .ok_or_else(|| {
                    EngineError::InvalidThreshold(format!(
                        "default_window_days = {}",
                        self.default_window_days
                    ))
                })?,
        };
        if end < start {
            return Err(EngineError::InvalidWindow { start, end });
        }
        Ok(DateWindow { start, end })
    }

    /// Report quarter: configured identifier, else the quarter containing today.
    pub fn resolve_quarter(&self, now: DateTime<Utc>) -> EngineResult<Quarter> {
        match &self.quarter {
            Some(raw) => Quarter::parse(raw),
            None => Quarter::containing(self.today(now)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_match_product_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.minimum_days, 90);
        assert_eq!(config.chart_points, 6);
        assert_eq!(config.thresholds.min_report_observations, 7);
        assert_eq!(config.thresholds.min_projection_days, 14);
        assert!(config.include_clinical_notes);
    }

    #[test]
    fn inverted_window_fails_fast() {
        let config = EngineConfig::default().with_window(date(2026, 3, 1), date(2026, 1, 1));
        assert!(matches!(config.validate(), Err(EngineError::InvalidWindow { .. })));
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        assert!(config.resolve_window(now).is_err());
    }

    #[test]
    fn window_defaults_to_trailing_days() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
        let window = EngineConfig::default().resolve_window(now).unwrap();
        assert_eq!(window.end, date(2026, 3, 31));
        assert_eq!(temporal::inclusive_days(window.start, window.end), 92);
    }

    #[test]
    fn parses_partial_toml() {
        let raw = r#"
            window_start = "2026-01-01"
            minimum_days = 30
            quarter = "2026-Q1"

            [thresholds]
            critical_level = 25.0
        "#;
        let config = EngineConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.window_start, Some(date(2026, 1, 1)));
        assert_eq!(config.minimum_days, 30);
        assert_eq!(config.thresholds.critical_level, 25.0);
        assert_eq!(config.thresholds.min_projection_days, 14);
        assert!(config.include_heuristics);
    }

    #[test]
    fn parses_native_toml_dates() {
        let raw = "window_start = 2026-01-01\nwindow_end = \"2026-03-31\"\n";
        let config = EngineConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.window_start, Some(date(2026, 1, 1)));
        assert_eq!(config.window_end, Some(date(2026, 3, 31)));

        assert!(EngineConfig::from_toml_str("window_start = 12").is_err());
        assert!(EngineConfig::from_toml_str("window_start = \"01/01/2026\"").is_err());
    }

    #[test]
    fn oversized_spans_fail_validation() {
        let config = EngineConfig::from_toml_str("default_window_days = 4000000000").unwrap();
        assert!(matches!(config.validate(), Err(EngineError::InvalidThreshold(_))));
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
        assert!(matches!(config.resolve_window(now), Err(EngineError::InvalidThreshold(_))));

        let raw = "[thresholds]\nprojection_lookback_days = 4000000000\n";
        let config = EngineConfig::from_toml_str(raw).unwrap();
        assert!(matches!(config.validate(), Err(EngineError::InvalidThreshold(_))));

        let mut config = EngineConfig::default();
        config.default_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_quarter_is_rejected_by_validate() {
        let config = EngineConfig::default().with_quarter("2026-Q9");
        assert!(matches!(config.validate(), Err(EngineError::InvalidQuarter(_))));
    }
}
