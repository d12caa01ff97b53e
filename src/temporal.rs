//! Calendar helpers shared by every analysis.
//!
//! All calendar reasoning happens on `NaiveDate` in the configured reporting
//! offset; instants are only converted at the edges.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::Observation;

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

pub fn offset_from_minutes(minutes: i32) -> EngineResult<FixedOffset> {
    if minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(EngineError::InvalidOffset(minutes));
    }
    FixedOffset::east_opt(minutes * 60).ok_or(EngineError::InvalidOffset(minutes))
}

pub fn parse_date(value: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDate(value.to_string()))
}

pub fn local_time(timestamp: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    timestamp.with_timezone(&offset)
}

/// Calendar date of an observation: the explicit date when present, otherwise
/// the timestamp's date in the reporting offset.
pub fn calendar_date(observation: &Observation, offset: FixedOffset) -> NaiveDate {
    observation
        .date
        .unwrap_or_else(|| local_time(observation.timestamp, offset).date_naive())
}

/// Number of calendar days in `[start, end]`, or 0 when `end < start`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let span = (end - start).num_days();
    if span < 0 {
        0
    } else {
        (span + 1) as u32
    }
}

/// `YYYY-MM` bucket key; sorts in calendar order.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// A calendar quarter with precomputed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quarter {
    pub year: i32,
    pub number: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Quarter {
    pub fn new(year: i32, number: u32) -> EngineResult<Self> {
        let invalid = || EngineError::InvalidQuarter(format!("{year}-Q{number}"));
        if !(1..=4).contains(&number) {
            return Err(invalid());
        }
        let first_month = (number - 1) * 3 + 1;
        let start = NaiveDate::from_ymd_opt(year, first_month, 1).ok_or_else(invalid)?;
        let next_start = if number == 4 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, first_month + 3, 1)
        }
        .ok_or_else(invalid)?;
        Ok(Self {
            year,
            number,
            start,
            end: next_start - Duration::days(1),
        })
    }

    /// Parses `YYYY-Qn` (case-insensitive `q`).
    pub fn parse(value: &str) -> EngineResult<Self> {
        let invalid = || EngineError::InvalidQuarter(value.to_string());
        let (year, number) = value
            .trim()
            .split_once(['Q', 'q'])
            .ok_or_else(invalid)?;
        let year: i32 = year
            .trim_end_matches('-')
            .parse()
            .map_err(|_| invalid())?;
        let number: u32 = number.parse().map_err(|_| invalid())?;
        Self::new(year, number).map_err(|_| invalid())
    }

    pub fn containing(date: NaiveDate) -> EngineResult<Self> {
        Self::new(date.year(), (date.month() - 1) / 3 + 1)
    }

    pub fn previous(&self) -> EngineResult<Self> {
        if self.number == 1 {
            Self::new(self.year - 1, 4)
        } else {
            Self::new(self.year, self.number - 1)
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn label(&self) -> String {
        format!("Q{} {}", self.number, self.year)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.number)
    }
}
