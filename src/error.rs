use chrono::NaiveDate;
use thiserror::Error;

/// Caller defects rejected by the engine.
///
/// Insufficient history is never reported through this type; entry points
/// return `Ok(None)` for that.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("observation window ends ({end}) before it starts ({start})")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("invalid quarter identifier: {0} (expected YYYY-Qn)")]
    InvalidQuarter(String),

    #[error("invalid calendar date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("utc offset out of range: {0} minutes")]
    InvalidOffset(i32),

    #[error("threshold out of range: {0}")]
    InvalidThreshold(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_error_names_both_bounds() {
        let err = EngineError::InvalidWindow {
            start: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        };
        let message = err.to_string();
        assert!(message.contains("2026-03-01"));
        assert!(message.contains("2026-02-01"));
    }

    #[test]
    fn threshold_error_names_the_field() {
        let err = EngineError::InvalidThreshold("default_window_days = 0".into());
        assert_eq!(
            err.to_string(),
            "threshold out of range: default_window_days = 0"
        );
    }

    #[test]
    fn quarter_error_echoes_input() {
        let err = EngineError::InvalidQuarter("2026-Q5".into());
        assert!(err.to_string().contains("2026-Q5"));
    }
}
