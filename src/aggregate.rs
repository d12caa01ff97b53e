use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};

use crate::models::{DailyPoint, DateWindow, Observation};
use crate::temporal::calendar_date;

/// Per-date mean scores for observations dated inside `window`, ascending.
pub fn daily_means(
    observations: &[Observation],
    window: &DateWindow,
    offset: FixedOffset,
) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for observation in observations {
        let date = calendar_date(observation, offset);
        if !window.contains(date) {
            continue;
        }
        let entry = buckets.entry(date).or_insert((0.0, 0));
        entry.0 += observation.score();
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(date, (total, count))| DailyPoint {
            date,
            value: total / count as f64,
        })
        .collect()
}

/// Span between the earliest and latest daily point, which is always inside
/// the window the points were aggregated over.
pub fn covered_window(points: &[DailyPoint]) -> Option<DateWindow> {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => Some(DateWindow {
            start: first.date,
            end: last.date,
        }),
        _ => None,
    }
}
