//! Weekday, time-of-day, weekly and monthly structure of a quarter.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::{Entry, QuarterView};
use crate::stats::{mean, round1, share};
use crate::temporal::{month_key, month_label, week_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Afternoon, TimeSlot::Evening];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => TimeSlot::Morning,
            12..=16 => TimeSlot::Afternoon,
            _ => TimeSlot::Evening,
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
        })
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBucket {
    pub weekday: Weekday,
    pub count: usize,
    pub low_count: usize,
    /// 0-100.
    pub low_rate: f64,
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotBucket {
    pub slot: TimeSlot,
    pub count: usize,
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardestDay {
    pub weekday: Weekday,
    pub low_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekStructure {
    pub weekdays: Vec<WeekdayBucket>,
    pub slots: Vec<SlotBucket>,
    pub hardest_day: Option<HardestDay>,
    pub vulnerable_slot: Option<TimeSlot>,
    /// Population variance of populated weekdays' low rates.
    pub weekday_variance: f64,
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn week_structure(view: &QuarterView<'_>) -> WeekStructure {
    let mut day_rates: Vec<(Weekday, f64)> = Vec::new();
    let weekdays: Vec<WeekdayBucket> = WEEK
        .iter()
        .map(|weekday| {
            let entries: Vec<&Entry<'_>> = view
                .entries
                .iter()
                .filter(|entry| entry.date.weekday() == *weekday)
                .collect();
            let low_count = entries.iter().filter(|entry| entry.is_low()).count();
            let low_rate = share(low_count, entries.len());
            if !entries.is_empty() {
                day_rates.push((*weekday, low_rate));
            }
            WeekdayBucket {
                weekday: *weekday,
                count: entries.len(),
                low_count,
                low_rate: round1(low_rate),
                mean_score: mean(entries.iter().map(|entry| entry.score())).map(round1),
            }
        })
        .collect();

    let mut slot_means: Vec<(TimeSlot, f64)> = Vec::new();
    let slots: Vec<SlotBucket> = TimeSlot::ALL
        .iter()
        .map(|slot| {
            let scores: Vec<f64> = view
                .entries
                .iter()
                .filter(|entry| TimeSlot::from_hour(entry.hour()) == *slot)
                .map(|entry| entry.score())
                .collect();
            let slot_mean = mean(scores.iter().copied());
            if let Some(value) = slot_mean {
                slot_means.push((*slot, value));
            }
            SlotBucket {
                slot: *slot,
                count: scores.len(),
                mean_score: slot_mean.map(round1),
            }
        })
        .collect();

    // Earliest weekday wins ties: only a strictly higher rate replaces it.
    let hardest_day = day_rates
        .iter()
        .fold(None::<(Weekday, f64)>, |best, &(weekday, rate)| match best {
            Some((_, best_rate)) if rate <= best_rate => best,
            _ => Some((weekday, rate)),
        })
        .map(|(weekday, rate)| HardestDay {
            weekday,
            low_rate: round1(rate),
        });

    let vulnerable_slot = if slot_means.len() >= 2 {
        slot_means
            .iter()
            .fold(None::<(TimeSlot, f64)>, |best, &(slot, value)| match best {
                Some((_, best_value)) if value >= best_value => best,
                _ => Some((slot, value)),
            })
            .map(|(slot, _)| slot)
    } else {
        None
    };

    let weekday_variance = mean(day_rates.iter().map(|(_, rate)| *rate))
        .map(|avg| {
            day_rates
                .iter()
                .map(|(_, rate)| (rate - avg).powi(2))
                .sum::<f64>()
                / day_rates.len() as f64
        })
        .unwrap_or(0.0);

    WeekStructure {
        weekdays,
        slots,
        hardest_day,
        vulnerable_slot,
        weekday_variance: round1(weekday_variance),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPoint {
    pub week_start: NaiveDate,
    pub count: usize,
    pub mean_score: f64,
}

/// Mean observation score per Monday-started week, ascending.
pub fn weekly_means(view: &QuarterView<'_>) -> Vec<WeeklyPoint> {
    let mut weeks: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for entry in &view.entries {
        let bucket = weeks.entry(week_start(entry.date)).or_insert((0.0, 0));
        bucket.0 += entry.score();
        bucket.1 += 1;
    }
    weeks
        .into_iter()
        .map(|(week_start, (total, count))| WeeklyPoint {
            week_start,
            count,
            mean_score: total / count as f64,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    pub month: String,
    pub label: String,
    pub count: usize,
    pub low_percent: f64,
    pub mean_score: f64,
}

/// One entry per month with observations, in calendar order.
pub fn monthly_breakdown(view: &QuarterView<'_>) -> Vec<MonthlyBreakdown> {
    let mut months: BTreeMap<String, (String, usize, usize, f64)> = BTreeMap::new();
    for entry in &view.entries {
        let bucket = months
            .entry(month_key(entry.date))
            .or_insert_with(|| (month_label(entry.date), 0, 0, 0.0));
        bucket.1 += 1;
        if entry.is_low() {
            bucket.2 += 1;
        }
        bucket.3 += entry.score();
    }
    months
        .into_iter()
        .map(|(month, (label, count, low, total))| MonthlyBreakdown {
            month,
            label,
            count,
            low_percent: round1(share(low, count)),
            mean_score: round1(total / count as f64),
        })
        .collect()
}

/// Ordering helper shared with the overlay: lowest weekly mean, earliest first.
pub fn lowest_week(weekly: &[WeeklyPoint]) -> Option<&WeeklyPoint> {
    weekly.iter().min_by(|a, b| {
        a.mean_score
            .partial_cmp(&b.mean_score)
            .unwrap_or(Ordering::Equal)
            .then(a.week_start.cmp(&b.week_start))
    })
}
