//! Rule-based clinical notes.
//!
//! Rules are an ordered table of (predicate, note) pairs. Every matching rule
//! contributes a note; the output is stably sorted by priority, 1 first.

use serde::{Deserialize, Serialize};

use super::depth::{DepthRating, RecordDepth, StateDistribution};
use super::dynamics::ReportDynamics;
use super::rhythm::{weekday_name, WeekStructure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    LowConfidence,
    ElevatedDepletion,
    StabilityConsideration,
    DaySpecificPattern,
    TimeOfDayPattern,
    PredominantlyResourced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalNote {
    pub priority: u8,
    pub kind: NoteKind,
    pub text: String,
}

pub struct NoteInputs<'a> {
    pub depth: &'a RecordDepth,
    pub distribution: &'a StateDistribution,
    pub dynamics: &'a ReportDynamics,
    pub rhythm: &'a WeekStructure,
}

struct NoteRule {
    kind: NoteKind,
    priority: u8,
    applies: fn(&NoteInputs<'_>) -> bool,
    text: fn(&NoteInputs<'_>) -> String,
}

const NOTE_RULES: &[NoteRule] = &[
    NoteRule {
        kind: NoteKind::LowConfidence,
        priority: 1,
        applies: |inputs| inputs.depth.rating == DepthRating::Limited,
        text: |inputs| {
            format!(
                "Entries cover {}% of days this quarter; patterns below should be read \
                 as low-confidence.",
                inputs.depth.coverage_percent
            )
        },
    },
    NoteRule {
        kind: NoteKind::ElevatedDepletion,
        priority: 1,
        applies: |inputs| inputs.distribution.low.percent > 40,
        text: |inputs| {
            format!(
                "Low capacity was reported in {}% of entries, indicating elevated depletion.",
                inputs.distribution.low.percent
            )
        },
    },
    NoteRule {
        kind: NoteKind::PredominantlyResourced,
        priority: 2,
        applies: |inputs| inputs.distribution.high.percent > 60,
        text: |inputs| {
            format!(
                "High capacity was reported in {}% of entries; the quarter was \
                 predominantly resourced.",
                inputs.distribution.high.percent
            )
        },
    },
    NoteRule {
        kind: NoteKind::StabilityConsideration,
        priority: 2,
        applies: |inputs| inputs.dynamics.volatility_score > 70,
        text: |inputs| {
            format!(
                "Capacity shifted frequently between entries (volatility {}); stability \
                 may warrant attention.",
                inputs.dynamics.volatility_score
            )
        },
    },
    NoteRule {
        kind: NoteKind::DaySpecificPattern,
        priority: 3,
        applies: |inputs| {
            inputs
                .rhythm
                .hardest_day
                .as_ref()
                .is_some_and(|day| day.low_rate > 50.0)
        },
        text: |inputs| match &inputs.rhythm.hardest_day {
            Some(day) => format!(
                "{} entries were low capacity {}% of the time, suggesting a day-specific pattern.",
                weekday_name(day.weekday),
                day.low_rate
            ),
            None => String::new(),
        },
    },
    NoteRule {
        kind: NoteKind::TimeOfDayPattern,
        priority: 3,
        applies: |inputs| inputs.rhythm.vulnerable_slot.is_some(),
        text: |inputs| match inputs.rhythm.vulnerable_slot {
            Some(slot) => format!(
                "Capacity was lowest in the {slot}, suggesting a time-of-day pattern."
            ),
            None => String::new(),
        },
    },
];

pub fn clinical_notes(inputs: &NoteInputs<'_>) -> Vec<ClinicalNote> {
    let mut notes: Vec<ClinicalNote> = NOTE_RULES
        .iter()
        .filter(|rule| (rule.applies)(inputs))
        .map(|rule| ClinicalNote {
            priority: rule.priority,
            kind: rule.kind,
            text: (rule.text)(inputs),
        })
        .collect();
    notes.sort_by_key(|note| note.priority);
    notes
}
