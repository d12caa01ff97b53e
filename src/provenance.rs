//! Provenance stamp and data-fidelity audit attached to every report.
//!
//! The fingerprint is a display-grade tamper indicator over canonical JSON,
//! not a security control.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::CapacityState;
use crate::report::depth::{RecordDepth, StateDistribution};
use crate::report::{QuarterView, ReportPeriod};
use crate::stats::percent;

pub const FINGERPRINT_ALGORITHM: &str = "sha256";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Immutable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub algorithm: String,
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
    pub fidelity: FidelityAudit,
}

/// Hash over period, record depth, distribution and generation time.
///
/// `serde_json::Value` keeps object keys sorted, so field order in the
/// source structs does not affect the digest.
pub fn fingerprint(
    period: &ReportPeriod,
    depth: &RecordDepth,
    distribution: &StateDistribution,
    generated_at: DateTime<Utc>,
) -> String {
    let canonical = serde_json::json!({
        "period": serde_json::to_value(period).unwrap_or_default(),
        "record_depth": serde_json::to_value(depth).unwrap_or_default(),
        "distribution": serde_json::to_value(distribution).unwrap_or_default(),
        "generated_at": generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn stamp(
    period: &ReportPeriod,
    depth: &RecordDepth,
    distribution: &StateDistribution,
    generated_at: DateTime<Utc>,
    fidelity: FidelityAudit,
) -> Provenance {
    Provenance {
        algorithm: FINGERPRINT_ALGORITHM.to_string(),
        fingerprint: fingerprint(period, depth, distribution, generated_at),
        generated_at,
        fidelity,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySignal {
    pub value: u32,
    pub band: String,
}

impl QualitySignal {
    fn banded(value: u32, upper: u32, lower: u32, labels: [&str; 3]) -> Self {
        let band = if value >= upper {
            labels[0]
        } else if value >= lower {
            labels[1]
        } else {
            labels[2]
        };
        Self {
            value,
            band: band.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FidelityVerdict {
    High,
    Moderate,
    Limited,
}

impl FidelityVerdict {
    pub fn from_signals(compliance: u32, coherence: u32, completion: u32) -> Self {
        if compliance >= 70 && coherence >= 60 && completion >= 60 {
            FidelityVerdict::High
        } else if compliance >= 50 && coherence >= 40 && completion >= 40 {
            FidelityVerdict::Moderate
        } else {
            FidelityVerdict::Limited
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityAudit {
    /// Share of elapsed days with at least one entry.
    pub compliance: QualitySignal,
    /// Share of observed days without contradictory high and low entries.
    pub coherence: QualitySignal,
    /// Share of entries carrying a tag or a category.
    pub completion: QualitySignal,
    /// Longest gap, in days, between consecutive observed dates.
    pub cadence: QualitySignal,
    pub verdict: FidelityVerdict,
    pub narrative: String,
}

pub fn audit(view: &QuarterView<'_>, depth: &RecordDepth) -> FidelityAudit {
    let dates = view.dates();

    let contradictory = dates
        .iter()
        .filter(|date| {
            let (mut high, mut low) = (false, false);
            for entry in view.entries.iter().filter(|entry| entry.date == **date) {
                match entry.observation.state {
                    CapacityState::High => high = true,
                    CapacityState::Low => low = true,
                    CapacityState::Moderate => {}
                }
            }
            high && low
        })
        .count();
    let coherence_value = 100 - percent(contradictory, dates.len());

    let complete = view
        .entries
        .iter()
        .filter(|entry| {
            entry.observation.category.is_some()
                || entry.observation.tags.iter().any(|tag| !tag.trim().is_empty())
        })
        .count();
    let completion_value = percent(complete, view.len());

    let longest_gap = dates
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .max()
        .unwrap_or(0)
        .max(0) as u32;

    let compliance = QualitySignal::banded(
        depth.coverage_percent,
        70,
        50,
        ["strong", "adequate", "limited"],
    );
    let coherence = QualitySignal::banded(
        coherence_value,
        60,
        40,
        ["consistent", "mixed", "inconsistent"],
    );
    let completion = QualitySignal::banded(
        completion_value,
        60,
        40,
        ["complete", "partial", "sparse"],
    );
    let cadence = QualitySignal {
        value: longest_gap,
        band: match longest_gap {
            0..=3 => "regular",
            4..=7 => "intermittent",
            _ => "irregular",
        }
        .to_string(),
    };

    let verdict =
        FidelityVerdict::from_signals(compliance.value, coherence.value, completion.value);
    let narrative = narrative(verdict, compliance.value, coherence.value, completion.value);

    FidelityAudit {
        compliance,
        coherence,
        completion,
        cadence,
        verdict,
        narrative,
    }
}

fn narrative(verdict: FidelityVerdict, compliance: u32, coherence: u32, completion: u32) -> String {
    match verdict {
        FidelityVerdict::High => format!(
            "Entries were logged on {compliance}% of days with {coherence}% internal coherence and \
             {completion}% of entries carrying context. The record is dense and consistent enough \
             to support the patterns described in this report."
        ),
        FidelityVerdict::Moderate => format!(
            "Entries were logged on {compliance}% of days with {coherence}% internal coherence and \
             {completion}% of entries carrying context. The record supports broad patterns, but \
             finer-grained findings should be confirmed with continued tracking."
        ),
        FidelityVerdict::Limited => format!(
            "Entries were logged on {compliance}% of days with {coherence}% internal coherence and \
             {completion}% of entries carrying context. The record is too sparse or inconsistent \
             for the findings in this report to be relied on without corroboration."
        ),
    }
}
