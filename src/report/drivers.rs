use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::QuarterView;
use crate::stats::{round1, share};

const TOP_DEPLETERS: usize = 3;

/// How often a context tag appears and how often it co-occurs with low capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverCorrelation {
    pub tag: String,
    pub count: usize,
    /// Share of all quarter observations carrying the tag, 0-100.
    pub frequency: f64,
    /// Share of the tag's observations that are low capacity, 0-100.
    pub depletion_rate: f64,
    pub top_depleter: bool,
}

/// Per-tag correlations, most frequent first.
///
/// The three tags with the highest non-zero depletion rate are flagged
/// regardless of how often they occur.
pub fn correlate(view: &QuarterView<'_>) -> Vec<DriverCorrelation> {
    let mut tallies: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for entry in &view.entries {
        let tags: BTreeSet<&str> = entry
            .observation
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .collect();
        for tag in tags {
            let tally = tallies.entry(tag.to_string()).or_insert((0, 0));
            tally.0 += 1;
            if entry.is_low() {
                tally.1 += 1;
            }
        }
    }

    let total = view.len();
    let mut ranked: Vec<(String, usize, f64)> = tallies
        .into_iter()
        .map(|(tag, (count, low))| (tag, count, share(low, count)))
        .collect();

    ranked.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then(b.1.cmp(&a.1))
            .then(a.0.cmp(&b.0))
    });

    let mut correlations: Vec<DriverCorrelation> = ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (tag, count, depletion))| DriverCorrelation {
            top_depleter: rank < TOP_DEPLETERS && depletion > 0.0,
            frequency: round1(share(count, total)),
            depletion_rate: round1(depletion),
            tag,
            count,
        })
        .collect();

    correlations.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(&b.tag)));
    correlations
}

/// Top depleters in rank order.
pub fn top_depleters(correlations: &[DriverCorrelation]) -> Vec<&DriverCorrelation> {
    let mut top: Vec<&DriverCorrelation> =
        correlations.iter().filter(|c| c.top_depleter).collect();
    top.sort_by(|a, b| {
        b.depletion_rate
            .partial_cmp(&a.depletion_rate)
            .unwrap_or(Ordering::Equal)
            .then(b.count.cmp(&a.count))
            .then(a.tag.cmp(&b.tag))
    });
    top
}
