//! Quarterly report synthesis.
//!
//! Every sub-analysis reads the same [`QuarterView`]: the quarter's
//! observations in chronological order with their calendar date and local
//! time resolved once.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::aggregate::daily_means;
use crate::config::EngineConfig;
use crate::downsample::downsample;
use crate::error::EngineResult;
use crate::identity::subject_code;
use crate::models::{DailyPoint, DateWindow, Observation};
use crate::provenance::{self, Provenance, ReportStatus};
use crate::temporal::{self, calendar_date, inclusive_days, Quarter};

pub mod depth;
pub mod drivers;
pub mod dynamics;
pub mod episodes;
pub mod longitudinal;
pub mod notes;
pub mod overlay;
pub mod rhythm;

use depth::{RecordDepth, StateDistribution};
use drivers::DriverCorrelation;
use dynamics::ReportDynamics;
use episodes::Episode;
use longitudinal::LongitudinalComparison;
use notes::{ClinicalNote, NoteInputs};
use overlay::HeuristicOverlay;
use rhythm::{MonthlyBreakdown, WeekStructure, WeeklyPoint};

/// An observation with its calendar placement resolved.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub observation: &'a Observation,
    pub date: NaiveDate,
    pub local: DateTime<FixedOffset>,
}

impl Entry<'_> {
    pub fn hour(&self) -> u32 {
        self.local.hour()
    }

    pub fn is_low(&self) -> bool {
        self.observation.state.is_low()
    }

    pub fn score(&self) -> f64 {
        self.observation.score()
    }
}

/// Observations of one quarter, oldest first.
#[derive(Debug, Clone)]
pub struct QuarterView<'a> {
    source: &'a [Observation],
    pub quarter: Quarter,
    pub offset: FixedOffset,
    pub entries: Vec<Entry<'a>>,
}

impl<'a> QuarterView<'a> {
    pub fn new(observations: &'a [Observation], quarter: Quarter, offset: FixedOffset) -> Self {
        let mut entries: Vec<Entry<'a>> = observations
            .iter()
            .map(|observation| Entry {
                observation,
                date: calendar_date(observation, offset),
                local: temporal::local_time(observation.timestamp, offset),
            })
            .filter(|entry| quarter.contains(entry.date))
            .collect();
        entries.sort_by(|a, b| {
            a.observation
                .timestamp
                .cmp(&b.observation.timestamp)
                .then(a.date.cmp(&b.date))
                .then(a.observation.state.cmp(&b.observation.state))
        });
        Self {
            source: observations,
            quarter,
            offset,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn low_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_low()).count()
    }

    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.quarter.start,
            end: self.quarter.end,
        }
    }

    pub fn daily_means(&self) -> Vec<DailyPoint> {
        daily_means(self.source, &self.window(), self.offset)
    }

    /// Distinct observed dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.entries.iter().map(|entry| entry.date).collect();
        dates.sort();
        dates.dedup();
        dates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub quarter: String,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Quarter days up to today, stretched to the latest observation.
    pub days_elapsed: u32,
}

impl ReportPeriod {
    fn new(view: &QuarterView<'_>, today: NaiveDate) -> Self {
        let quarter = view.quarter;
        let mut through = today.min(quarter.end);
        if let Some(last) = view.entries.iter().map(|entry| entry.date).max() {
            through = through.max(last);
        }
        Self {
            quarter: quarter.to_string(),
            label: quarter.label(),
            start: quarter.start,
            end: quarter.end,
            days_elapsed: inclusive_days(quarter.start, through).max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCharts {
    pub daily: Vec<DailyPoint>,
    pub trend: Vec<f64>,
    pub weekly: Vec<WeeklyPoint>,
}

/// Terminal artifact of the reporting path. Never modified once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyReport {
    pub report_id: Uuid,
    pub subject_code: Option<String>,
    pub status: ReportStatus,
    pub period: ReportPeriod,
    pub record_depth: RecordDepth,
    pub distribution: StateDistribution,
    pub dynamics: ReportDynamics,
    pub drivers: Vec<DriverCorrelation>,
    pub rhythm: WeekStructure,
    pub monthly: Vec<MonthlyBreakdown>,
    pub episodes: Vec<Episode>,
    pub notes: Vec<ClinicalNote>,
    pub charts: ReportCharts,
    pub overlay: Option<HeuristicOverlay>,
    pub longitudinal: Option<LongitudinalComparison>,
    pub provenance: Provenance,
}

/// Builds the report for the configured (or current) quarter.
///
/// Returns `None` when the quarter holds fewer than
/// `min_report_observations` observations.
pub fn generate_quarterly_report(
    observations: &[Observation],
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> EngineResult<Option<QuarterlyReport>> {
    config.validate()?;
    let offset = config.reporting_offset()?;
    let quarter = config.resolve_quarter(now)?;
    let today = config.today(now)?;
    let minimum = config.thresholds.min_report_observations;

    let view = QuarterView::new(observations, quarter, offset);
    if view.len() < minimum {
        debug!(
            quarter = %quarter,
            observations = view.len(),
            required = minimum,
            "not enough observations for a quarterly report"
        );
        return Ok(None);
    }

    let period = ReportPeriod::new(&view, today);
    let record_depth = depth::record_depth(&view, period.days_elapsed);
    let distribution = depth::distribution(&view);
    let daily = view.daily_means();
    let dynamics = dynamics::analyze(&view, &daily);
    let drivers = drivers::correlate(&view);
    let rhythm = rhythm::week_structure(&view);
    let monthly = rhythm::monthly_breakdown(&view);
    let weekly = rhythm::weekly_means(&view);
    let episodes = episodes::find_episodes(&view);

    let notes = if config.include_clinical_notes {
        notes::clinical_notes(&NoteInputs {
            depth: &record_depth,
            distribution: &distribution,
            dynamics: &dynamics,
            rhythm: &rhythm,
        })
    } else {
        Vec::new()
    };

    let overlay = config
        .include_heuristics
        .then(|| overlay::analyze(&view, &drivers, &weekly));

    let longitudinal = if config.include_prior_comparison {
        longitudinal::compare(observations, &view, offset, minimum)?
    } else {
        None
    };

    let values: Vec<f64> = daily.iter().map(|point| point.value).collect();
    let charts = ReportCharts {
        trend: downsample(&values, config.chart_points),
        daily,
        weekly,
    };

    let fidelity = provenance::audit(&view, &record_depth);
    let provenance =
        provenance::stamp(&period, &record_depth, &distribution, now, fidelity);

    debug!(
        quarter = %quarter,
        observations = view.len(),
        fingerprint = %provenance.fingerprint,
        "quarterly report generated"
    );

    Ok(Some(QuarterlyReport {
        report_id: Uuid::new_v4(),
        subject_code: config.id_seed.as_deref().map(subject_code),
        status: ReportStatus::Immutable,
        period,
        record_depth,
        distribution,
        dynamics,
        drivers,
        rhythm,
        monthly,
        episodes,
        notes,
        charts,
        overlay,
        longitudinal,
        provenance,
    }))
}
