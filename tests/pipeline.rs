use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use capacity_insights::downsample::downsample;
use capacity_insights::identity::subject_code;
use capacity_insights::pattern;
use capacity_insights::{
    generate_quarterly_report, pattern_snapshot, project_trend, CapacityState, ContinuityRating,
    DailyPoint, EngineConfig, EngineError, Observation, Thresholds, Verdict,
};

fn day(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap() + Duration::days(offset)
}

fn window_config(days: i64) -> EngineConfig {
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    EngineConfig::default().with_window(start, start + Duration::days(days - 1))
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 15, 12, 0, 0).unwrap()
}

fn on_days(days: impl IntoIterator<Item = i64>, state: CapacityState) -> Vec<Observation> {
    days.into_iter().map(|d| Observation::new(state, day(d))).collect()
}

#[test]
fn minimum_days_gate() {
    let config = window_config(92);
    let short = on_days(0..89, CapacityState::High);
    assert!(pattern_snapshot(&short, &config, now()).unwrap().is_none());

    let exact = on_days(0..90, CapacityState::High);
    assert!(pattern_snapshot(&exact, &config, now()).unwrap().is_some());
}

#[test]
fn continuity_over_covered_window() {
    let config = window_config(92);
    let full = on_days(0..90, CapacityState::Moderate);
    let snapshot = pattern_snapshot(&full, &config, now()).unwrap().unwrap();
    assert_eq!(snapshot.metrics.continuity, 100);
    assert_eq!(snapshot.metrics.continuity_rating, ContinuityRating::High);

    let config = window_config(92).with_minimum_days(10);
    let half = on_days((0..44).chain([89]), CapacityState::Moderate);
    let snapshot = pattern_snapshot(&half, &config, now()).unwrap().unwrap();
    assert_eq!(snapshot.metrics.days_in_window, 90);
    assert_eq!(snapshot.metrics.continuity, 50);
    assert_eq!(snapshot.metrics.continuity_rating, ContinuityRating::Moderate);

    let sparse = on_days((0..10).map(|i| i * 10), CapacityState::Moderate);
    let snapshot = pattern_snapshot(&sparse, &config, now()).unwrap().unwrap();
    assert!(snapshot.metrics.continuity < 40);
    assert_eq!(snapshot.metrics.continuity_rating, ContinuityRating::Low);
    assert_eq!(snapshot.metrics.verdict, Verdict::InsufficientObservation);
}

#[test]
fn stability_extremes() {
    let config = window_config(92);
    let constant = on_days(0..90, CapacityState::High);
    let snapshot = pattern_snapshot(&constant, &config, now()).unwrap().unwrap();
    assert_eq!(snapshot.metrics.volatility, 0.0);
    assert!(snapshot.metrics.stability >= 95);
    assert_eq!(snapshot.metrics.verdict, Verdict::InterpretableTrends);

    let alternating: Vec<Observation> = (0..90)
        .map(|d| {
            let state = if d % 2 == 0 {
                CapacityState::High
            } else {
                CapacityState::Low
            };
            Observation::new(state, day(d))
        })
        .collect();
    let snapshot = pattern_snapshot(&alternating, &config, now()).unwrap().unwrap();
    assert!(snapshot.metrics.stability <= 5);
    assert_eq!(snapshot.metrics.verdict, Verdict::HighlyVariable);
}

#[test]
fn verdict_quadrants() {
    assert_eq!(pattern::verdict(85, 75), Verdict::InterpretableTrends);
    assert_eq!(pattern::verdict(85, 45), Verdict::PartialTrends);
    assert_eq!(pattern::verdict(65, 75), Verdict::VariablePatterns);
    assert_eq!(pattern::verdict(65, 45), Verdict::PartialPatterns);
    assert_eq!(pattern::verdict(20, 75), Verdict::HighlyVariable);
    assert_eq!(pattern::verdict(20, 45), Verdict::InsufficientStability);
    for stability in [0, 50, 80, 100] {
        assert_eq!(pattern::verdict(stability, 30), Verdict::InsufficientObservation);
    }
}

#[test]
fn downsample_invariants() {
    for len in [0usize, 1, 5, 6, 7, 90, 365] {
        let values: Vec<f64> = (0..len).map(|i| (i % 101) as f64).collect();
        let points = downsample(&values, 6);
        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|v| (0.0..=100.0).contains(v)));
    }
    assert_eq!(downsample(&[], 6), vec![50.0; 6]);
}

#[test]
fn subject_codes_are_deterministic() {
    assert_eq!(subject_code("seed-a"), subject_code("seed-a"));
    assert_ne!(subject_code("seed-a"), subject_code("seed-b"));
}

#[test]
fn projection_only_reports_decline() {
    let reference = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
    let points = |values: Vec<f64>| -> Vec<DailyPoint> {
        let n = values.len() as i64;
        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| DailyPoint {
                date: reference - Duration::days(n - 1 - i as i64),
                value,
            })
            .collect()
    };
    let thresholds = Thresholds::default();

    let improving = points((0..21).map(|i| 40.0 + i as f64).collect());
    assert!(project_trend(&improving, reference, &thresholds).is_none());

    let declining = points((0..21).map(|i| 90.0 - 2.5 * i as f64).collect());
    let projection = project_trend(&declining, reference, &thresholds).unwrap();
    assert_eq!(projection.series.len(), 42);
    assert!(projection.series.iter().all(|v| (0.0..=100.0).contains(v)));
    assert!(projection.series.iter().any(|v| *v <= 33.0));
    assert!(projection.weeks_to_critical.is_some());
}

#[test]
fn snapshot_projects_a_late_slide() {
    let mut observations = on_days(0..69, CapacityState::High);
    observations.extend(on_days(69..76, CapacityState::High));
    observations.extend(on_days(76..83, CapacityState::Moderate));
    observations.extend(on_days(83..90, CapacityState::Low));

    let config = window_config(90);
    let snapshot = pattern_snapshot(&observations, &config, now()).unwrap().unwrap();
    let projection = snapshot.projection.expect("declining trend should project");
    assert!(projection.weekly_rate < 0.0);
    assert!(projection.weeks_to_critical.is_some());
}

fn quarter_log() -> Vec<Observation> {
    let mut observations = Vec::new();
    for d in 0..90 {
        let state = match d % 5 {
            0 | 1 => CapacityState::High,
            2 => CapacityState::Moderate,
            _ => CapacityState::Low,
        };
        let tags: &[&str] = match d % 3 {
            0 => &["work"],
            1 => &["sleep", "noise"],
            _ => &[],
        };
        observations.push(Observation::new(state, day(d)).with_tags(tags.iter().copied()));
    }
    observations
}

#[test]
fn report_is_reproducible() {
    let config = EngineConfig::default().with_quarter("2026-Q1");
    let observations = quarter_log();
    let first = generate_quarterly_report(&observations, &config, now()).unwrap().unwrap();
    let second = generate_quarterly_report(&observations, &config, now()).unwrap().unwrap();

    assert_eq!(first.distribution, second.distribution);
    assert_eq!(first.dynamics, second.dynamics);
    assert_eq!(first.drivers, second.drivers);
    assert_eq!(first.rhythm, second.rhythm);
    assert_eq!(first.episodes, second.episodes);
    assert_eq!(first.notes, second.notes);
}

#[test]
fn monthly_partition_covers_quarter() {
    let config = EngineConfig::default().with_quarter("2026-Q1");
    let observations = quarter_log();
    let report = generate_quarterly_report(&observations, &config, now()).unwrap().unwrap();

    let months: Vec<&str> = report.monthly.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(months, vec!["2026-01", "2026-02", "2026-03"]);
    let labels: Vec<&str> = report.monthly.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["Jan 2026", "Feb 2026", "Mar 2026"]);
    assert_eq!(
        report.monthly.iter().map(|m| m.count).sum::<usize>(),
        observations.len()
    );
}

#[test]
fn report_sections_are_populated() {
    let config = EngineConfig::default().with_quarter("2026-Q1");
    let report = generate_quarterly_report(&quarter_log(), &config, now())
        .unwrap()
        .unwrap();

    assert_eq!(report.distribution.total, 90);
    assert_eq!(report.distribution.low.count, 36);
    assert_eq!(report.record_depth.unique_days, 90);
    // Every five-day cycle ends in a two-day low run.
    assert_eq!(report.episodes.len(), 5);
    assert!(report.episodes.iter().all(|e| e.day_count == 2));
    assert!(report.drivers.iter().any(|d| d.top_depleter));
    assert!(report.overlay.is_some());
    assert!(report.longitudinal.is_none());
    assert_eq!(report.provenance.fingerprint.len(), 64);
}

#[test]
fn malformed_configuration_fails_fast() {
    let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let inverted = EngineConfig::default().with_window(start, start - Duration::days(1));
    assert!(matches!(
        pattern_snapshot(&[], &inverted, now()),
        Err(EngineError::InvalidWindow { .. })
    ));

    let huge_window = EngineConfig::from_toml_str("default_window_days = 4000000000").unwrap();
    assert!(matches!(
        pattern_snapshot(&quarter_log(), &huge_window, now()),
        Err(EngineError::InvalidThreshold(_))
    ));

    let bad_quarter = EngineConfig::default().with_quarter("Q3");
    assert!(matches!(
        generate_quarterly_report(&quarter_log(), &bad_quarter, now()),
        Err(EngineError::InvalidQuarter(_))
    ));
}
