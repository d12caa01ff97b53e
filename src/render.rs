use std::fmt::Write;

use crate::report::rhythm::weekday_name;
use crate::report::QuarterlyReport;

/// Markdown rendering of a finished report for the command-line driver.
pub fn markdown(report: &QuarterlyReport) -> String {
    let mut output = String::new();
    let subject = report.subject_code.as_deref().unwrap_or("unidentified subject");

    let _ = writeln!(output, "# Capacity Report {}", report.period.label);
    let _ = writeln!(
        output,
        "Prepared for {} ({} to {})",
        subject, report.period.start, report.period.end
    );
    let _ = writeln!(output);

    let depth = &report.record_depth;
    let _ = writeln!(output, "## Record Depth");
    let _ = writeln!(
        output,
        "- {} entries across {} days ({}% of {} elapsed days, {:?})",
        depth.total_observations,
        depth.unique_days,
        depth.coverage_percent,
        depth.days_elapsed,
        depth.rating
    );
    let _ = writeln!(output);

    let distribution = &report.distribution;
    let _ = writeln!(output, "## Capacity Distribution");
    for (label, share) in [
        ("High", distribution.high),
        ("Moderate", distribution.moderate),
        ("Low", distribution.low),
    ] {
        let _ = writeln!(output, "- {}: {} entries ({}%)", label, share.count, share.percent);
    }
    let _ = writeln!(output);

    let dynamics = &report.dynamics;
    let _ = writeln!(output, "## Pattern Metrics");
    let _ = writeln!(output, "- Stability: {}", dynamics.stability);
    let _ = writeln!(output, "- Volatility: {}", dynamics.volatility_score);
    let _ = writeln!(
        output,
        "- Recovery lag: {:.1}h across {} recoveries (score {})",
        dynamics.recovery_lag_hours, dynamics.recoveries, dynamics.recovery_lag_score
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Drivers");
    if report.drivers.is_empty() {
        let _ = writeln!(output, "No context tags recorded this quarter.");
    } else {
        for driver in report.drivers.iter().take(10) {
            let marker = if driver.top_depleter { " (top depleter)" } else { "" };
            let _ = writeln!(
                output,
                "- {}: {:.1}% of entries, {:.1}% low capacity{}",
                driver.tag, driver.frequency, driver.depletion_rate, marker
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Weekly Rhythm");
    match &report.rhythm.hardest_day {
        Some(day) => {
            let _ = writeln!(
                output,
                "- Hardest day: {} ({:.1}% low capacity)",
                weekday_name(day.weekday),
                day.low_rate
            );
        }
        None => {
            let _ = writeln!(output, "- Hardest day: none identified");
        }
    }
    if let Some(slot) = report.rhythm.vulnerable_slot {
        let _ = writeln!(output, "- Vulnerable time of day: {slot}");
    }
    for month in &report.monthly {
        let _ = writeln!(
            output,
            "- {}: {} entries, mean {:.1}, {:.1}% low",
            month.label, month.count, month.mean_score, month.low_percent
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Notable Episodes");
    if report.episodes.is_empty() {
        let _ = writeln!(output, "No multi-day low-capacity episodes this quarter.");
    } else {
        for episode in &report.episodes {
            let tags = if episode.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", episode.tags.join(", "))
            };
            let _ = writeln!(
                output,
                "- {} to {} ({} days){}",
                episode.start_date, episode.end_date, episode.day_count, tags
            );
        }
    }

    if !report.notes.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Clinical Notes");
        for note in &report.notes {
            let _ = writeln!(output, "{}. {}", note.priority, note.text);
        }
    }

    if let Some(comparison) = &report.longitudinal {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Compared With {}", comparison.prior_quarter);
        let _ = writeln!(
            output,
            "- Low capacity {:.1}% vs {:.1}% ({:+.1} points, {:?})",
            comparison.current_low_percent,
            comparison.prior_low_percent,
            comparison.delta,
            comparison.trend
        );
    }

    if let Some(event) = report.overlay.as_ref().and_then(|overlay| overlay.event.as_ref()) {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Lowest Week");
        let _ = writeln!(
            output,
            "Week of {} (mean {:.1}). {}",
            event.week_start, event.week_mean, event.explanation
        );
    }

    let fidelity = &report.provenance.fidelity;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Data Fidelity");
    let _ = writeln!(output, "{}", fidelity.narrative);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Report {} ({:?}), {} {}, generated {}",
        report.report_id,
        report.status,
        report.provenance.algorithm,
        report.provenance.fingerprint,
        report.provenance.generated_at.to_rfc3339()
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::CapacityState::{High, Low};
    use crate::report::fixtures::{at, utc};
    use crate::report::generate_quarterly_report;

    #[test]
    fn renders_core_sections() {
        let mut observations: Vec<_> = (1..=8)
            .map(|d| at(1, d, 9, High).with_tags(["walk"]))
            .collect();
        observations.push(at(1, 9, 9, Low).with_tags(["work"]));
        observations.push(at(1, 10, 9, Low));

        let config = EngineConfig::default().with_quarter("2026-Q1").with_seed("s-1");
        let report = generate_quarterly_report(&observations, &config, utc(3, 31, 12))
            .unwrap()
            .unwrap();
        let text = markdown(&report);

        assert!(text.starts_with("# Capacity Report Q1 2026"));
        assert!(text.contains("## Capacity Distribution"));
        assert!(text.contains("- Low: 2 entries (20%)"));
        assert!(text.contains("work: 10.0% of entries, 100.0% low capacity (top depleter)"));
        assert!(text.contains("2026-01-09 to 2026-01-10 (2 days) [work]"));
        assert!(text.contains(&report.provenance.fingerprint));
    }
}
