use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, Offset, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use capacity_insights::temporal::parse_date;
use capacity_insights::{
    aggregate, generate_quarterly_report, import, pattern_snapshot, project_trend, render,
    EngineConfig,
};

#[derive(Parser)]
#[command(name = "capacity-insights")]
#[command(about = "Capacity pattern analytics and quarterly reporting", long_about = None)]
struct Cli {
    /// TOML engine configuration
    #[arg(long, global = true, env = "CAPACITY_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// Evaluate as if "now" were this RFC 3339 instant
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Observations as .csv or .json
    #[arg(long)]
    input: PathBuf,
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Windowed pattern metrics and chart series
    Snapshot {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        minimum_days: Option<usize>,
    },
    /// Decline projection over the most recent days
    Project {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Quarterly report as JSON, optionally also as markdown
    Report {
        #[command(flatten)]
        input: InputArgs,
        /// Quarter such as 2026-Q1; defaults to the current quarter
        #[arg(long)]
        quarter: Option<String>,
        /// Seed for the anonymized subject code
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            EngineConfig::from_toml_str(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => {
            let mut config = EngineConfig::default();
            config.utc_offset_minutes = Local::now().offset().fix().local_minus_utc() / 60;
            config
        }
    };
    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn apply_window(config: &mut EngineConfig, input: &InputArgs) {
    if input.start.is_some() {
        config.window_start = input.start;
    }
    if input.end.is_some() {
        config.window_end = input.end;
    }
}

fn write_json<T: serde::Serialize>(value: &T, out: Option<&PathBuf>) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote json output");
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Commands::Snapshot {
            input,
            minimum_days,
        } => {
            apply_window(&mut config, &input);
            if let Some(days) = minimum_days {
                config.minimum_days = days;
            }
            let observations = import::load(&input.input)?;
            match pattern_snapshot(&observations, &config, now)? {
                Some(snapshot) => write_json(&snapshot, None)?,
                None => println!(
                    "Not enough history yet: fewer than {} days with entries.",
                    config.minimum_days
                ),
            }
        }
        Commands::Project { input } => {
            apply_window(&mut config, &input);
            let observations = import::load(&input.input)?;
            let window = config.resolve_window(now)?;
            let daily = aggregate::daily_means(
                &observations,
                &window,
                config.reporting_offset()?,
            );
            match project_trend(&daily, window.end, &config.thresholds) {
                Some(projection) => write_json(&projection, None)?,
                None => println!("No declining trend to project."),
            }
        }
        Commands::Report {
            input,
            quarter,
            seed,
            json,
            out,
        } => {
            apply_window(&mut config, &input);
            if quarter.is_some() {
                config.quarter = quarter;
            }
            if seed.is_some() {
                config.id_seed = seed;
            }
            let observations = import::load(&input.input)?;
            let Some(report) = generate_quarterly_report(&observations, &config, now)? else {
                println!(
                    "Not enough entries this quarter: at least {} are needed.",
                    config.thresholds.min_report_observations
                );
                return Ok(());
            };
            if let Some(path) = &out {
                std::fs::write(path, render::markdown(&report))
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Report written to {}.", path.display());
            }
            if json.is_some() || out.is_none() {
                write_json(&report, json.as_ref())?;
            }
        }
    }

    Ok(())
}
