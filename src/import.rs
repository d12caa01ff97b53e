//! Observation loading for the command-line driver. The engine itself never
//! touches files.

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{CapacityState, Category, Observation};

#[derive(serde::Deserialize)]
struct CsvRow {
    state: String,
    timestamp: DateTime<Utc>,
    date: Option<NaiveDate>,
    tags: Option<String>,
    category: Option<String>,
    note: Option<String>,
}

impl CsvRow {
    fn into_observation(self) -> anyhow::Result<Observation> {
        let state: CapacityState = self.state.parse().map_err(|e: String| anyhow!(e))?;
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Category>().map_err(|e| anyhow!(e))?),
        };
        let tags = self
            .tags
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Observation {
            state,
            timestamp: self.timestamp,
            date: self.date,
            tags,
            category,
            note: self.note.filter(|note| !note.trim().is_empty()),
        })
    }
}

/// Reads `state,timestamp,date,tags,category,note` rows; tags are `;`-separated.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut observations = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed csv row {}", index + 1))?;
        let observation = row
            .into_observation()
            .with_context(|| format!("invalid observation on row {}", index + 1))?;
        observations.push(observation);
    }

    Ok(observations)
}

pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Vec<Observation>> {
    serde_json::from_reader(reader).context("observations must be a JSON array")
}

/// Loads observations from a `.csv` or `.json` file.
pub fn load(path: &Path) -> anyhow::Result<Vec<Observation>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => read_csv(file),
        Some(ext) if ext.eq_ignore_ascii_case("json") => read_json(file),
        _ => Err(anyhow!(
            "unsupported input format for {} (expected .csv or .json)",
            path.display()
        )),
    }
}
