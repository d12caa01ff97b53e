use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Entry, QuarterView};
use crate::temporal::inclusive_days;

const MAX_EPISODES: usize = 5;
const MAX_EPISODE_TAGS: usize = 3;

/// A run of consecutive low-capacity entries spanning at least two dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub day_count: u32,
    pub entries: usize,
    pub tags: Vec<String>,
}

pub fn find_episodes(view: &QuarterView<'_>) -> Vec<Episode> {
    let mut episodes = Vec::new();
    let mut run: Vec<&Entry<'_>> = Vec::new();

    for entry in &view.entries {
        if entry.is_low() {
            run.push(entry);
            continue;
        }
        if let Some(episode) = close_run(&run) {
            episodes.push(episode);
        }
        run.clear();
    }
    if let Some(episode) = close_run(&run) {
        episodes.push(episode);
    }

    episodes.truncate(MAX_EPISODES);
    episodes
}

fn close_run(run: &[&Entry<'_>]) -> Option<Episode> {
    let (first, last) = (run.first()?, run.last()?);
    let start_date = run.iter().map(|entry| entry.date).min()?;
    let end_date = run.iter().map(|entry| entry.date).max()?;
    if start_date == end_date {
        return None;
    }

    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in run {
        for tag in &entry.observation.tags {
            let tag = tag.trim();
            if !tag.is_empty() {
                *tag_counts.entry(tag).or_insert(0) += 1;
            }
        }
    }
    let mut tags: Vec<(&str, usize)> = tag_counts.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    Some(Episode {
        start: first.observation.timestamp,
        end: last.observation.timestamp,
        start_date,
        end_date,
        day_count: inclusive_days(start_date, end_date),
        entries: run.len(),
        tags: tags
            .into_iter()
            .take(MAX_EPISODE_TAGS)
            .map(|(tag, _)| tag.to_string())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CapacityState::{High, Low, Moderate};
    use crate::report::fixtures::{at, view};

    #[test]
    fn single_day_run_is_not_an_episode() {
        let observations = vec![at(1, 2, 9, Low), at(1, 2, 18, Low), at(1, 3, 9, High)];
        assert!(find_episodes(&view(&observations)).is_empty());
    }

    #[test]
    fn multi_day_run_becomes_episode_with_top_tags() {
        let observations = vec![
            at(1, 1, 9, High),
            at(1, 2, 9, Low).with_tags(["noise", "work"]),
            at(1, 3, 9, Low).with_tags(["work", "travel"]),
            at(1, 4, 9, Low).with_tags(["work", "noise", "alone"]),
            at(1, 5, 9, Moderate),
        ];
        let episodes = find_episodes(&view(&observations));
        assert_eq!(episodes.len(), 1);
        let episode = &episodes[0];
        assert_eq!(episode.day_count, 3);
        assert_eq!(episode.entries, 3);
        assert_eq!(episode.tags, vec!["work", "noise", "alone"]);
    }

    #[test]
    fn run_open_at_quarter_end_still_counts() {
        let observations = vec![at(3, 30, 9, Low), at(3, 31, 9, Low)];
        let episodes = find_episodes(&view(&observations));
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].day_count, 2);
    }

    #[test]
    fn caps_at_five_earliest() {
        let mut observations = Vec::new();
        for week in 0..7u32 {
            let day = 1 + week * 4;
            observations.push(at(1, day, 9, Low));
            observations.push(at(1, day + 1, 9, Low));
            observations.push(at(1, day + 2, 9, High));
        }
        let episodes = find_episodes(&view(&observations));
        assert_eq!(episodes.len(), 5);
        assert_eq!(episodes[0].start_date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(episodes[4].start_date, NaiveDate::from_ymd_opt(2026, 1, 17).unwrap());
    }
}
