//! Streaming per-repository metrics.
//!
//! Partitions are folded one at a time into a [`StateTable`]. Every field of
//! a [`RepoState`] only grows (sets, counts, maxima) or tightens (first and
//! last event), so the result does not depend on partition order. The one
//! exception is the repository language, which sticks to the first non-null
//! value seen.

use crate::error::Result;
use crate::partitions::PartitionSet;
use crate::types::event::{EventBatch, EventKind, EventRecord};
use crate::types::metrics::RepoMetrics;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct RepoState {
    pub total_events: u64,
    pub active_days: HashSet<NaiveDate>,
    pub actors: HashSet<String>,
    pub first_event: Option<NaiveDateTime>,
    pub last_event: Option<NaiveDateTime>,
    pub issue_count: u64,
    pub issue_closed_count: u64,
    pub pr_count: u64,
    pub pr_merged_count: u64,
    pub language: Option<String>,
    pub stargazers: i64,
    pub forks: i64,
}

pub type StateTable = HashMap<String, RepoState>;

/// Running state of a repository that has not been seen yet.
pub fn default_state() -> RepoState {
    RepoState {
        total_events: 0,
        active_days: HashSet::new(),
        actors: HashSet::new(),
        first_event: None,
        last_event: None,
        issue_count: 0,
        issue_closed_count: 0,
        pr_count: 0,
        pr_merged_count: 0,
        language: None,
        stargazers: 0,
        forks: 0,
    }
}

/// Returns the state for `repo`, inserting [`default_state`] on first sight.
pub fn state_entry<'a>(table: &'a mut StateTable, repo: &str) -> &'a mut RepoState {
    table.entry(repo.to_string()).or_insert_with(default_state)
}

fn earliest(current: Option<NaiveDateTime>, seen: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (current, seen) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(current: Option<NaiveDateTime>, seen: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (current, seen) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

impl RepoState {
    /// Folds one repository's rows from a single batch into the state.
    pub fn absorb(&mut self, events: &[&EventRecord]) {
        self.total_events += events.len() as u64;
        for event in events {
            if let Some(created_at) = event.created_at {
                self.active_days.insert(created_at.date());
                self.first_event = earliest(self.first_event, Some(created_at));
                self.last_event = latest(self.last_event, Some(created_at));
            }
            if let Some(actor) = &event.actor {
                if !self.actors.contains(actor) {
                    self.actors.insert(actor.clone());
                }
            }
            match event.kind {
                Some(EventKind::Issue) => self.issue_count += 1,
                Some(EventKind::PullRequest) => self.pr_count += 1,
                Some(EventKind::Other) | None => {}
            }
            // closed/merged are counted from the timestamps alone, whatever
            // the event type of the row
            if event.issue_closed_at.is_some() {
                self.issue_closed_count += 1;
            }
            if event.pull_merged_at.is_some() {
                self.pr_merged_count += 1;
            }
            if let Some(stars) = event.stargazers {
                self.stargazers = self.stargazers.max(stars);
            }
            if let Some(forks) = event.forks {
                self.forks = self.forks.max(forks);
            }
        }
        if self.language.is_none() {
            self.language = events.iter().find_map(|event| event.language.clone());
        }
    }

    /// Folds a partial state computed elsewhere. `self` keeps its language
    /// when it already has one.
    pub fn merge(&mut self, other: RepoState) {
        self.total_events += other.total_events;
        self.active_days.extend(other.active_days);
        self.actors.extend(other.actors);
        self.first_event = earliest(self.first_event, other.first_event);
        self.last_event = latest(self.last_event, other.last_event);
        self.issue_count += other.issue_count;
        self.issue_closed_count += other.issue_closed_count;
        self.pr_count += other.pr_count;
        self.pr_merged_count += other.pr_merged_count;
        if self.language.is_none() {
            self.language = other.language;
        }
        self.stargazers = self.stargazers.max(other.stargazers);
        self.forks = self.forks.max(other.forks);
    }

    pub fn finalize(self, repo_name: String) -> RepoMetrics {
        let lifetime_days = match (self.first_event, self.last_event) {
            (Some(first), Some(last)) => (last - first).num_days().max(1),
            _ => 1,
        };
        let pr_merge_rate = if self.pr_count > 0 {
            self.pr_merged_count as f64 / self.pr_count as f64
        } else {
            0.0
        };
        RepoMetrics {
            repo_name,
            total_events: self.total_events,
            active_days: self.active_days.len() as u64,
            unique_actors: self.actors.len() as u64,
            first_event: self.first_event,
            last_event: self.last_event,
            lifetime_days,
            issue_count: self.issue_count,
            issue_closed_count: self.issue_closed_count,
            pr_count: self.pr_count,
            pr_merged_count: self.pr_merged_count,
            pr_merge_rate,
            repo_language: self.language,
            stargazers: self.stargazers,
            forks: self.forks,
        }
    }
}

/// Merges one batch into the table in place.
pub fn update(table: &mut StateTable, batch: &EventBatch) {
    if batch.is_empty() {
        debug!("no events in {}", batch.source.display());
        return;
    }
    let mut groups: HashMap<&str, Vec<&EventRecord>> = HashMap::new();
    for event in &batch.events {
        groups.entry(event.repo_name.as_str()).or_default().push(event);
    }
    debug!(
        "{} event(s) across {} repositories in {}",
        batch.len(),
        groups.len(),
        batch.source.display()
    );
    for (repo, events) in groups {
        state_entry(table, repo).absorb(&events);
    }
}

/// Folds a partial table built from other partitions into `into`.
pub fn merge(into: &mut StateTable, other: StateTable) {
    for (repo, state) in other {
        match into.get_mut(&repo) {
            Some(existing) => existing.merge(state),
            None => {
                into.insert(repo, state);
            }
        }
    }
}

/// Converts every running state into a metrics row, ordered by repository.
pub fn finalize(table: StateTable) -> Vec<RepoMetrics> {
    let mut rows = table
        .into_iter()
        .map(|(repo, state)| state.finalize(repo))
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| a.repo_name.cmp(&b.repo_name));
    rows
}

/// Streams every selected partition and finalizes. Each partition is
/// folded into its own table first, then merged into the run table.
pub fn aggregate_partitions(partitions: &PartitionSet) -> Result<Vec<RepoMetrics>> {
    info!("aggregating {} partition(s)", partitions.paths().len());
    let mut table = StateTable::new();
    for batch in partitions.batches() {
        let batch = batch?;
        let mut partial = StateTable::new();
        update(&mut partial, &batch);
        let seen = partial.len();
        merge(&mut table, partial);
        info!("{} repositories in partition, {} tracked", seen, table.len());
    }
    Ok(finalize(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::events::fixtures::{at, event};
    use std::path::PathBuf;

    fn batch(events: Vec<EventRecord>) -> EventBatch {
        EventBatch {
            source: PathBuf::from("mem"),
            events,
        }
    }

    fn run(batches: &[EventBatch]) -> Vec<RepoMetrics> {
        let mut table = StateTable::new();
        for batch in batches {
            update(&mut table, batch);
        }
        finalize(table)
    }

    fn with_stars(mut record: EventRecord, stars: i64, forks: i64) -> EventRecord {
        record.stargazers = Some(stars);
        record.forks = Some(forks);
        record
    }

    fn sample_partitions() -> Vec<EventBatch> {
        let mut merged = event("org/b", EventKind::PullRequest, at(2, 3), "dana");
        merged.pull_merged_at = Some(at(3, 0));
        let mut closed = event("org/b", EventKind::Issue, at(9, 1), "erin");
        closed.issue_closed_at = Some(at(9, 2));
        vec![
            batch(vec![
                with_stars(event("org/a", EventKind::Issue, at(1, 8), "alice"), 10, 1),
                event("org/a", EventKind::Other, at(1, 9), "alice"),
                with_stars(event("org/a", EventKind::Other, at(2, 8), "alice"), 10, 1),
                merged,
            ]),
            batch(vec![
                with_stars(event("org/a", EventKind::Other, at(3, 8), "alice"), 15, 2),
                with_stars(event("org/a", EventKind::Other, at(3, 20), "alice"), 12, 2),
                event("org/b", EventKind::PullRequest, at(4, 3), "dana"),
            ]),
            batch(vec![
                closed,
                event("org/c", EventKind::Other, at(5, 0), "frank"),
            ]),
        ]
    }

    #[test]
    fn two_partition_example_keeps_peak_popularity() {
        let partitions = sample_partitions();
        let rows = run(&partitions[..2]);
        let a = rows
            .iter()
            .find(|row| row.repo_name == "org/a")
            .expect("org/a should be tracked");

        assert_eq!(a.total_events, 5);
        assert_eq!(a.active_days, 3);
        assert_eq!(a.unique_actors, 1);
        assert_eq!(a.issue_count, 1);
        assert_eq!(a.issue_closed_count, 0);
        assert_eq!(a.stargazers, 15);
        assert_eq!(a.forks, 2);
        assert_eq!(a.first_event, Some(at(1, 8)));
        assert_eq!(a.last_event, Some(at(3, 20)));
        assert_eq!(a.lifetime_days, 2);
    }

    #[test]
    fn partition_order_does_not_change_metrics() {
        let partitions = sample_partitions();
        let expected = run(&partitions);
        for order in [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
            let permuted = order
                .iter()
                .map(|index| partitions[*index].clone())
                .collect::<Vec<_>>();
            assert_eq!(run(&permuted), expected, "order {order:?}");
        }
    }

    #[test]
    fn partial_tables_merge_to_the_sequential_result() {
        let partitions = sample_partitions();
        let expected = run(&partitions);

        let mut left = StateTable::new();
        update(&mut left, &partitions[0]);
        let mut right = StateTable::new();
        update(&mut right, &partitions[2]);
        update(&mut right, &partitions[1]);
        merge(&mut left, right);

        assert_eq!(finalize(left), expected);
    }

    #[test]
    fn null_event_types_are_counted_in_neither_bucket() {
        let mut untyped = event("org/a", EventKind::Issue, at(1, 0), "a");
        untyped.kind = None;
        let rows = run(&[batch(vec![
            untyped,
            event("org/a", EventKind::PullRequest, at(1, 1), "b"),
        ])]);

        assert_eq!(rows[0].total_events, 2);
        assert_eq!(rows[0].issue_count, 0);
        assert_eq!(rows[0].pr_count, 1);
    }

    #[test]
    fn closed_and_merged_counts_follow_timestamps() {
        let mut stray_close = event("org/a", EventKind::Other, at(1, 0), "a");
        stray_close.issue_closed_at = Some(at(1, 5));
        let rows = run(&[batch(vec![stray_close])]);

        assert_eq!(rows[0].issue_count, 0);
        assert_eq!(rows[0].issue_closed_count, 1);
        assert_eq!(rows[0].pr_merge_rate, 0.0);
    }

    #[test]
    fn language_sticks_to_first_partition_with_a_value() {
        let mut unknown = event("org/a", EventKind::Other, at(1, 0), "a");
        unknown.language = None;
        let mut rust = event("org/a", EventKind::Other, at(2, 0), "a");
        rust.language = Some("Rust".to_string());
        let mut go = event("org/a", EventKind::Other, at(3, 0), "a");
        go.language = Some("Go".to_string());

        let rows = run(&[
            batch(vec![unknown]),
            batch(vec![rust]),
            batch(vec![go.clone(), go]),
        ]);
        assert_eq!(rows[0].repo_language.as_deref(), Some("Rust"));
    }

    #[test]
    fn repository_without_timestamps_has_unit_lifetime() {
        let mut undated = event("org/a", EventKind::Other, at(1, 0), "a");
        undated.created_at = None;
        let rows = run(&[batch(vec![undated])]);

        assert_eq!(rows[0].active_days, 0);
        assert_eq!(rows[0].first_event, None);
        assert_eq!(rows[0].lifetime_days, 1);
    }

    #[test]
    fn merge_rate_is_ratio_of_merged_to_opened() {
        let mut merged = event("org/a", EventKind::PullRequest, at(1, 0), "a");
        merged.pull_merged_at = Some(at(2, 0));
        let rows = run(&[batch(vec![
            merged,
            event("org/a", EventKind::PullRequest, at(1, 1), "a"),
            event("org/a", EventKind::PullRequest, at(1, 2), "a"),
            event("org/a", EventKind::PullRequest, at(1, 3), "a"),
        ])]);

        assert_eq!(rows[0].pr_merge_rate, 0.25);
    }

    #[test]
    fn state_entry_creates_default_state_once() {
        let mut table = StateTable::new();
        state_entry(&mut table, "org/a").total_events += 3;
        state_entry(&mut table, "org/a").total_events += 1;

        assert_eq!(table.len(), 1);
        assert_eq!(table["org/a"].total_events, 4);
        assert_eq!(default_state().stargazers, 0);
    }
}
