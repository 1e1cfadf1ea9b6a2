use crate::error::Result;
use crate::store::{
    int64_column, opt_datetime, opt_i64, opt_str, read_table, string_column, timestamp_column,
};
use crate::types::event::{EventBatch, EventKind, EventRecord};
use arrow::record_batch::RecordBatch;
use std::path::Path;
use tracing::debug;

/// Columns projected out of every event partition.
pub const EVENT_COLUMNS: [&str; 9] = [
    "repo_name",
    "type",
    "created_at",
    "actor_login",
    "issue_closed_at",
    "pull_merged_at",
    "repo_language",
    "repo_stargazers_count",
    "repo_forks_count",
];

pub fn read_partition(path: &Path) -> Result<EventBatch> {
    let record_batches = read_table(path, Some(EVENT_COLUMNS.as_slice()))?;
    let mut events = Vec::new();
    let mut skipped = 0;
    for batch in &record_batches {
        skipped += decode_events(batch, path, &mut events)?;
    }
    if skipped > 0 {
        debug!("skipped {} row(s) without repo_name in {}", skipped, path.display());
    }
    Ok(EventBatch {
        source: path.to_path_buf(),
        events,
    })
}

/// Appends the rows of `batch` to `out`, returning how many rows were
/// dropped for lacking a repository name.
fn decode_events(batch: &RecordBatch, source: &Path, out: &mut Vec<EventRecord>) -> Result<usize> {
    let repo_names = string_column(batch, "repo_name", source)?;
    let types = string_column(batch, "type", source)?;
    let created = timestamp_column(batch, "created_at", source)?;
    let actors = string_column(batch, "actor_login", source)?;
    let closed = timestamp_column(batch, "issue_closed_at", source)?;
    let merged = timestamp_column(batch, "pull_merged_at", source)?;
    let languages = string_column(batch, "repo_language", source)?;
    let stars = int64_column(batch, "repo_stargazers_count", source)?;
    let forks = int64_column(batch, "repo_forks_count", source)?;

    let mut skipped = 0;
    out.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let Some(repo_name) = opt_str(&repo_names, row) else {
            skipped += 1;
            continue;
        };
        out.push(EventRecord {
            repo_name: repo_name.to_string(),
            kind: opt_str(&types, row).map(EventKind::from_tag),
            created_at: opt_datetime(&created, row),
            actor: opt_str(&actors, row).map(str::to_string),
            issue_closed_at: opt_datetime(&closed, row),
            pull_merged_at: opt_datetime(&merged, row),
            language: opt_str(&languages, row).map(str::to_string),
            stargazers: opt_i64(&stars, row),
            forks: opt_i64(&forks, row),
        });
    }
    Ok(skipped)
}
