use crate::error::Result;
use crate::store::{
    boolean_column, float64_column, int64_column, opt_datetime, opt_str, read_schema, read_table,
    required, string_column, timestamp_column, to_micros, uint64_column, write_table,
};
use crate::types::metrics::RepoMetrics;
use crate::types::scoring::{Dimension, RepoScore, ScoreCard};
use arrow::array::{
    Array, ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

fn metrics_schema() -> Schema {
    let timestamp = DataType::Timestamp(TimeUnit::Microsecond, None);
    Schema::new(vec![
        Field::new("repo_name", DataType::Utf8, false),
        Field::new("total_events", DataType::UInt64, false),
        Field::new("active_days", DataType::UInt64, false),
        Field::new("unique_actors", DataType::UInt64, false),
        Field::new("first_event", timestamp.clone(), true),
        Field::new("last_event", timestamp, true),
        Field::new("lifetime_days", DataType::Int64, false),
        Field::new("issue_count", DataType::UInt64, false),
        Field::new("issue_closed_count", DataType::UInt64, false),
        Field::new("pr_count", DataType::UInt64, false),
        Field::new("pr_merged_count", DataType::UInt64, false),
        Field::new("pr_merge_rate", DataType::Float64, false),
        Field::new("repo_language", DataType::Utf8, true),
        Field::new("stargazers", DataType::Int64, false),
        Field::new("forks", DataType::Int64, false),
    ])
}

fn score_schema() -> Schema {
    let mut fields = vec![
        Field::new("repo_name", DataType::Utf8, false),
        Field::new("repo_language", DataType::Utf8, true),
        Field::new("health_score", DataType::Float64, false),
    ];
    fields.extend(
        Dimension::ALL
            .iter()
            .map(|dimension| Field::new(dimension.column(), DataType::Float64, false)),
    );
    fields.push(Field::new("stargazers", DataType::Int64, false));
    fields.push(Field::new("forks", DataType::Int64, false));
    Schema::new(fields)
}

pub fn write_metrics(path: &Path, rows: &[RepoMetrics]) -> Result<()> {
    let count = |f: fn(&RepoMetrics) -> u64| -> ArrayRef {
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(f)))
    };
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.repo_name))),
        count(|r| r.total_events),
        count(|r| r.active_days),
        count(|r| r.unique_actors),
        Arc::new(TimestampMicrosecondArray::from_iter(
            rows.iter().map(|r| to_micros(r.first_event)),
        )),
        Arc::new(TimestampMicrosecondArray::from_iter(
            rows.iter().map(|r| to_micros(r.last_event)),
        )),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.lifetime_days))),
        count(|r| r.issue_count),
        count(|r| r.issue_closed_count),
        count(|r| r.pr_count),
        count(|r| r.pr_merged_count),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.pr_merge_rate))),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| r.repo_language.as_deref()))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.stargazers))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.forks))),
    ];
    let batch = RecordBatch::try_new(Arc::new(metrics_schema()), columns)?;
    write_table(path, &batch)
}

pub fn read_metrics(path: &Path) -> Result<Vec<RepoMetrics>> {
    let mut rows = Vec::new();
    for batch in read_table(path, None)? {
        let names = string_column(&batch, "repo_name", path)?;
        let total_events = uint64_column(&batch, "total_events", path)?;
        let active_days = uint64_column(&batch, "active_days", path)?;
        let unique_actors = uint64_column(&batch, "unique_actors", path)?;
        let first_event = timestamp_column(&batch, "first_event", path)?;
        let last_event = timestamp_column(&batch, "last_event", path)?;
        let lifetime_days = int64_column(&batch, "lifetime_days", path)?;
        let issue_count = uint64_column(&batch, "issue_count", path)?;
        let issue_closed = uint64_column(&batch, "issue_closed_count", path)?;
        let pr_count = uint64_column(&batch, "pr_count", path)?;
        let pr_merged = uint64_column(&batch, "pr_merged_count", path)?;
        let pr_merge_rate = float64_column(&batch, "pr_merge_rate", path)?;
        let languages = string_column(&batch, "repo_language", path)?;
        let stars = int64_column(&batch, "stargazers", path)?;
        let forks = int64_column(&batch, "forks", path)?;

        for row in 0..batch.num_rows() {
            let Some(repo_name) = opt_str(&names, row) else {
                continue;
            };
            rows.push(RepoMetrics {
                repo_name: repo_name.to_string(),
                total_events: required(&total_events, "total_events", row)?,
                active_days: required(&active_days, "active_days", row)?,
                unique_actors: required(&unique_actors, "unique_actors", row)?,
                first_event: opt_datetime(&first_event, row),
                last_event: opt_datetime(&last_event, row),
                lifetime_days: required(&lifetime_days, "lifetime_days", row)?,
                issue_count: required(&issue_count, "issue_count", row)?,
                issue_closed_count: required(&issue_closed, "issue_closed_count", row)?,
                pr_count: required(&pr_count, "pr_count", row)?,
                pr_merged_count: required(&pr_merged, "pr_merged_count", row)?,
                pr_merge_rate: required(&pr_merge_rate, "pr_merge_rate", row)?,
                repo_language: opt_str(&languages, row).map(str::to_string),
                stargazers: required(&stars, "stargazers", row)?,
                forks: required(&forks, "forks", row)?,
            });
        }
    }
    Ok(rows)
}

pub fn write_scores(path: &Path, rows: &[RepoScore]) -> Result<()> {
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.repo_name))),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| r.repo_language.as_deref()))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.health_score))),
    ];
    for dimension in Dimension::ALL {
        columns.push(Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.scores.get(dimension)),
        )));
    }
    columns.push(Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.stargazers))));
    columns.push(Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.forks))));

    let batch = RecordBatch::try_new(Arc::new(score_schema()), columns)?;
    write_table(path, &batch)
}

pub fn read_scores(path: &Path) -> Result<Vec<RepoScore>> {
    let mut rows = Vec::new();
    for batch in read_table(path, None)? {
        let names = string_column(&batch, "repo_name", path)?;
        let languages = string_column(&batch, "repo_language", path)?;
        let health = float64_column(&batch, "health_score", path)?;
        let mut dimensions = Vec::with_capacity(Dimension::ALL.len());
        for dimension in Dimension::ALL {
            dimensions.push(float64_column(&batch, dimension.column(), path)?);
        }
        let stars = int64_column(&batch, "stargazers", path)?;
        let forks = int64_column(&batch, "forks", path)?;

        for row in 0..batch.num_rows() {
            let Some(repo_name) = opt_str(&names, row) else {
                continue;
            };
            let mut values = [0.0; 5];
            for ((value, dimension), array) in
                values.iter_mut().zip(Dimension::ALL).zip(&dimensions)
            {
                *value = required(array, dimension.column(), row)?;
            }
            let [activity, collaboration, issue, pull_request, popularity] = values;
            rows.push(RepoScore {
                repo_name: repo_name.to_string(),
                repo_language: opt_str(&languages, row).map(str::to_string),
                scores: ScoreCard::new(activity, collaboration, issue, pull_request, popularity),
                health_score: required(&health, "health_score", row)?,
                stargazers: required(&stars, "stargazers", row)?,
                forks: required(&forks, "forks", row)?,
            });
        }
    }
    Ok(rows)
}

pub fn write_reference(path: &Path, names: &BTreeSet<String>) -> Result<()> {
    let schema = Schema::new(vec![
        Field::new("repo_name", DataType::Utf8, false),
        Field::new("is_reference", DataType::Int64, false),
    ]);
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(names.iter())),
        Arc::new(Int64Array::from_iter_values(names.iter().map(|_| 1))),
    ];
    let batch = RecordBatch::try_new(Arc::new(schema), columns)?;
    write_table(path, &batch)
}

/// Reference repository names. Rows flagged false or zero in an optional
/// `is_reference` column are left out.
pub fn read_reference(path: &Path) -> Result<BTreeSet<String>> {
    let has_flag = read_schema(path)?.column_with_name("is_reference").is_some();
    let mut names = BTreeSet::new();
    for batch in read_table(path, None)? {
        let repo_names = string_column(&batch, "repo_name", path)?;
        let flags = if has_flag {
            Some(boolean_column(&batch, "is_reference", path)?)
        } else {
            None
        };
        for row in 0..batch.num_rows() {
            let included = flags
                .as_ref()
                .map(|flags| flags.is_valid(row) && flags.value(row))
                .unwrap_or(true);
            if let (true, Some(name)) = (included, opt_str(&repo_names, row)) {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}
