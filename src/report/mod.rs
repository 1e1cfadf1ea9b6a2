pub mod json;
pub mod md;

use crate::error::HealthError;
use crate::types::scoring::RepoScore;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Md,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub p90: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub groups: Vec<GroupStats>,
}

/// Linear interpolation between closest ranks of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

fn group_stats(group: &str, mut values: Vec<f64>) -> GroupStats {
    values.sort_by(|a, b| a.total_cmp(b));
    let mean = if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    };
    GroupStats {
        group: group.to_string(),
        count: values.len(),
        mean,
        median: quantile(&values, 0.5),
        p75: quantile(&values, 0.75),
        p90: quantile(&values, 0.90),
    }
}

/// Health score distribution of reference repositories against the rest.
pub fn summarize(scores: &[RepoScore], reference: &BTreeSet<String>) -> ScoreSummary {
    let (inside, outside): (Vec<&RepoScore>, Vec<&RepoScore>) = scores
        .iter()
        .partition(|row| reference.contains(&row.repo_name));
    let health = |rows: Vec<&RepoScore>| -> Vec<f64> {
        rows.iter().map(|row| row.health_score).collect()
    };
    ScoreSummary {
        groups: vec![
            group_stats("reference", health(inside)),
            group_stats("others", health(outside)),
        ],
    }
}

pub fn render(summary: &ScoreSummary, format: OutputFormat) -> Result<String, HealthError> {
    match format {
        OutputFormat::Json => json::to_json(summary).map_err(HealthError::Json),
        OutputFormat::Md => Ok(md::to_markdown(summary)),
    }
}
