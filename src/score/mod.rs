//! Health scores from finalized metrics.

use crate::types::metrics::RepoMetrics;
use crate::types::scoring::{RepoScore, Score, ScoreCard, Weights};

/// Guards the min-max range so an all-equal population maps to zero.
pub const NORMALIZE_EPSILON: f64 = 1e-9;

pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Min-max scales `values` over the whole population.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    let range = max - min + NORMALIZE_EPSILON;
    values.iter().map(|value| (value - min) / range).collect()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn activity_score(metrics: &RepoMetrics) -> Score {
    metrics.active_days as f64 / metrics.lifetime_days.max(1) as f64
}

pub fn issue_score(metrics: &RepoMetrics) -> Score {
    safe_div(
        metrics.issue_closed_count as f64,
        metrics.issue_count as f64,
    )
}

pub fn pr_score(metrics: &RepoMetrics) -> Score {
    safe_div(metrics.pr_merged_count as f64, metrics.pr_count as f64)
}

/// Scores every repository with the default weights.
pub fn compute(metrics: &[RepoMetrics]) -> Vec<RepoScore> {
    compute_with(metrics, &Weights::default())
}

pub fn compute_with(metrics: &[RepoMetrics], weights: &Weights) -> Vec<RepoScore> {
    let actors = metrics
        .iter()
        .map(|row| row.unique_actors as f64)
        .collect::<Vec<_>>();
    let popularity = metrics
        .iter()
        .map(|row| (row.stargazers.saturating_add(row.forks).max(0) as f64).ln_1p())
        .collect::<Vec<_>>();
    let collaboration = normalize(&actors);
    let popularity = normalize(&popularity);

    metrics
        .iter()
        .zip(collaboration)
        .zip(popularity)
        .map(|((row, collaboration), popularity)| {
            let scores = ScoreCard::new(
                activity_score(row),
                collaboration,
                issue_score(row),
                pr_score(row),
                popularity,
            );
            RepoScore {
                repo_name: row.repo_name.clone(),
                repo_language: row.repo_language.clone(),
                scores,
                health_score: round2(100.0 * weights.combine(&scores)),
                stargazers: row.stargazers,
                forks: row.forks,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(name: &str) -> RepoMetrics {
        RepoMetrics {
            repo_name: name.to_string(),
            total_events: 0,
            active_days: 0,
            unique_actors: 0,
            first_event: None,
            last_event: None,
            lifetime_days: 1,
            issue_count: 0,
            issue_closed_count: 0,
            pr_count: 0,
            pr_merged_count: 0,
            pr_merge_rate: 0.0,
            repo_language: None,
            stargazers: 0,
            forks: 0,
        }
    }

    #[test]
    fn normalize_spans_unit_interval() {
        let scaled = normalize(&[3.0, 1.0, 5.0, 2.0]);
        assert_eq!(scaled[1], 0.0);
        assert!((scaled[2] - 1.0).abs() < 1e-6);
        assert!(scaled.iter().all(|value| (0.0..=1.0).contains(value)));
    }

    #[test]
    fn normalize_equal_population_is_all_zero() {
        assert_eq!(normalize(&[4.0, 4.0, 4.0]), vec![0.0, 0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn all_zero_metrics_score_zero_without_nan() {
        let rows = compute(&[metrics("org/a"), metrics("org/b")]);
        for row in rows {
            assert_eq!(row.scores, ScoreCard::default());
            assert_eq!(row.health_score, 0.0);
        }
    }

    #[test]
    fn dimension_scores_follow_their_formulas() {
        let mut busy = metrics("org/busy");
        busy.active_days = 12;
        busy.lifetime_days = 10;
        busy.unique_actors = 9;
        busy.issue_count = 4;
        busy.issue_closed_count = 3;
        busy.pr_count = 2;
        busy.pr_merged_count = 1;
        busy.stargazers = 90;
        busy.forks = 9;
        let mut quiet = metrics("org/quiet");
        quiet.unique_actors = 1;

        let rows = compute(&[busy, quiet]);
        let busy = &rows[0];
        assert_eq!(busy.scores.activity, 1.2);
        assert!((busy.scores.collaboration - 1.0).abs() < 1e-6);
        assert_eq!(busy.scores.issue, 0.75);
        assert_eq!(busy.scores.pull_request, 0.5);
        assert!((busy.scores.popularity - 1.0).abs() < 1e-6);
        // 100 * (0.25*1.2 + 0.20*1 + 0.20*0.75 + 0.20*0.5 + 0.15*1)
        assert_eq!(busy.health_score, 90.0);

        let quiet = &rows[1];
        assert_eq!(quiet.scores.collaboration, 0.0);
        assert_eq!(quiet.scores.popularity, 0.0);
    }

    #[test]
    fn health_score_is_rounded_to_two_places() {
        let mut row = metrics("org/a");
        row.issue_count = 3;
        row.issue_closed_count = 1;

        let scored = compute(&[row]);
        assert_eq!(scored[0].health_score, 6.67);
    }

    #[test]
    fn custom_weights_change_the_combination() {
        let mut row = metrics("org/a");
        row.pr_count = 1;
        row.pr_merged_count = 1;

        let weights = Weights::new([0.0, 0.0, 0.0, 1.0, 0.0]);
        let scored = compute_with(&[row], &weights);
        assert_eq!(scored[0].health_score, 100.0);
    }

    #[test]
    fn popularity_stays_finite_for_extreme_counts() {
        let mut huge = metrics("org/huge");
        huge.stargazers = i64::MAX;
        huge.forks = i64::MAX;
        let mut broken = metrics("org/broken");
        broken.stargazers = -40;
        broken.forks = 2;
        let plain = metrics("org/plain");

        let rows = compute(&[huge, broken, plain]);
        assert!((rows[0].scores.popularity - 1.0).abs() < 1e-6);
        assert_eq!(rows[1].scores.popularity, 0.0);
        assert_eq!(rows[2].scores.popularity, 0.0);
        assert!(rows.iter().all(|row| row.health_score.is_finite()));
    }
}
