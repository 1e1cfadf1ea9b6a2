//! Reference-set weight calibration.
//!
//! Weights are re-derived from the dimension means of a set of known good
//! repositories, the activity weight is capped, and a single scale factor
//! moves the reference set's mean score onto the target. The same weights
//! and factor are then applied to every repository.

use crate::error::{HealthError, Result};
use crate::types::scoring::{Dimension, RepoScore, Score, ScoreCard, Weights};
use std::collections::{BTreeSet, HashSet};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Calibration {
    /// Weights after capping; they sum to one.
    pub weights: Weights,
    pub scale_factor: f64,
    pub reference_matched: usize,
    /// Listed reference names with no scored row.
    pub reference_unmatched: usize,
    /// Mean calibrated score of the reference set.
    pub reference_mean: Score,
    pub scores: Vec<RepoScore>,
}

/// Clamps `dimension` to `cap` and hands the excess to the other dimensions
/// in proportion to their current weights. One pass, no re-check.
pub fn cap_and_redistribute(weights: &Weights, dimension: Dimension, cap: f64) -> Weights {
    let current = weights.get(dimension);
    if current <= cap {
        return weights.clone();
    }

    let excess = current - cap;
    let others = weights
        .iter()
        .filter(|(other, _)| *other != dimension)
        .collect::<Vec<_>>();
    let others_total: f64 = others.iter().map(|(_, weight)| weight).sum();

    let mut capped = weights.clone();
    capped.set(dimension, cap);
    for (other, weight) in &others {
        let share = if others_total > 0.0 {
            weight / others_total
        } else {
            1.0 / others.len() as f64
        };
        capped.set(*other, weight + share * excess);
    }
    capped
}

pub fn dimension_means(rows: &[&RepoScore]) -> ScoreCard {
    let count = rows.len().max(1) as f64;
    let mean = |dimension: Dimension| {
        rows.iter().map(|row| row.scores.get(dimension)).sum::<f64>() / count
    };
    ScoreCard::new(
        mean(Dimension::Activity),
        mean(Dimension::Collaboration),
        mean(Dimension::Issue),
        mean(Dimension::PullRequest),
        mean(Dimension::Popularity),
    )
}

/// Weights proportional to the dimension means.
pub fn weights_from_means(means: &ScoreCard) -> Result<Weights> {
    let total: f64 = Dimension::ALL.iter().map(|d| means.get(*d)).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(HealthError::ZeroReferenceMean);
    }
    Ok(Weights::new(Dimension::ALL.map(|d| means.get(d) / total)))
}

pub fn calibrate(
    scores: &[RepoScore],
    reference: &BTreeSet<String>,
    target_mean: f64,
    max_activity_weight: f64,
) -> Result<Calibration> {
    let reference_rows = scores
        .iter()
        .filter(|row| reference.contains(&row.repo_name))
        .collect::<Vec<_>>();
    if reference_rows.is_empty() {
        return Err(HealthError::EmptyReferenceSet);
    }
    let scored_names = scores
        .iter()
        .map(|row| row.repo_name.as_str())
        .collect::<HashSet<_>>();
    let unmatched = reference
        .iter()
        .filter(|name| !scored_names.contains(name.as_str()))
        .count();
    info!(
        "matched {} reference repositories ({} listed names unmatched)",
        reference_rows.len(),
        unmatched
    );

    let means = dimension_means(&reference_rows);
    for dimension in Dimension::ALL {
        info!("reference mean {:<14}: {:.4}", dimension.key(), means.get(dimension));
    }

    let weights = cap_and_redistribute(
        &weights_from_means(&means)?,
        Dimension::Activity,
        max_activity_weight,
    );

    let current_mean = reference_rows
        .iter()
        .map(|row| weights.combine(&row.scores))
        .sum::<f64>()
        / reference_rows.len() as f64;
    if current_mean == 0.0 {
        return Err(HealthError::ZeroReferenceMean);
    }
    let scale_factor = target_mean / current_mean;

    let calibrated = scores
        .iter()
        .map(|row| RepoScore {
            health_score: weights.combine(&row.scores) * scale_factor,
            ..row.clone()
        })
        .collect::<Vec<_>>();

    let reference_mean = calibrated
        .iter()
        .filter(|row| reference.contains(&row.repo_name))
        .map(|row| row.health_score)
        .sum::<f64>()
        / reference_rows.len() as f64;

    Ok(Calibration {
        weights,
        scale_factor,
        reference_matched: reference_rows.len(),
        reference_unmatched: unmatched,
        reference_mean,
        scores: calibrated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn scored(name: &str, card: ScoreCard) -> RepoScore {
        RepoScore {
            repo_name: name.to_string(),
            repo_language: None,
            scores: card,
            health_score: 0.0,
            stargazers: 0,
            forks: 0,
        }
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn cap_redistributes_excess_proportionally() {
        let weights = Weights::new([0.5, 0.3, 0.1, 0.1, 0.0]);
        let capped = cap_and_redistribute(&weights, Dimension::Activity, 0.4);

        assert_eq!(capped.get(Dimension::Activity), 0.4);
        assert!(approx(capped.get(Dimension::Collaboration), 0.36));
        assert!(approx(capped.get(Dimension::Issue), 0.12));
        assert!(approx(capped.get(Dimension::PullRequest), 0.12));
        assert_eq!(capped.get(Dimension::Popularity), 0.0);
        assert!(approx(capped.sum(), 1.0));
    }

    #[test]
    fn cap_leaves_weights_below_ceiling_untouched() {
        let weights = Weights::new([0.4, 0.15, 0.15, 0.15, 0.15]);
        assert_eq!(
            cap_and_redistribute(&weights, Dimension::Activity, 0.4),
            weights
        );
    }

    #[test]
    fn cap_splits_evenly_when_other_weights_are_zero() {
        let weights = Weights::new([1.0, 0.0, 0.0, 0.0, 0.0]);
        let capped = cap_and_redistribute(&weights, Dimension::Activity, 0.4);

        assert_eq!(capped.get(Dimension::Activity), 0.4);
        for dimension in &Dimension::ALL[1..] {
            assert!(approx(capped.get(*dimension), 0.15));
        }
        assert!(approx(capped.sum(), 1.0));
    }

    #[test]
    fn calibration_hits_target_mean_on_reference_set() {
        let scores = vec![
            scored("org/a", ScoreCard::new(0.9, 0.4, 0.5, 0.7, 0.8)),
            scored("org/b", ScoreCard::new(0.6, 0.2, 0.9, 0.3, 0.5)),
            scored("org/c", ScoreCard::new(0.1, 0.0, 0.0, 0.0, 0.1)),
        ];
        let calibration =
            calibrate(&scores, &names(&["org/a", "org/b"]), 80.0, 0.4).expect("calibrates");

        assert_eq!(calibration.reference_matched, 2);
        assert!((calibration.reference_mean - 80.0).abs() < 1e-6);
        assert!(approx(calibration.weights.sum(), 1.0));
        assert_eq!(calibration.scores.len(), 3);
        let outsider = &calibration.scores[2];
        assert!(outsider.health_score > 0.0);
        assert!(outsider.health_score < calibration.scores[0].health_score);
        assert_eq!(outsider.scores, scores[2].scores);
    }

    #[test]
    fn dominant_activity_is_capped_exactly() {
        let scores = vec![
            scored("org/a", ScoreCard::new(1.4, 0.1, 0.1, 0.1, 0.1)),
            scored("org/b", ScoreCard::new(1.0, 0.1, 0.1, 0.1, 0.1)),
        ];
        let calibration =
            calibrate(&scores, &names(&["org/a", "org/b"]), 80.0, 0.4).expect("calibrates");

        assert_eq!(calibration.weights.get(Dimension::Activity), 0.4);
        for dimension in &Dimension::ALL[1..] {
            assert!(approx(calibration.weights.get(*dimension), 0.15));
        }
        assert!((calibration.reference_mean - 80.0).abs() < 1e-6);
    }

    #[test]
    fn empty_reference_intersection_is_rejected() {
        let scores = vec![scored("org/a", ScoreCard::new(0.5, 0.5, 0.5, 0.5, 0.5))];
        let err = calibrate(&scores, &names(&["org/z"]), 80.0, 0.4).expect_err("no match");
        assert!(matches!(err, HealthError::EmptyReferenceSet));

        let err = calibrate(&scores, &BTreeSet::new(), 80.0, 0.4).expect_err("empty list");
        assert!(matches!(err, HealthError::EmptyReferenceSet));
    }

    #[test]
    fn all_zero_reference_scores_are_rejected() {
        let scores = vec![
            scored("org/a", ScoreCard::default()),
            scored("org/b", ScoreCard::new(0.5, 0.5, 0.5, 0.5, 0.5)),
        ];
        let err = calibrate(&scores, &names(&["org/a"]), 80.0, 0.4).expect_err("zero mean");
        assert!(matches!(err, HealthError::ZeroReferenceMean));
    }

    #[test]
    fn weights_follow_reference_means() {
        let means = ScoreCard::new(0.2, 0.2, 0.4, 0.1, 0.1);
        let weights = weights_from_means(&means).expect("weights");
        assert!(approx(weights.get(Dimension::Issue), 0.4));
        assert!(approx(weights.sum(), 1.0));
    }

    #[test]
    fn unmatched_names_ignore_duplicate_score_rows() {
        let card = ScoreCard::new(0.5, 0.5, 0.5, 0.5, 0.5);
        let scores = vec![
            scored("org/a", card),
            scored("org/a", card),
            scored("org/b", card),
        ];
        let calibration = calibrate(&scores, &names(&["org/a", "org/z"]), 80.0, 0.4)
            .expect("calibrates");

        assert_eq!(calibration.reference_matched, 2);
        assert_eq!(calibration.reference_unmatched, 1);
    }
}
