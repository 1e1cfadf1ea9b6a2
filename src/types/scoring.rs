use std::collections::BTreeMap;
use std::fmt;

pub type Score = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Activity,
    Collaboration,
    Issue,
    PullRequest,
    Popularity,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Activity,
        Dimension::Collaboration,
        Dimension::Issue,
        Dimension::PullRequest,
        Dimension::Popularity,
    ];

    /// Key used for this dimension in `[weights]` config tables.
    pub fn key(self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Collaboration => "collaboration",
            Self::Issue => "issue",
            Self::PullRequest => "pr",
            Self::Popularity => "popularity",
        }
    }

    /// Column name of the dimension in persisted score tables.
    pub fn column(self) -> &'static str {
        match self {
            Self::Activity => "activity_score",
            Self::Collaboration => "collab_score",
            Self::Issue => "issue_score",
            Self::PullRequest => "pr_score",
            Self::Popularity => "popularity_score",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Weight per scoring dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights(BTreeMap<Dimension, f64>);

impl Weights {
    /// Builds a vector from values given in `Dimension::ALL` order.
    pub fn new(values: [f64; 5]) -> Self {
        Self(Dimension::ALL.into_iter().zip(values).collect())
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, dimension: Dimension, weight: f64) {
        self.0.insert(dimension, weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        self.0.iter().map(|(dimension, weight)| (*dimension, *weight))
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self(
            self.0
                .iter()
                .map(|(dimension, weight)| (*dimension, weight * factor))
                .collect(),
        )
    }

    /// Weighted sum of the dimension scores, in the unit interval when the
    /// weights sum to one.
    pub fn combine(&self, card: &ScoreCard) -> Score {
        self.iter()
            .map(|(dimension, weight)| weight * card.get(dimension))
            .sum()
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::new([0.25, 0.20, 0.20, 0.20, 0.15])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreCard {
    pub activity: Score,
    pub collaboration: Score,
    pub issue: Score,
    pub pull_request: Score,
    pub popularity: Score,
}

impl ScoreCard {
    pub fn new(
        activity: Score,
        collaboration: Score,
        issue: Score,
        pull_request: Score,
        popularity: Score,
    ) -> Self {
        Self {
            activity,
            collaboration,
            issue,
            pull_request,
            popularity,
        }
    }

    pub fn get(&self, dimension: Dimension) -> Score {
        match dimension {
            Dimension::Activity => self.activity,
            Dimension::Collaboration => self.collaboration,
            Dimension::Issue => self.issue,
            Dimension::PullRequest => self.pull_request,
            Dimension::Popularity => self.popularity,
        }
    }
}

/// One scored repository. `health_score` is on a 0-100 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoScore {
    pub repo_name: String,
    pub repo_language: Option<String>,
    pub scores: ScoreCard,
    pub health_score: Score,
    pub stargazers: i64,
    pub forks: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((Weights::default().sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn combine_applies_each_weight_once() {
        let weights = Weights::default();
        let card = ScoreCard::new(1.0, 0.0, 1.0, 0.0, 1.0);
        assert!((weights.combine(&card) - 0.60).abs() < 1e-12);
    }

    #[test]
    fn dimension_columns_are_unique() {
        let mut columns = Dimension::ALL.map(Dimension::column).to_vec();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), 5);
    }
}
