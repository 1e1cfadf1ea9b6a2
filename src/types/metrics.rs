use chrono::NaiveDateTime;
/// Finalized per-repository metrics, one row per repository name.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoMetrics {
    pub repo_name: String,
    pub total_events: u64,
    pub active_days: u64,
    pub unique_actors: u64,
    pub first_event: Option<NaiveDateTime>,
    pub last_event: Option<NaiveDateTime>,
    /// Whole days between first and last event, never below 1.
    pub lifetime_days: i64,
    pub issue_count: u64,
    pub issue_closed_count: u64,
    pub pr_count: u64,
    pub pr_merged_count: u64,
    pub pr_merge_rate: f64,
    pub repo_language: Option<String>,
    pub stargazers: i64,
    pub forks: i64,
}
