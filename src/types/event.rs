use chrono::NaiveDateTime;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Issue,
    PullRequest,
    Other,
}

impl EventKind {
    /// Maps a raw GitHub event type tag. Only the issue and pull request
    /// tags are distinguished; everything else counts as `Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "IssuesEvent" => Self::Issue,
            "PullRequestEvent" => Self::PullRequest,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub repo_name: String,
    pub kind: Option<EventKind>,
    pub created_at: Option<NaiveDateTime>,
    pub actor: Option<String>,
    pub issue_closed_at: Option<NaiveDateTime>,
    pub pull_merged_at: Option<NaiveDateTime>,
    pub language: Option<String>,
    pub stargazers: Option<i64>,
    pub forks: Option<i64>,
}

/// All events of one partition file.
#[derive(Debug, Clone)]
pub struct EventBatch {
    pub source: PathBuf,
    pub events: Vec<EventRecord>,
}

impl EventBatch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
