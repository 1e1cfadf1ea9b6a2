use crate::error::{HealthError, Result};
use crate::store::missing_column;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::info;

const PROGRESS_EVERY: u64 = 200_000;

/// Collects the distinct repository names of a raw CSV event log.
pub fn extract_reference_names(path: &Path) -> Result<BTreeSet<String>> {
    if !path.exists() {
        return Err(HealthError::PathNotFound(path.display().to_string()));
    }
    let reader = csv::Reader::from_path(path)?;
    collect_names(reader, path)
}

fn collect_names<R: Read>(mut reader: csv::Reader<R>, source: &Path) -> Result<BTreeSet<String>> {
    let column = reader
        .headers()?
        .iter()
        .position(|header| header.trim() == "repo_name")
        .ok_or_else(|| missing_column("repo_name", source))?;

    let mut names = BTreeSet::new();
    let mut rows: u64 = 0;
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record)? {
        rows += 1;
        if let Some(name) = record.get(column).map(str::trim) {
            if !name.is_empty() && !names.contains(name) {
                names.insert(name.to_string());
            }
        }
        if rows % PROGRESS_EVERY == 0 {
            info!("processed rows: {} | unique repos: {}", rows, names.len());
        }
    }
    info!("extracted {} reference repositories from {} rows", names.len(), rows);
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn extract_collects_sorted_distinct_names() {
        let dir = TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("top.csv");
        fs::write(
            &path,
            "type,repo_name,actor_login\n\
             PushEvent,org/b,alice\n\
             IssuesEvent,org/a,bob\n\
             PushEvent,,carol\n\
             PushEvent,org/b,dave\n",
        )
        .expect("csv should write");

        let names = extract_reference_names(&path).expect("extract");
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["org/a".to_string(), "org/b".to_string()]
        );
    }

    #[test]
    fn extract_requires_repo_name_header() {
        let reader = csv::Reader::from_reader("type,actor\nPushEvent,a\n".as_bytes());
        let err = collect_names(reader, Path::new("log.csv")).expect_err("missing header");
        assert!(matches!(err, HealthError::MissingColumn { .. }));
    }

    #[test]
    fn extract_reports_missing_file() {
        let dir = TempDir::new().expect("temp dir should be created");
        let err = extract_reference_names(&dir.path().join("absent.csv")).expect_err("missing");
        assert!(matches!(err, HealthError::PathNotFound(_)));
    }
}
