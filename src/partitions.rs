use crate::error::{HealthError, Result};
use crate::store::events::read_partition;
use crate::types::event::EventBatch;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

pub const PARTITION_EXTENSION: &str = "arrow";

/// The partition files selected for one run. Iterating with
/// [`PartitionSet::batches`] reads lazily and can be restarted.
#[derive(Debug, Clone)]
pub struct PartitionSet {
    paths: Vec<PathBuf>,
}

impl PartitionSet {
    /// Selects up to `max_partitions` files named `<prefix>*.arrow` directly
    /// inside `dir`, in lexicographic file name order.
    pub fn discover(dir: &Path, prefix: &str, max_partitions: usize) -> Result<Self> {
        if !dir.is_dir() {
            return Err(HealthError::NoPartitionsFound(dir.display().to_string()));
        }

        let mut paths = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_partition_file(path, prefix))
            .collect::<Vec<_>>();

        if paths.is_empty() {
            return Err(HealthError::NoPartitionsFound(dir.display().to_string()));
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        let available = paths.len();
        paths.truncate(max_partitions);
        info!(
            "selected {} of {} partition(s) in {}",
            paths.len(),
            available,
            dir.display()
        );
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// One event batch per partition, read only when the iterator reaches it.
    pub fn batches(&self) -> impl Iterator<Item = Result<EventBatch>> + '_ {
        self.paths.iter().map(|path| {
            let batch = read_partition(path)?;
            info!("processing {} ({} events)", display_name(path), batch.len());
            Ok(batch)
        })
    }
}

fn is_partition_file(path: &Path, prefix: &str) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(prefix))
        .unwrap_or(false);
    let has_extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension == PARTITION_EXTENSION)
        .unwrap_or(false);
    has_prefix && has_extension
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
