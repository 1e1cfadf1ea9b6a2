use crate::error::{HealthError, Result};
use crate::types::config::HealthConfig;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "repo-health.toml";
pub const DEFAULT_LOCAL_FILE: &str = ".repo-health/local.toml";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/repo-health/config.toml";

pub fn load_config(root: &Path) -> Result<HealthConfig> {
    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    load_config_with_global(root, global.as_deref())
}

/// Without a `repo-health.toml` in `root` the built-in defaults apply and
/// neither the global nor the local overlay is consulted.
pub(crate) fn load_config_with_global(
    root: &Path,
    global_path: Option<&Path>,
) -> Result<HealthConfig> {
    let repo_path = root.join(DEFAULT_CONFIG_FILE);
    if !repo_path.exists() {
        debug!("no {} in {}, using defaults", DEFAULT_CONFIG_FILE, root.display());
        return Ok(HealthConfig::default());
    }

    let mut merged = Table::new();
    let layers = [
        global_path.map(Path::to_path_buf),
        Some(repo_path),
        Some(root.join(DEFAULT_LOCAL_FILE)),
    ];
    for path in layers.iter().flatten().filter(|path| path.exists()) {
        debug!("merging config layer {}", path.display());
        merge_layer(&mut merged, read_layer(path)?);
    }

    let cfg: HealthConfig = Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| HealthError::ConfigParse(e.to_string()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn read_layer(path: &Path) -> Result<Table> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| HealthError::ConfigParse(format!("{}: {}", path.display(), e)))
}

/// Sections merge key by key; any other value in `layer` replaces the base.
fn merge_layer(base: &mut Table, layer: Table) {
    for (key, value) in layer {
        match value {
            Value::Table(section) if matches!(base.get(&key), Some(Value::Table(_))) => {
                if let Some(Value::Table(existing)) = base.get_mut(&key) {
                    merge_layer(existing, section);
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}
