use crate::error::HealthError;
use crate::types::scoring::{Dimension, Weights};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_PARTITION_DIR: &str = "data/processed/events_clean";
pub const DEFAULT_PARTITION_PREFIX: &str = "events_part_";
pub const DEFAULT_MAX_PARTITIONS: usize = 10;
pub const DEFAULT_METRICS_PATH: &str = "data/processed/repo_metrics.arrow";
pub const DEFAULT_HEALTH_PATH: &str = "data/processed/repo_health.arrow";
pub const DEFAULT_REFERENCE_PATH: &str = "data/analysis/reference_repo_list.arrow";
pub const DEFAULT_CALIBRATED_PATH: &str = "data/analysis/repo_health_calibrated.arrow";
pub const DEFAULT_TARGET_MEAN: f64 = 80.0;
pub const DEFAULT_MAX_ACTIVITY_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthConfig {
    pub input: Option<InputConfig>,
    pub output: Option<OutputConfig>,
    pub weights: Option<HashMap<String, f64>>,
    pub calibration: Option<CalibrationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub partition_dir: Option<PathBuf>,
    pub partition_prefix: Option<String>,
    pub max_partitions: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub metrics: Option<PathBuf>,
    pub health: Option<PathBuf>,
    pub reference: Option<PathBuf>,
    pub calibrated: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    pub target_mean: Option<f64>,
    pub max_activity_weight: Option<f64>,
}

/// Partition discovery settings with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSettings {
    pub partition_dir: PathBuf,
    pub partition_prefix: String,
    pub max_partitions: usize,
}

/// Table locations with defaults applied, resolved against the root.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub metrics: PathBuf,
    pub health: PathBuf,
    pub reference: PathBuf,
    pub calibrated: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSettings {
    pub target_mean: f64,
    pub max_activity_weight: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            target_mean: DEFAULT_TARGET_MEAN,
            max_activity_weight: DEFAULT_MAX_ACTIVITY_WEIGHT,
        }
    }
}

impl HealthConfig {
    pub fn input_settings(&self, root: &Path) -> InputSettings {
        let input = self.input.as_ref();
        InputSettings {
            partition_dir: root.join(
                input
                    .and_then(|input| input.partition_dir.clone())
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_PARTITION_DIR)),
            ),
            partition_prefix: input
                .and_then(|input| input.partition_prefix.clone())
                .unwrap_or_else(|| DEFAULT_PARTITION_PREFIX.to_string()),
            max_partitions: input
                .and_then(|input| input.max_partitions)
                .unwrap_or(DEFAULT_MAX_PARTITIONS),
        }
    }

    pub fn output_paths(&self, root: &Path) -> OutputPaths {
        let output = self.output.as_ref();
        let resolve = |configured: Option<&PathBuf>, default: &str| {
            root.join(
                configured
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from(default)),
            )
        };
        OutputPaths {
            metrics: resolve(
                output.and_then(|output| output.metrics.as_ref()),
                DEFAULT_METRICS_PATH,
            ),
            health: resolve(
                output.and_then(|output| output.health.as_ref()),
                DEFAULT_HEALTH_PATH,
            ),
            reference: resolve(
                output.and_then(|output| output.reference.as_ref()),
                DEFAULT_REFERENCE_PATH,
            ),
            calibrated: resolve(
                output.and_then(|output| output.calibrated.as_ref()),
                DEFAULT_CALIBRATED_PATH,
            ),
        }
    }

    /// Scoring weights; keys missing from `[weights]` keep their default.
    pub fn weights(&self) -> Weights {
        let mut weights = Weights::default();
        if let Some(configured) = &self.weights {
            for dimension in Dimension::ALL {
                if let Some(weight) = configured.get(dimension.key()) {
                    weights.set(dimension, *weight);
                }
            }
        }
        weights
    }

    pub fn calibration_settings(&self) -> CalibrationSettings {
        let defaults = CalibrationSettings::default();
        match &self.calibration {
            Some(calibration) => CalibrationSettings {
                target_mean: calibration.target_mean.unwrap_or(defaults.target_mean),
                max_activity_weight: calibration
                    .max_activity_weight
                    .unwrap_or(defaults.max_activity_weight),
            },
            None => defaults,
        }
    }

    pub fn validate(&self) -> Result<(), HealthError> {
        if let Some(configured) = &self.weights {
            let mut unknown = configured
                .keys()
                .filter(|key| !Dimension::ALL.iter().any(|d| d.key() == key.as_str()))
                .cloned()
                .collect::<Vec<_>>();
            if !unknown.is_empty() {
                unknown.sort();
                return Err(HealthError::ConfigParse(format!(
                    "weights contains unknown key(s): {}",
                    unknown.join(", ")
                )));
            }
        }

        let weights = self.weights();
        if let Some((dimension, _)) = weights
            .iter()
            .find(|(_, weight)| !(0.0..=1.0).contains(weight))
        {
            return Err(HealthError::ConfigParse(format!(
                "weights.{dimension} must be between 0.0 and 1.0"
            )));
        }
        let weight_sum = weights.sum();
        if (weight_sum - 1.0).abs() > 0.001 {
            return Err(HealthError::ConfigParse(format!(
                "weights must sum to 1.0 (found {:.3})",
                weight_sum
            )));
        }

        if let Some(max_partitions) = self.input.as_ref().and_then(|input| input.max_partitions) {
            if max_partitions == 0 {
                return Err(HealthError::ConfigParse(
                    "input.max_partitions must be greater than 0".to_string(),
                ));
            }
        }

        let calibration = self.calibration_settings();
        validate_calibration(&calibration)?;

        Ok(())
    }
}

pub fn validate_calibration(settings: &CalibrationSettings) -> Result<(), HealthError> {
    if !settings.target_mean.is_finite() || settings.target_mean <= 0.0 {
        return Err(HealthError::ConfigParse(
            "calibration.target_mean must be a positive number".to_string(),
        ));
    }
    if !(settings.max_activity_weight > 0.0 && settings.max_activity_weight <= 1.0) {
        return Err(HealthError::ConfigParse(
            "calibration.max_activity_weight must be in (0.0, 1.0]".to_string(),
        ));
    }
    Ok(())
}
