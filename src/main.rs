mod aggregate;
mod calibrate;
mod cli;
mod config;
mod error;
mod partitions;
mod reference;
mod report;
mod score;
mod store;
mod types;

use crate::error::{HealthError, Result};
use crate::partitions::PartitionSet;
use crate::types::config::{validate_calibration, CalibrationSettings, HealthConfig};
use crate::types::metrics::RepoMetrics;
use crate::types::scoring::RepoScore;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const CONFIG_FAILURE: i32 = 2;
    pub const RUNTIME_FAILURE: i32 = 3;
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve(root: &Path, flag: Option<PathBuf>, configured: PathBuf) -> PathBuf {
    flag.map(|path| root.join(path)).unwrap_or(configured)
}

fn metrics_stage(
    partition_dir: &Path,
    prefix: &str,
    max_partitions: usize,
    out: &Path,
) -> Result<Vec<RepoMetrics>> {
    if max_partitions == 0 {
        return Err(HealthError::ConfigParse(
            "max partitions must be greater than 0".to_string(),
        ));
    }
    let partitions = PartitionSet::discover(partition_dir, prefix, max_partitions)?;
    let metrics = aggregate::aggregate_partitions(&partitions)?;
    store::tables::write_metrics(out, &metrics)?;
    info!("saved metrics for {} repositories to {}", metrics.len(), out.display());
    Ok(metrics)
}

fn score_stage(metrics: &[RepoMetrics], cfg: &HealthConfig, out: &Path) -> Result<Vec<RepoScore>> {
    let scores = match cfg.weights {
        Some(_) => score::compute_with(metrics, &cfg.weights()),
        None => score::compute(metrics),
    };
    store::tables::write_scores(out, &scores)?;
    info!(
        "saved health scores for {} repositories to {}",
        scores.len(),
        out.display()
    );
    Ok(scores)
}

fn calibrate_stage(
    scores: &[RepoScore],
    reference_path: &Path,
    settings: CalibrationSettings,
    out: &Path,
) -> Result<calibrate::Calibration> {
    let reference = store::tables::read_reference(reference_path)?;
    info!(
        "loaded {} reference names from {}",
        reference.len(),
        reference_path.display()
    );
    let calibration = calibrate::calibrate(
        scores,
        &reference,
        settings.target_mean,
        settings.max_activity_weight,
    )?;
    for (dimension, weight) in calibration.weights.scaled(calibration.scale_factor).iter() {
        info!("calibrated weight {:<14}: {:.3}", dimension.key(), weight);
    }
    store::tables::write_scores(out, &calibration.scores)?;
    Ok(calibration)
}

fn print_calibration(calibration: &calibrate::Calibration, out: &Path, quiet: bool) {
    if quiet {
        return;
    }
    println!(
        "calibrated {} repositories against {} reference repositories",
        calibration.scores.len(),
        calibration.reference_matched
    );
    println!("scale factor: {:.4}", calibration.scale_factor);
    println!("reference mean health score: {:.2}", calibration.reference_mean);
    println!("saved: {}", out.display());
}

fn run() -> Result<i32> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    if !cli.root.exists() {
        return Err(HealthError::PathNotFound(cli.root.display().to_string()));
    }

    let root = cli.root.as_path();
    let cfg = config::load_config(root)?;
    let input = cfg.input_settings(root);
    let paths = cfg.output_paths(root);

    match cli.command {
        cli::Commands::Metrics(cmd) => {
            let partition_dir = resolve(root, cmd.partitions, input.partition_dir);
            let out = resolve(root, cmd.out, paths.metrics);
            let metrics = metrics_stage(
                &partition_dir,
                &input.partition_prefix,
                cmd.max_partitions.unwrap_or(input.max_partitions),
                &out,
            )?;
            if !cli.quiet {
                println!(
                    "saved repo metrics: {} repositories -> {}",
                    metrics.len(),
                    out.display()
                );
            }
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Score(cmd) => {
            let metrics_path = resolve(root, cmd.metrics, paths.metrics);
            let out = resolve(root, cmd.out, paths.health);
            let metrics = store::tables::read_metrics(&metrics_path)?;
            let scores = score_stage(&metrics, &cfg, &out)?;
            if !cli.quiet {
                println!(
                    "saved repo health scores: {} repositories -> {}",
                    scores.len(),
                    out.display()
                );
            }
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Calibrate(cmd) => {
            let health_path = resolve(root, cmd.health, paths.health);
            let reference_path = resolve(root, cmd.reference, paths.reference);
            let out = resolve(root, cmd.out, paths.calibrated);
            let defaults = cfg.calibration_settings();
            let settings = CalibrationSettings {
                target_mean: cmd.target_mean.unwrap_or(defaults.target_mean),
                max_activity_weight: cmd
                    .max_activity_weight
                    .unwrap_or(defaults.max_activity_weight),
            };
            validate_calibration(&settings)?;
            let scores = store::tables::read_scores(&health_path)?;
            let calibration = calibrate_stage(&scores, &reference_path, settings, &out)?;
            print_calibration(&calibration, &out, cli.quiet);
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Run => {
            let metrics = metrics_stage(
                &input.partition_dir,
                &input.partition_prefix,
                input.max_partitions,
                &paths.metrics,
            )?;
            let scores = score_stage(&metrics, &cfg, &paths.health)?;
            let calibration = calibrate_stage(
                &scores,
                &paths.reference,
                cfg.calibration_settings(),
                &paths.calibrated,
            )?;
            if !cli.quiet {
                println!(
                    "saved repo metrics: {} repositories -> {}",
                    metrics.len(),
                    paths.metrics.display()
                );
                println!("saved repo health scores -> {}", paths.health.display());
            }
            print_calibration(&calibration, &paths.calibrated, cli.quiet);
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::ExtractReference(cmd) => {
            let log = root.join(&cmd.log);
            let out = resolve(root, cmd.out, paths.reference);
            let names = reference::extract_reference_names(&log)?;
            store::tables::write_reference(&out, &names)?;
            if !cli.quiet {
                println!(
                    "saved reference list: {} repositories -> {}",
                    names.len(),
                    out.display()
                );
            }
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Summary(cmd) => {
            let calibrated_path = resolve(root, cmd.calibrated, paths.calibrated);
            let reference_path = resolve(root, cmd.reference, paths.reference);
            let scores = store::tables::read_scores(&calibrated_path)?;
            let reference = store::tables::read_reference(&reference_path)?;
            let summary = report::summarize(&scores, &reference);
            let output_format = match cmd.format {
                cli::ReportFormat::Json => report::OutputFormat::Json,
                cli::ReportFormat::Md => report::OutputFormat::Md,
            };
            println!("{}", report::render(&summary, output_format)?);
            Ok(exit_code::SUCCESS)
        }
    }
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            let code = match e {
                HealthError::ConfigParse(_) | HealthError::Toml(_) => exit_code::CONFIG_FAILURE,
                _ => exit_code::RUNTIME_FAILURE,
            };
            std::process::exit(code);
        }
    }
}
