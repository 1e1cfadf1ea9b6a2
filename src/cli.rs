use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "repo-health",
    version,
    about = "Repository health scoring from partitioned event logs"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Directory holding repo-health.toml; relative paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream event partitions into the per-repository metrics table
    Metrics(MetricsCommand),
    /// Score the metrics table with the configured weights
    Score(ScoreCommand),
    /// Recalibrate weights against a reference set and rescore
    Calibrate(CalibrateCommand),
    /// Run metrics, score and calibrate in sequence
    Run,
    /// Build a reference list from a raw CSV event log
    ExtractReference(ExtractReferenceCommand),
    /// Print the calibrated score distribution
    Summary(SummaryCommand),
}

#[derive(Args)]
pub struct MetricsCommand {
    #[arg(long)]
    pub partitions: Option<PathBuf>,
    #[arg(long)]
    pub max_partitions: Option<usize>,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ScoreCommand {
    #[arg(long)]
    pub metrics: Option<PathBuf>,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct CalibrateCommand {
    #[arg(long)]
    pub health: Option<PathBuf>,
    #[arg(long)]
    pub reference: Option<PathBuf>,
    #[arg(long)]
    pub target_mean: Option<f64>,
    #[arg(long)]
    pub max_activity_weight: Option<f64>,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExtractReferenceCommand {
    pub log: PathBuf,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct SummaryCommand {
    #[arg(long)]
    pub calibrated: Option<PathBuf>,
    #[arg(long)]
    pub reference: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: ReportFormat,
}

#[derive(Clone, ValueEnum)]
pub enum ReportFormat {
    Json,
    Md,
}
