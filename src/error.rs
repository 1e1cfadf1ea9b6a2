use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("no partition files found in {0}")]
    NoPartitionsFound(String),

    #[error("missing column '{column}' in {source_path}")]
    MissingColumn { column: String, source_path: String },

    #[error("column '{column}' has an unusable type: {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("reference set matched no scored repository")]
    EmptyReferenceSet,

    #[error("reference set mean is zero; weights cannot be calibrated")]
    ZeroReferenceMean,

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, HealthError>;
