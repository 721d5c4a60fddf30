use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("corpus {id} unavailable: {reason}")]
    CorpusUnavailable { id: u32, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corpus is empty after cleaning")]
    EmptyCorpus,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} has not been fitted")]
    NotFitted(&'static str),

    #[error("feature space mismatch: model fitted on {expected:#018x}, matrix built in {found:#018x}")]
    FeatureSpaceMismatch { expected: u64, found: u64 },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid labels: {0}")]
    InvalidLabels(String),
}

pub type Result<T> = std::result::Result<T, Error>;
