//! Error type shared by the training and serving halves of the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between reading a CSV and answering a prediction.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("label column {0:?} not found in dataset header")]
    MissingLabelColumn(String),

    #[error("row {row}, column {column:?}: {value:?} is not a number")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: label {value} is not one of 0, 1, 2")]
    InvalidLabel { row: usize, value: f64 },

    #[error("test ratio must be in (0, 1), got {0}")]
    InvalidRatio(f64),

    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("feature matrix shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("model fitting failed: {0}")]
    Fit(String),

    #[error(transparent)]
    Linfa(#[from] linfa::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("prediction service failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to encode model: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode model: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model artifact format {found} is not supported (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    #[error("model was trained on features {found:?}, expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
