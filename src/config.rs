//! Run-time settings for training and serving.

use std::path::PathBuf;

use crate::forest::ForestParams;
use crate::schema::LABEL_COLUMN;

pub const DEFAULT_DATASET_PATH: &str = "data/raw/diabetes.csv";
pub const DEFAULT_MODEL_PATH: &str = "models/model.msgpack";
pub const DEFAULT_TRACKING_PATH: &str = "mlruns/runs.jsonl";

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub label_column: String,
    pub test_ratio: f64,
    pub split_seed: u64,
    pub forest: ForestParams,
    /// Score the held-out split and report macro-F1.
    pub evaluate: bool,
    /// Append the run to the ledger at `tracking_path`.
    pub track_experiment: bool,
    pub tracking_path: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            label_column: LABEL_COLUMN.to_string(),
            test_ratio: 0.2,
            split_seed: 42,
            forest: ForestParams::default(),
            evaluate: true,
            track_experiment: false,
            tracking_path: PathBuf::from(DEFAULT_TRACKING_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl ServeConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
