//! # diabetes-risk 🩺
//!
//! Predict a diabetes risk category (no diabetes / prediabetes / diabetes) from
//! 21 clinical and lifestyle answers of the CDC Behavioral Risk Factor survey.
//!
//! A bagged forest of Gini decision trees, fitted through
//! [`linfa`](https://crates.io/crates/linfa)'s `Fit` trait, is trained on a stratified split of the survey CSV, scored
//! with macro-F1 on the held-out rows and persisted with `rmp-serde`
//! (MessagePack). The saved model is then served by an `axum` JSON endpoint
//! or an interactive terminal form.
//!
//! ## Features
//! - Stratified, seeded train/test split
//! - Class-balanced random forest, trees fitted in parallel with `rayon`
//! - Macro-F1, accuracy and confusion matrix on the held-out split
//! - Optional run ledger (JSON lines) for comparing training runs
//! - Model artifacts tagged with their feature columns; servers refuse a
//!   model trained on a different layout
//! - `GET /` and `POST /predict` over HTTP, or a question-by-question console
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use diabetes_risk::{Classifier, FeatureVector, ModelArtifact, FEATURE_NAMES};
//!
//! let model = ModelArtifact::load_for_schema(Path::new("models/model.msgpack"), &FEATURE_NAMES)?;
//! let subject = FeatureVector([
//!     0.0, 0.0, 1.0, 25.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0,
//!     1.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 5.0, 4.0, 6.0,
//! ]);
//! let class = model.predict_one(&subject)?;
//! println!("predicted class: {class}");
//! # Ok::<(), diabetes_risk::Error>(())
//! ```

pub mod classifier;
pub mod config;
pub mod console;
pub mod dataset;
pub mod error;
pub mod forest;
pub mod logging;
pub mod metrics;
pub mod schema;
pub mod server;
pub mod split;
pub mod store;
#[doc(hidden)]
pub mod testing;
pub mod tracker;
pub mod trainer;
pub mod tree;

pub use classifier::Classifier;
pub use config::{ServeConfig, TrainConfig};
pub use dataset::TabularDataset;
pub use error::{Error, Result};
pub use forest::{ClassWeight, ForestParams, MaxFeatures, RandomForest};
pub use metrics::{ConfusionMatrix, EvaluationReport};
pub use schema::{FeatureVector, RiskClass, FEATURE_NAMES, LABEL_COLUMN, N_FEATURES};
pub use split::{stratified_split, DatasetSplit};
pub use store::ModelArtifact;
pub use trainer::{Trainer, TrainingReport};
