//! Load → split → fit → (evaluate) → (track) → save.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::config::TrainConfig;
use crate::dataset::TabularDataset;
use crate::error::Result;
use crate::metrics::{evaluate, EvaluationReport};
use crate::schema::{FEATURE_NAMES, N_CLASSES};
use crate::split::{stratified_split, DatasetSplit};
use crate::store::ModelArtifact;
use crate::tracker::{ExperimentTracker, JsonlTracker, RunRecord};

/// Outcome of one training run.
#[derive(Debug)]
pub struct TrainingReport {
    pub model_path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
    pub evaluation: Option<EvaluationReport>,
    pub artifact: ModelArtifact,
}

impl TrainingReport {
    pub fn f1_macro(&self) -> Option<f64> {
        self.evaluation.as_ref().map(|e| e.f1_macro)
    }
}

pub struct Trainer {
    config: TrainConfig,
    tracker: Option<Box<dyn ExperimentTracker>>,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        let tracker = config
            .track_experiment
            .then(|| Box::new(JsonlTracker::new(&config.tracking_path)) as Box<dyn ExperimentTracker>);
        Trainer { config, tracker }
    }

    /// Replaces the tracker chosen from the configuration.
    pub fn with_tracker(mut self, tracker: Box<dyn ExperimentTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn run(&mut self) -> Result<TrainingReport> {
        let started_at = unix_now();
        let cfg = &self.config;

        let data = TabularDataset::from_csv(&cfg.dataset_path, &cfg.label_column)?;
        if data.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            warn!(
                columns = ?data.feature_names,
                "dataset columns differ from the serving schema; servers will refuse this model"
            );
        }

        let split = stratified_split(&data, cfg.test_ratio, cfg.split_seed)?;
        info!(
            train = split.train.n_rows(),
            test = split.test.n_rows(),
            class_counts = ?split.train.class_counts(),
            "split dataset"
        );

        let artifact = self.fit(&split)?;
        let evaluation = if cfg.evaluate {
            let report = self.evaluate(&artifact, &split)?;
            info!(f1_macro = report.f1_macro, accuracy = report.accuracy, "held-out evaluation");
            Some(report)
        } else {
            None
        };

        if let Some(tracker) = self.tracker.as_mut() {
            let run = RunRecord {
                run_name: format!("forest-{started_at}"),
                started_at,
                dataset: cfg.dataset_path.clone(),
                test_ratio: cfg.test_ratio,
                params: cfg.forest.clone(),
                f1_macro: evaluation.as_ref().map(|e| e.f1_macro),
            };
            tracker.record(&run)?;
            info!(run = %run.run_name, "tracked experiment");
        }

        artifact.save(&cfg.model_path)?;

        Ok(TrainingReport {
            model_path: cfg.model_path.clone(),
            train_rows: split.train.n_rows(),
            test_rows: split.test.n_rows(),
            evaluation,
            artifact,
        })
    }

    fn fit(&self, split: &DatasetSplit) -> Result<ModelArtifact> {
        let forest = self
            .config
            .forest
            .fit(split.train.features.view(), &split.train.labels)?;
        Ok(ModelArtifact::new(
            forest,
            split.train.feature_names.clone(),
            &self.config.label_column,
        ))
    }

    fn evaluate(&self, model: &ModelArtifact, split: &DatasetSplit) -> Result<EvaluationReport> {
        let predicted = model.predict(split.test.features.view())?;
        Ok(evaluate(&split.test.labels, &predicted, N_CLASSES))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
