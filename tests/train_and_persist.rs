use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};

use diabetes_risk::testing::{binary_cohort, synthetic_cohort, write_csv};
use diabetes_risk::tracker::{ExperimentTracker, JsonlTracker, RunRecord};
use diabetes_risk::{
    Classifier, ForestParams, MaxFeatures, ModelArtifact, TrainConfig, Trainer, FEATURE_NAMES,
};

fn write_dataset(dir: &Path, rows: usize) -> std::path::PathBuf {
    let path = dir.join("data/raw/diabetes.csv");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    write_csv(&synthetic_cohort(rows, 2024), File::create(&path).unwrap()).unwrap();
    path
}

/// Keeps recorded runs in memory.
#[derive(Clone, Default)]
struct InMemoryTracker(Arc<Mutex<Vec<RunRecord>>>);

impl ExperimentTracker for InMemoryTracker {
    fn record(&mut self, run: &RunRecord) -> diabetes_risk::Result<()> {
        self.0.lock().unwrap().push(run.clone());
        Ok(())
    }
}

fn config(dir: &Path, dataset: &Path) -> TrainConfig {
    TrainConfig {
        dataset_path: dataset.to_path_buf(),
        model_path: dir.join("models/model.msgpack"),
        tracking_path: dir.join("mlruns/runs.jsonl"),
        forest: ForestParams {
            n_trees: 20,
            max_features: MaxFeatures::Count(10),
            ..ForestParams::default()
        },
        ..TrainConfig::default()
    }
}

#[test]
fn training_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), 1_500);

    let first = Trainer::new(config(dir.path(), &dataset)).run().unwrap();
    let second = Trainer::new(config(dir.path(), &dataset)).run().unwrap();

    let f1 = first.f1_macro().unwrap();
    assert_eq!(Some(f1), second.f1_macro());
    assert!(f1 > 0.4, "macro-F1 unexpectedly low: {f1}");
    assert_eq!(first.train_rows + first.test_rows, 1_500);
    assert!((299..=301).contains(&first.test_rows));
}

#[test]
fn training_on_duplicate_rows_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("binary.csv");
    write_csv(&binary_cohort(1_200, 8), File::create(&dataset).unwrap()).unwrap();
    let subjects = binary_cohort(300, 9);

    let reference = Trainer::new(config(dir.path(), &dataset)).run().unwrap();
    let expected = reference.artifact.predict(subjects.features.view()).unwrap();
    for _ in 0..3 {
        let again = Trainer::new(config(dir.path(), &dataset)).run().unwrap();
        assert_eq!(again.f1_macro(), reference.f1_macro());
        assert_eq!(again.artifact.predict(subjects.features.view()).unwrap(), expected);
    }
}

#[test]
fn saved_model_predicts_like_the_fitted_one() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), 800);
    let report = Trainer::new(config(dir.path(), &dataset)).run().unwrap();

    let loaded = ModelArtifact::load_for_schema(&report.model_path, &FEATURE_NAMES).unwrap();
    let subjects = synthetic_cohort(200, 77);

    assert_eq!(
        report.artifact.predict(subjects.features.view()).unwrap(),
        loaded.predict(subjects.features.view()).unwrap()
    );
    assert_eq!(loaded.feature_names, FEATURE_NAMES);
}

#[test]
fn skipping_evaluation_still_saves() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), 400);
    let cfg = TrainConfig {
        evaluate: false,
        ..config(dir.path(), &dataset)
    };

    let report = Trainer::new(cfg).run().unwrap();
    assert!(report.evaluation.is_none());
    assert!(report.model_path.exists());
}

#[test]
fn tracked_runs_land_in_the_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), 400);
    let cfg = TrainConfig {
        track_experiment: true,
        ..config(dir.path(), &dataset)
    };
    let ledger = JsonlTracker::new(&cfg.tracking_path);

    let report = Trainer::new(cfg).run().unwrap();

    let runs = ledger.runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].params.n_trees, 20);
    assert!((runs[0].f1_macro.unwrap() - report.f1_macro().unwrap()).abs() < 1e-12);
}

#[test]
fn custom_tracker_replaces_the_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_dataset(dir.path(), 400);
    let cfg = config(dir.path(), &dataset);
    let ledger_path = cfg.tracking_path.clone();
    let tracker = InMemoryTracker::default();

    let report = Trainer::new(cfg)
        .with_tracker(Box::new(tracker.clone()))
        .run()
        .unwrap();

    let runs = tracker.0.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].f1_macro, report.f1_macro());
    assert!(runs[0].run_name.starts_with("forest-"));
    assert!(!ledger_path.exists());
}

#[test]
fn missing_dataset_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let err = Trainer::new(config(dir.path(), &missing)).run().unwrap_err();
    assert!(matches!(err, diabetes_risk::Error::Io { .. }));
}
