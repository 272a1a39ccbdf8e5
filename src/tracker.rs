//! Recording training runs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::forest::ForestParams;

/// What a tracker remembers about one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_name: String,
    pub started_at: u64,
    pub dataset: PathBuf,
    pub test_ratio: f64,
    pub params: ForestParams,
    pub f1_macro: Option<f64>,
}

pub trait ExperimentTracker {
    fn record(&mut self, run: &RunRecord) -> Result<()>;
}

/// Appends one JSON object per run to a file.
#[derive(Debug, Clone)]
pub struct JsonlTracker {
    path: PathBuf,
}

impl JsonlTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlTracker { path: path.into() }
    }

    /// Every run recorded so far, oldest first.
    pub fn runs(&self) -> Result<Vec<RunRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(Error::from))
            .collect()
    }
}

impl ExperimentTracker for JsonlTracker {
    fn record(&mut self, run: &RunRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let mut line = serde_json::to_string(run)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::io(&self.path, e))?;

        debug!(path = %self.path.display(), run = %run.run_name, "recorded run");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, f1: Option<f64>) -> RunRecord {
        RunRecord {
            run_name: name.to_string(),
            started_at: 1_700_000_000,
            dataset: PathBuf::from("data/raw/diabetes.csv"),
            test_ratio: 0.2,
            params: ForestParams::default(),
            f1_macro: f1,
        }
    }

    #[test]
    fn appends_runs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = JsonlTracker::new(dir.path().join("mlruns/runs.jsonl"));
        assert!(tracker.runs().unwrap().is_empty());

        tracker.record(&run("first", Some(0.41))).unwrap();
        tracker.record(&run("second", None)).unwrap();

        let runs = tracker.runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_name, "first");
        assert_eq!(runs[0].params, ForestParams::default());
        assert!((runs[0].f1_macro.unwrap() - 0.41).abs() < 1e-12);
        assert_eq!(runs[1].f1_macro, None);
        assert_eq!(runs[1].params.n_trees, 200);
    }
}
