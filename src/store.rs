//! The persisted model: a fitted forest plus the column layout it was fitted on.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::{Array1, ArrayView2};
use rmp_serde::{decode::from_read, encode::write_named};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::forest::RandomForest;

/// Bumped whenever the serialized layout changes.
pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub label_column: String,
    /// Seconds since the UNIX epoch.
    pub trained_at: u64,
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(forest: RandomForest, feature_names: Vec<String>, label_column: &str) -> Self {
        let trained_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        ModelArtifact {
            format_version: FORMAT_VERSION,
            feature_names,
            label_column: label_column.to_string(),
            trained_at,
            forest,
        }
    }

    /// Saves the model to a binary `.msgpack` file, replacing any previous one.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        write_named(&mut writer, self)?;
        writer.flush().map_err(|e| Error::io(path, e))?;
        info!(path = %path.display(), trees = self.forest.n_trees(), "saved model");
        Ok(())
    }

    /// Loads the model from a binary `.msgpack` file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let artifact: ModelArtifact = from_read(BufReader::new(file))?;
        if artifact.format_version != FORMAT_VERSION {
            return Err(Error::UnsupportedFormat {
                found: artifact.format_version,
                expected: FORMAT_VERSION,
            });
        }
        info!(
            path = %path.display(),
            trees = artifact.forest.n_trees(),
            trained_at = artifact.trained_at,
            "loaded model"
        );
        Ok(artifact)
    }

    /// Like [`ModelArtifact::load`], but refuses a model whose training
    /// columns differ from `expected`.
    pub fn load_for_schema<S: AsRef<str>>(path: &Path, expected: &[S]) -> Result<Self> {
        let artifact = Self::load(path)?;
        let matches = artifact.feature_names.len() == expected.len()
            && artifact
                .feature_names
                .iter()
                .zip(expected)
                .all(|(a, e)| a == e.as_ref());
        if !matches {
            return Err(Error::SchemaMismatch {
                expected: expected.iter().map(|s| s.as_ref().to_string()).collect(),
                found: artifact.feature_names,
            });
        }
        Ok(artifact)
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<usize>> {
        self.forest.predict(features)
    }
}
