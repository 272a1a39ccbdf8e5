//! Bagged ensemble of [`DecisionTree`]s.
//!
//! Each tree sees a bootstrap sample of the rows and draws a fresh random
//! subset of the columns at every split. With [`ClassWeight::Balanced`], every row is weighted inversely to
//! the frequency of its class so the minority classes are not drowned out.
//! Predictions are a majority vote, ties going to the smallest label.

use std::fmt;

use linfa::traits::Fit;
use linfa::Dataset;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    Uniform,
    /// `n_samples / (n_classes * count(class))`
    Balanced,
}

/// How many columns each split gets to consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Count(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub class_weight: ClassWeight,
    pub max_features: MaxFeatures,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_trees: 200,
            class_weight: ClassWeight::Balanced,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            seed: 42,
        }
    }
}

/// A fitted forest.
#[derive(Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl ForestParams {
    /// Fits `n_trees` trees on `features` / `labels`.
    pub fn fit(&self, features: ArrayView2<'_, f64>, labels: &Array1<usize>) -> Result<RandomForest> {
        let (n_rows, n_features) = features.dim();
        if n_rows == 0 || n_features == 0 {
            return Err(Error::EmptyDataset);
        }
        if labels.len() != n_rows {
            return Err(Error::Fit(format!(
                "{} labels for {} rows",
                labels.len(),
                n_rows
            )));
        }
        if self.n_trees == 0 {
            return Err(Error::Fit("forest needs at least one tree".to_string()));
        }

        let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
        let row_weights = self.row_weights(labels, n_classes);
        let k = self.max_features.resolve(n_features);

        // Seeds are drawn up front so the result does not depend on how rayon
        // schedules the trees.
        let mut rng = StdRng::seed_from_u64(self.seed);
        let tree_seeds: Vec<u64> = (0..self.n_trees).map(|_| rng.random()).collect();

        info!(
            n_trees = self.n_trees,
            rows = n_rows,
            features = n_features,
            max_features = k,
            class_weight = ?self.class_weight,
            "fitting forest"
        );

        let trees = tree_seeds
            .into_par_iter()
            .map(|seed| self.fit_tree(seed, features, labels, &row_weights, k))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            trees = trees.len(),
            mean_depth = trees.iter().map(DecisionTree::depth).sum::<usize>() as f64 / trees.len() as f64,
            "forest fitted"
        );

        Ok(RandomForest {
            params: self.clone(),
            n_features,
            n_classes,
            trees,
        })
    }

    fn row_weights(&self, labels: &Array1<usize>, n_classes: usize) -> Array1<f32> {
        match self.class_weight {
            ClassWeight::Uniform => Array1::ones(labels.len()),
            ClassWeight::Balanced => {
                let mut counts = vec![0usize; n_classes];
                for &l in labels {
                    counts[l] += 1;
                }
                let n = labels.len() as f64;
                let class_weight: Vec<f64> = counts
                    .iter()
                    .map(|&c| if c == 0 { 0.0 } else { n / (n_classes as f64 * c as f64) })
                    .collect();
                // scaled so the lightest row weighs 1
                let min = class_weight
                    .iter()
                    .copied()
                    .filter(|w| *w > 0.0)
                    .fold(f64::INFINITY, f64::min);
                labels.mapv(|l| (class_weight[l] / min) as f32)
            }
        }
    }

    fn fit_tree(
        &self,
        seed: u64,
        features: ArrayView2<'_, f64>,
        labels: &Array1<usize>,
        row_weights: &Array1<f32>,
        k: usize,
    ) -> Result<DecisionTree> {
        let mut rng = StdRng::seed_from_u64(seed);
        let n_rows = features.nrows();
        let rows: Vec<usize> = (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect();

        let dataset = Dataset::new(features.select(Axis(0), &rows), labels.select(Axis(0), &rows))
            .with_weights(row_weights.select(Axis(0), &rows));
        TreeParams {
            max_features: k,
            max_depth: self.max_depth,
            seed: rng.random(),
        }
        .fit(&dataset)
    }
}

impl fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForest")
            .field("params", &self.params)
            .field("n_features", &self.n_features)
            .field("n_classes", &self.n_classes)
            .field("n_trees", &self.trees.len())
            .finish_non_exhaustive()
    }
}

impl RandomForest {
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Per-row vote counts, shape `(rows, n_classes)`.
    pub fn votes(&self, features: ArrayView2<'_, f64>) -> Result<Array2<usize>> {
        if features.ncols() != self.n_features {
            return Err(Error::FeatureCount {
                expected: self.n_features,
                actual: features.ncols(),
            });
        }

        let mut votes = Array2::<usize>::zeros((features.nrows(), self.n_classes));
        for tree in &self.trees {
            for (row, features) in features.rows().into_iter().enumerate() {
                votes[[row, tree.predict_row(features)]] += 1;
            }
        }
        Ok(votes)
    }
}

impl Classifier for RandomForest {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<usize>> {
        let votes = self.votes(features)?;
        let labels = votes
            .rows()
            .into_iter()
            .map(|row| {
                // first maximum wins, so ties go to the smallest label
                row.iter()
                    .enumerate()
                    .fold((0, 0), |best, (label, &n)| if n > best.1 { (label, n) } else { best })
                    .0
            })
            .collect();
        Ok(labels)
    }
}
