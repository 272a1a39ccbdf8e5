//! Held-out classification metrics.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// `matrix[[truth, predicted]]` counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: Array2<usize>,
}

impl ConfusionMatrix {
    /// Labels at or above `n_classes` are ignored.
    pub fn new(truth: &Array1<usize>, predicted: &Array1<usize>, n_classes: usize) -> Self {
        let mut matrix = Array2::zeros((n_classes, n_classes));
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            if t < n_classes && p < n_classes {
                matrix[[t, p]] += 1;
            }
        }
        ConfusionMatrix { matrix }
    }

    pub fn n_classes(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn counts(&self) -> &Array2<usize> {
        &self.matrix
    }

    pub fn total(&self) -> usize {
        self.matrix.sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.matrix.diag().sum() as f64 / total as f64
    }

    /// F1 of each class; 0 where precision and recall are both 0.
    pub fn f1_per_class(&self) -> Vec<f64> {
        (0..self.n_classes())
            .map(|c| {
                let tp = self.matrix[[c, c]] as f64;
                let predicted = self.matrix.column(c).sum() as f64;
                let actual = self.matrix.row(c).sum() as f64;
                if predicted + actual == 0.0 {
                    0.0
                } else {
                    2.0 * tp / (predicted + actual)
                }
            })
            .collect()
    }

    /// Unweighted mean of per-class F1 over the classes that occur in
    /// either the truth or the predictions.
    pub fn f1_macro(&self) -> f64 {
        let f1 = self.f1_per_class();
        let present: Vec<f64> = (0..self.n_classes())
            .filter(|&c| self.matrix.row(c).sum() + self.matrix.column(c).sum() > 0)
            .map(|c| f1[c])
            .collect();
        if present.is_empty() {
            return 0.0;
        }
        present.iter().sum::<f64>() / present.len() as f64
    }
}

/// Summary of one held-out evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub f1_macro: f64,
    pub f1_per_class: Vec<f64>,
    pub accuracy: f64,
    pub support: usize,
    pub confusion: Vec<Vec<usize>>,
}

pub fn evaluate(truth: &Array1<usize>, predicted: &Array1<usize>, n_classes: usize) -> EvaluationReport {
    let cm = ConfusionMatrix::new(truth, predicted, n_classes);
    EvaluationReport {
        f1_macro: cm.f1_macro(),
        f1_per_class: cm.f1_per_class(),
        accuracy: cm.accuracy(),
        support: cm.total(),
        confusion: cm.counts().rows().into_iter().map(|r| r.to_vec()).collect(),
    }
}
