//! Column layout shared by the trainer and both front-ends.
//!
//! The model itself carries no notion of column meaning, so every consumer
//! must assemble features in exactly the order of [`FEATURE_NAMES`].

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the label column in the training CSV.
pub const LABEL_COLUMN: &str = "Diabetes_012";

/// Number of features the model consumes.
pub const N_FEATURES: usize = 21;

/// Feature columns, in the order the model expects them.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "HighBP",
    "HighChol",
    "CholCheck",
    "BMI",
    "Smoker",
    "Stroke",
    "HeartDiseaseorAttack",
    "PhysActivity",
    "Fruits",
    "Veggies",
    "HvyAlcoholConsump",
    "AnyHealthcare",
    "NoDocbcCost",
    "GenHlth",
    "MentHlth",
    "PhysHlth",
    "DiffWalk",
    "Sex",
    "Age",
    "Education",
    "Income",
];

/// Number of risk classes.
pub const N_CLASSES: usize = 3;

/// Canonical feature names as owned strings, for comparing against an artifact.
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Diabetes risk category predicted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskClass {
    NoDiabetes = 0,
    Prediabetes = 1,
    Diabetes = 2,
}

impl RiskClass {
    pub const ALL: [RiskClass; N_CLASSES] = [
        RiskClass::NoDiabetes,
        RiskClass::Prediabetes,
        RiskClass::Diabetes,
    ];

    pub fn from_label(label: usize) -> Option<Self> {
        Self::ALL.get(label).copied()
    }

    pub fn label(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskClass::NoDiabetes => "no diabetes",
            RiskClass::Prediabetes => "prediabetes",
            RiskClass::Diabetes => "diabetes",
        };
        f.write_str(s)
    }
}

/// One subject's 21 features in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; N_FEATURES]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Single-row matrix suitable for [`crate::Classifier::predict`].
    pub fn to_row(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, N_FEATURES), |(_, j)| self.0[j])
    }
}

impl TryFrom<&[f64]> for FeatureVector {
    type Error = Error;

    fn try_from(values: &[f64]) -> Result<Self> {
        let array: [f64; N_FEATURES] = values.try_into().map_err(|_| Error::FeatureCount {
            expected: N_FEATURES,
            actual: values.len(),
        })?;
        Ok(FeatureVector(array))
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        FeatureVector::try_from(values.as_slice())
    }
}
