//! Loading the tabular training data.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::schema::N_CLASSES;

/// Feature matrix and label vector read from a CSV, rows aligned.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub labels: Array1<usize>,
}

impl TabularDataset {
    /// Reads a headed CSV file and splits off `label_column` as the target.
    pub fn from_csv(path: &Path, label_column: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let dataset = Self::from_reader(file, label_column)?;
        info!(
            path = %path.display(),
            rows = dataset.n_rows(),
            features = dataset.n_features(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R, label_column: &str) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let label_idx = headers
            .iter()
            .position(|h| h.trim() == label_column)
            .ok_or_else(|| Error::MissingLabelColumn(label_column.to_string()))?;

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != label_idx)
            .map(|(_, h)| h.trim().to_string())
            .collect();
        let n_features = feature_names.len();

        let mut values = Vec::new();
        let mut labels = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            for (i, cell) in record.iter().enumerate() {
                let parsed = parse_cell(cell, row, &headers[i])?;
                if i == label_idx {
                    labels.push(to_label(parsed, row)?);
                } else {
                    values.push(parsed);
                }
            }
        }

        debug!(rows = labels.len(), n_features, "parsed csv records");

        let features = Array2::from_shape_vec((labels.len(), n_features), values)?;

        Ok(TabularDataset {
            feature_names,
            features,
            labels: Array1::from_vec(labels),
        })
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> TabularDataset {
        TabularDataset {
            feature_names: self.feature_names.clone(),
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }

    /// Number of rows per class label.
    pub fn class_counts(&self) -> [usize; N_CLASSES] {
        let mut counts = [0; N_CLASSES];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }
}

fn parse_cell(cell: &str, row: usize, column: &str) -> Result<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidValue {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        })
}

fn to_label(value: f64, row: usize) -> Result<usize> {
    if value.fract() == 0.0 && value >= 0.0 && (value as usize) < N_CLASSES {
        Ok(value as usize)
    } else {
        Err(Error::InvalidLabel { row, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Diabetes_012,HighBP,BMI
0.0,1.0,25.0
2.0,0.0,31.5
1.0,1.0,28.0
";

    #[test]
    fn separates_label_from_features() {
        let ds = TabularDataset::from_reader(CSV.as_bytes(), "Diabetes_012").unwrap();
        assert_eq!(ds.feature_names, vec!["HighBP", "BMI"]);
        assert_eq!(ds.labels.to_vec(), vec![0, 2, 1]);
        assert_eq!(ds.features.shape(), &[3, 2]);
        assert_eq!(ds.features[[1, 1]], 31.5);
    }

    #[test]
    fn label_column_may_be_last() {
        let csv = "a,b,Diabetes_012\n1,2,0\n3,4,1\n";
        let ds = TabularDataset::from_reader(csv.as_bytes(), "Diabetes_012").unwrap();
        assert_eq!(ds.feature_names, vec!["a", "b"]);
        assert_eq!(ds.features.row(1).to_vec(), vec![3.0, 4.0]);
    }

    #[test]
    fn missing_label_column() {
        let err = TabularDataset::from_reader(CSV.as_bytes(), "Outcome").unwrap_err();
        assert!(matches!(err, Error::MissingLabelColumn(c) if c == "Outcome"));
    }

    #[test]
    fn non_numeric_cell() {
        let csv = "Diabetes_012,BMI\n0,heavy\n";
        let err = TabularDataset::from_reader(csv.as_bytes(), "Diabetes_012").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { row: 0, .. }));
    }

    #[test]
    fn out_of_range_label() {
        let csv = "Diabetes_012,BMI\n3,20\n";
        let err = TabularDataset::from_reader(csv.as_bytes(), "Diabetes_012").unwrap_err();
        assert!(matches!(err, Error::InvalidLabel { row: 0, .. }));
    }

    #[test]
    fn missing_file() {
        let err = TabularDataset::from_csv(Path::new("/nonexistent/diabetes.csv"), "Diabetes_012")
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn select_and_counts() {
        let ds = TabularDataset::from_reader(CSV.as_bytes(), "Diabetes_012").unwrap();
        assert_eq!(ds.class_counts(), [1, 1, 1]);
        let sub = ds.select(&[2, 0]);
        assert_eq!(sub.labels.to_vec(), vec![1, 0]);
        assert_eq!(sub.features[[0, 1]], 28.0);
    }
}
