//! Deterministic synthetic cohorts for tests and benches.
//!
//! The generated rows follow the column layout of the real survey data and
//! the label is a noisy threshold on a risk score, so a forest can learn it.

use std::io::Write;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::TabularDataset;
use crate::schema::{feature_names, LABEL_COLUMN, N_FEATURES};

/// `n` rows of plausible feature values with labels in `{0, 1, 2}`.
pub fn synthetic_cohort(n: usize, seed: u64) -> TabularDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Array2::<f64>::zeros((n, N_FEATURES));
    let mut labels = Vec::with_capacity(n);

    for i in 0..n {
        let mut row = features.row_mut(i);
        for j in 0..N_FEATURES {
            row[j] = match j {
                3 => rng.random_range(15.0..45.0_f64).round(),
                13 => rng.random_range(1..=5) as f64,
                14 | 15 => rng.random_range(0..=30) as f64,
                18 => rng.random_range(1..=13) as f64,
                19 => rng.random_range(1..=6) as f64,
                20 => rng.random_range(1..=8) as f64,
                _ => rng.random_range(0..=1) as f64,
            };
        }

        let score = 0.15 * (row[3] - 25.0)
            + 0.8 * (row[13] - 1.0)
            + 0.7 * row[0]
            + 0.5 * row[1]
            + 0.15 * row[18]
            + rng.random_range(-0.5..0.5);
        let label = if score > 5.5 {
            2
        } else if score > 4.5 {
            1
        } else {
            0
        };
        labels.push(label);
    }

    TabularDataset {
        feature_names: feature_names(),
        features,
        labels: Array1::from_vec(labels),
    }
}

/// `n` rows of yes/no answers with labels cycling through `0, 1, 2`.
///
/// Only six answers are drawn; the remaining columns repeat them. So there
/// are just 64 distinct rows, many candidate splits score the same and most
/// leaves hold identical rows with different labels.
pub fn binary_cohort(n: usize, seed: u64) -> TabularDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Array2::<f64>::zeros((n, N_FEATURES));
    for mut row in features.rows_mut() {
        let answers: [f64; 6] = std::array::from_fn(|_| rng.random_range(0..=1) as f64);
        for (j, value) in row.iter_mut().enumerate() {
            *value = answers[j % answers.len()];
        }
    }
    TabularDataset {
        feature_names: feature_names(),
        features,
        labels: Array1::from_shape_fn(n, |i| i % 3),
    }
}

/// Writes `data` as a CSV with the label in the first column, like the
/// published survey extract.
pub fn write_csv<W: Write>(data: &TabularDataset, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![LABEL_COLUMN.to_string()];
    header.extend(data.feature_names.iter().cloned());
    wtr.write_record(&header)?;

    for (row, label) in data.features.rows().into_iter().zip(data.labels.iter()) {
        let mut record = vec![format!("{label:.1}")];
        record.extend(row.iter().map(|v| format!("{v:.1}")));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
