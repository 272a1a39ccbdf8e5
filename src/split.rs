//! Stratified train/test partitioning.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::TabularDataset;
use crate::error::{Error, Result};
use crate::schema::N_CLASSES;

/// A helper type for holding train/test splits.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: TabularDataset,
    pub test: TabularDataset,
}

/// Splits `data` into train and test sets, drawing `test_ratio` of every
/// class into the test set so both keep the overall class proportions.
///
/// The same `seed` and input always produce the same partition. Rows keep
/// their original relative order inside each subset.
pub fn stratified_split(data: &TabularDataset, test_ratio: f64, seed: u64) -> Result<DatasetSplit> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(Error::InvalidRatio(test_ratio));
    }
    if data.n_rows() == 0 {
        return Err(Error::EmptyDataset);
    }

    let mut by_class: [Vec<usize>; N_CLASSES] = Default::default();
    for (i, &label) in data.labels.iter().enumerate() {
        by_class[label].push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::with_capacity(data.n_rows());
    let mut test_idx = Vec::new();

    for mut rows in by_class {
        rows.shuffle(&mut rng);
        let test_size = ((rows.len() as f64) * test_ratio).round() as usize;
        test_idx.extend_from_slice(&rows[..test_size]);
        train_idx.extend_from_slice(&rows[test_size..]);
    }

    train_idx.sort_unstable();
    test_idx.sort_unstable();

    Ok(DatasetSplit {
        train: data.select(&train_idx),
        test: data.select(&test_idx),
    })
}
