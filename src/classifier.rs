use ndarray::{Array1, ArrayView2};

use crate::error::Result;
use crate::schema::FeatureVector;

/// Anything that maps a feature matrix to one class label per row.
///
/// The serving front-ends hold an `Arc<dyn Classifier>` so tests can swap
/// the trained forest for a stub.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<usize>>;

    fn predict_one(&self, features: &FeatureVector) -> Result<usize> {
        let row = features.to_row();
        let labels = self.predict(row.view())?;
        Ok(labels[0])
    }
}
