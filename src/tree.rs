//! CART classification tree grown with weighted Gini impurity.
//!
//! Plugs into linfa through [`Fit`], so a tree is trained from a weighted
//! [`Dataset`] the same way any linfa model is. Every split draws a fresh
//! random subset of the columns. All ties are settled by order: between
//! candidate splits the first one found wins, and in a leaf the smallest
//! label among the heaviest classes wins. So the same seed always grows the
//! same tree.

use linfa::traits::Fit;
use linfa::DatasetBase;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Columns examined at each split.
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Node {
    /// Rows with `x[feature] < threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: u32,
        right: u32,
    },
    Leaf { class: usize },
}

/// A fitted tree. Nodes live in one arena, the root first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut at = 0;
        loop {
            match self.nodes[at] {
                Node::Leaf { class } => return class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let next = if row[feature] < threshold { left } else { right };
                    at = next as usize;
                }
            }
        }
    }

    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Array1<usize> {
        features.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + walk(nodes, left as usize).max(walk(nodes, right as usize))
                }
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Fit<Array2<f64>, Array1<usize>, Error> for TreeParams {
    type Object = DecisionTree;

    fn fit(&self, dataset: &DatasetBase<Array2<f64>, Array1<usize>>) -> Result<DecisionTree> {
        let x = dataset.records();
        let y = dataset.targets();
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 || n_features == 0 {
            return Err(Error::EmptyDataset);
        }
        if y.len() != n_rows {
            return Err(Error::Fit(format!("{} labels for {} rows", y.len(), n_rows)));
        }
        let weights: Vec<f64> = match dataset.weights() {
            Some(w) if w.len() == n_rows => w.iter().map(|&v| f64::from(v)).collect(),
            Some(w) => {
                return Err(Error::Fit(format!("{} weights for {} rows", w.len(), n_rows)));
            }
            None => vec![1.0; n_rows],
        };
        if weights.iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
            return Err(Error::Fit("sample weights must be finite and non-negative".to_string()));
        }

        let mut grower = Grower {
            x: x.view(),
            y: y.view(),
            weights,
            n_classes: y.iter().max().map_or(1, |&m| m + 1),
            max_features: self.max_features.clamp(1, n_features),
            max_depth: self.max_depth,
            rng: StdRng::seed_from_u64(self.seed),
            nodes: Vec::new(),
            sorted: Vec::with_capacity(n_rows),
        };
        let mut rows: Vec<usize> = (0..n_rows).collect();
        grower.grow(&mut rows, 0);

        Ok(DecisionTree {
            nodes: grower.nodes,
        })
    }
}

struct Grower<'a> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, usize>,
    weights: Vec<f64>,
    n_classes: usize,
    max_features: usize,
    max_depth: Option<usize>,
    rng: StdRng,
    nodes: Vec<Node>,
    /// Scratch buffer of `(value, row)` pairs.
    sorted: Vec<(f64, usize)>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Sum over both children of `Σ w_c² / w`; larger is purer.
    score: f64,
}

impl Grower<'_> {
    fn class_weights(&self, rows: &[usize]) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_classes];
        for &r in rows {
            totals[self.y[r]] += self.weights[r];
        }
        totals
    }

    /// Returns the index of the node grown for `rows`.
    fn grow(&mut self, rows: &mut [usize], depth: usize) -> u32 {
        let at = self.nodes.len() as u32;
        let totals = self.class_weights(rows);
        let class = modal_class(&totals);
        self.nodes.push(Node::Leaf { class });

        let pure = totals.iter().filter(|&&w| w > 0.0).count() <= 1;
        let depth_reached = self.max_depth.is_some_and(|d| depth >= d);
        if pure || depth_reached || rows.len() < 2 {
            return at;
        }
        let Some(best) = self.best_split(rows, &totals) else {
            return at;
        };

        let mid = partition(rows, |r| self.x[[r, best.feature]] < best.threshold);
        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[at as usize] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        at
    }

    /// Visits columns in a random order until `max_features` of them could
    /// be split, and keeps the best split seen.
    fn best_split(&mut self, rows: &[usize], totals: &[f64]) -> Option<BestSplit> {
        let n_features = self.x.ncols();
        let order = index::sample(&mut self.rng, n_features, n_features).into_vec();
        let mut best: Option<BestSplit> = None;
        let mut examined = 0;

        for feature in order {
            if examined == self.max_features {
                break;
            }
            if let Some(candidate) = self.best_threshold(rows, feature, totals) {
                examined += 1;
                if best.as_ref().is_none_or(|b| candidate.score > b.score) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Best threshold on one column, or `None` when the column is constant
    /// over `rows`.
    fn best_threshold(&mut self, rows: &[usize], feature: usize, totals: &[f64]) -> Option<BestSplit> {
        self.sorted.clear();
        self.sorted
            .extend(rows.iter().map(|&r| (self.x[[r, feature]], r)));
        self.sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let first = self.sorted.first()?.0;
        let last = self.sorted.last()?.0;
        if first == last {
            return None;
        }

        let total_weight: f64 = totals.iter().sum();
        let mut left = vec![0.0; self.n_classes];
        let mut left_weight = 0.0;
        let mut best: Option<BestSplit> = None;

        for i in 0..self.sorted.len() - 1 {
            let (value, row) = self.sorted[i];
            let w = self.weights[row];
            left[self.y[row]] += w;
            left_weight += w;

            let next = self.sorted[i + 1].0;
            if value == next {
                continue;
            }
            let right_weight = total_weight - left_weight;
            let score = purity(&left, left_weight)
                + purity_of_rest(totals, &left, right_weight);
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(BestSplit {
                    feature,
                    threshold: threshold_between(value, next),
                    score,
                });
            }
        }
        best
    }
}

/// `Σ w_c² / w`, the complement of weighted Gini impurity up to a constant.
fn purity(class_weights: &[f64], weight: f64) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    class_weights.iter().map(|w| w * w).sum::<f64>() / weight
}

fn purity_of_rest(totals: &[f64], left: &[f64], weight: f64) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    totals
        .iter()
        .zip(left)
        .map(|(t, l)| {
            let r = t - l;
            r * r
        })
        .sum::<f64>()
        / weight
}

fn threshold_between(low: f64, high: f64) -> f64 {
    let mid = low + (high - low) / 2.0;
    if mid > low { mid } else { high }
}

/// Heaviest class; the smallest label wins a tie.
fn modal_class(class_weights: &[f64]) -> usize {
    class_weights
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (class, &w)| {
            if w > best.1 { (class, w) } else { best }
        })
        .0
}

/// Moves rows satisfying `pred` to the front and returns how many there are.
/// Keeps the relative order on both sides.
fn partition(rows: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let (mut yes, no): (Vec<usize>, Vec<usize>) = rows.iter().partition(|&&r| pred(r));
    let mid = yes.len();
    yes.extend(no);
    rows.copy_from_slice(&yes);
    mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use linfa::Dataset;
    use ndarray::array;

    fn params(max_features: usize) -> TreeParams {
        TreeParams {
            max_features,
            max_depth: None,
            seed: 7,
        }
    }

    #[test]
    fn learns_a_threshold() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![0, 0, 0, 2, 2, 2];
        let tree = params(1).fit(&Dataset::new(x.clone(), y.clone())).unwrap();

        assert_eq!(tree.predict(x.view()), y);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_row(array![6.0].view()), 0);
        assert_eq!(tree.predict_row(array![7.0].view()), 2);
    }

    #[test]
    fn identical_rows_with_tied_labels_take_the_smallest() {
        let x = array![[1.0, 0.0], [1.0, 0.0], [1.0, 0.0], [1.0, 0.0]];
        let y = array![2, 1, 2, 1];
        let tree = params(2).fit(&Dataset::new(x.clone(), y)).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict_row(x.row(0)), 1);
    }

    #[test]
    fn weights_decide_the_leaf() {
        let x = array![[0.0], [0.0], [0.0]];
        let y = array![0, 0, 1];
        let light = Dataset::new(x.clone(), y.clone());
        assert_eq!(params(1).fit(&light).unwrap().predict_row(x.row(0)), 0);

        let heavy = Dataset::new(x.clone(), y).with_weights(array![1.0, 1.0, 3.0]);
        assert_eq!(params(1).fit(&heavy).unwrap().predict_row(x.row(0)), 1);
    }

    #[test]
    fn depth_limit_is_respected() {
        let x = Array2::from_shape_fn((64, 3), |(i, j)| ((i >> j) & 1) as f64);
        let y = Array1::from_shape_fn(64, |i| i % 3);
        let shallow = TreeParams {
            max_depth: Some(2),
            ..params(3)
        }
        .fit(&Dataset::new(x, y))
        .unwrap();
        assert!(shallow.depth() <= 2);
        assert!(shallow.n_leaves() <= 4);
    }

    #[test]
    fn per_split_sampling_reaches_every_column() {
        // the label only depends on column 3, so a tree restricted to one
        // column per split still has to find it somewhere below the root
        let x = Array2::from_shape_fn((40, 4), |(i, j)| if j == 3 { (i % 2) as f64 } else { (i % 5) as f64 });
        let y = Array1::from_shape_fn(40, |i| i % 2);
        let tree = params(1).fit(&Dataset::new(x.clone(), y.clone())).unwrap();
        assert_eq!(tree.predict(x.view()), y);
    }

    #[test]
    fn same_seed_same_tree_on_duplicate_rows() {
        let x = Array2::from_shape_fn((300, 6), |(i, j)| ((i * 7 + j * 3) % 2) as f64);
        let y = Array1::from_shape_fn(300, |i| i % 3);
        let data = Dataset::new(x.clone(), y);
        let reference = params(2).fit(&data).unwrap();
        for _ in 0..5 {
            let again = params(2).fit(&data).unwrap();
            assert_eq!(again.nodes, reference.nodes);
        }
    }

    #[test]
    fn rejects_empty_input() {
        let x = Array2::<f64>::zeros((0, 3));
        let y = Array1::<usize>::zeros(0);
        assert!(matches!(
            params(1).fit(&Dataset::new(x, y)),
            Err(Error::EmptyDataset)
        ));
    }
}
