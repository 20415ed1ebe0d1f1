//! Prediction methods for the Random Forest ensemble.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::node::LeafValue;
use crate::task::Task;
use crate::tree::DecisionTree;
use crate::validate;

/// Index of the largest count, lowest index winning ties. `0` when empty.
pub(crate) fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0usize;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

/// Class probability distribution from a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Create a new class distribution.
    pub(crate) fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// Return the class with the highest averaged probability, lowest index
    /// winning ties.
    ///
    /// This is a soft vote and can differ from [`RandomForest::predict`],
    /// which takes the majority of the trees' hard class votes.
    #[must_use]
    pub fn most_probable_class(&self) -> usize {
        let mut best = 0usize;
        for (class, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = class;
            }
        }
        best
    }

    /// Return the top-k classes sorted by descending probability.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        let mut indexed: Vec<(usize, f64)> = self.probs.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        indexed.truncate(k);
        indexed
    }

    /// Return the probability distribution as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Predict every row of `x`.
    ///
    /// Classification returns the majority-vote class index per row (lowest
    /// index on ties); regression returns the mean of the tree predictions.
    /// Rows are predicted in parallel.
    ///
    /// # Errors
    ///
    /// [`RfError::NotFitted`] when the forest has no trees,
    /// [`RfError::PredictionFeatureMismatch`] when `x.ncols() != n_features`.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, RfError> {
        self.check_ready(x.ncols())?;
        let out: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| self.aggregate_row(x.row(i)))
            .collect();
        Ok(Array1::from_vec(out))
    }

    /// Predict a single sample.
    ///
    /// # Errors
    ///
    /// [`RfError::NotFitted`] when the forest has no trees,
    /// [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_row(&self, sample: &[f64]) -> Result<f64, RfError> {
        self.check_ready(sample.len())?;
        Ok(self.aggregate_row(ArrayView1::from(sample)))
    }

    /// Return the averaged class probability distribution for a single sample.
    ///
    /// Averages the leaf distributions from all trees.
    ///
    /// # Errors
    ///
    /// [`RfError::ProbabilityUnavailable`] for a regression forest,
    /// otherwise as [`RandomForest::predict_row`].
    pub fn predict_proba_row(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        self.check_proba_ready(sample.len())?;
        Ok(ClassDistribution::new(self.average_distribution(ArrayView1::from(sample))))
    }

    /// Return probability distributions for every row of `x` in parallel.
    ///
    /// # Errors
    ///
    /// As [`RandomForest::predict_proba_row`].
    pub fn predict_proba_batch(&self, x: ArrayView2<'_, f64>) -> Result<Vec<ClassDistribution>, RfError> {
        self.check_proba_ready(x.ncols())?;
        Ok((0..x.nrows())
            .into_par_iter()
            .map(|i| ClassDistribution::new(self.average_distribution(x.row(i))))
            .collect())
    }

    /// Return an `n_rows × n_classes` matrix of class probabilities.
    ///
    /// Every row sums to 1.0.
    ///
    /// # Errors
    ///
    /// As [`RandomForest::predict_proba_row`].
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, RfError> {
        let rows = self.predict_proba_batch(x)?;
        let mut out = Array2::zeros((rows.len(), self.n_classes));
        for (mut dst, dist) in out.rows_mut().into_iter().zip(&rows) {
            dst.iter_mut().zip(dist.as_slice()).for_each(|(d, &p)| *d = p);
        }
        Ok(out)
    }

    fn check_ready(&self, n_features: usize) -> Result<(), RfError> {
        if self.trees.is_empty() {
            return Err(RfError::NotFitted);
        }
        validate::check_prediction_width(n_features, self.n_features)
    }

    fn check_proba_ready(&self, n_features: usize) -> Result<(), RfError> {
        self.check_ready(n_features)?;
        if self.task != Task::Classification {
            return Err(RfError::ProbabilityUnavailable);
        }
        Ok(())
    }

    /// Vote or average one pre-checked row across all trees.
    fn aggregate_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self.task {
            Task::Classification => {
                let mut votes = vec![0usize; self.n_classes];
                for tree in &self.trees {
                    if let LeafValue::Class { class, .. } = tree.leaf_value(row) {
                        votes[*class] += 1;
                    }
                }
                majority_class(&votes) as f64
            }
            Task::Regression => {
                let sum: f64 = self.trees.iter().map(|t| t.leaf_value(row).as_f64()).sum();
                sum / self.trees.len() as f64
            }
        }
    }

    fn average_distribution(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        let mut avg = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            if let LeafValue::Class { distribution, .. } = tree.leaf_value(row) {
                for (a, p) in avg.iter_mut().zip(distribution) {
                    *a += p;
                }
            }
        }
        let n = self.trees.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);
        avg
    }

    /// Return the trees in the ensemble.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the task this forest was trained for.
    #[must_use]
    pub fn task(&self) -> Task {
        self.task
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes (0 for regression).
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
