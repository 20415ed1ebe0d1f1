//! Configuration builder for Random Forest training.

use ndarray::{ArrayView1, ArrayView2};

use crate::error::RfError;
use crate::result::RandomForestResult;
use crate::split::SplitCriterion;
use crate::task::Task;
use crate::tree::DecisionTreeConfig;

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MaxFeatures {
    /// Square root of total features, rounded down (minimum 1).
    Sqrt,
    /// Log base 2 of total features, rounded down (minimum 1).
    Log2,
    /// A fraction of total features, rounded down (minimum 1). Must be in (0.0, 1.0].
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

impl MaxFeatures {
    /// Resolve this strategy to a concrete count for `n_features` columns.
    ///
    /// # Errors
    ///
    /// [`RfError::InvalidFeatureFraction`] when a fraction is outside (0.0, 1.0],
    /// [`RfError::InvalidMaxFeatures`] when the count is outside `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let n = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => (n.sqrt().floor() as usize).max(1),
            MaxFeatures::Log2 => (n.log2().floor().max(0.0) as usize).max(1),
            MaxFeatures::Fraction(f) => {
                if !(f > 0.0 && f <= 1.0) {
                    return Err(RfError::InvalidFeatureFraction { fraction: f });
                }
                ((n * f).floor() as usize).max(1)
            }
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }

    /// Strategy used when `max_features` is left unset.
    #[must_use]
    pub fn default_for(task: Task) -> Self {
        match task {
            Task::Classification => MaxFeatures::Sqrt,
            Task::Regression => MaxFeatures::All,
        }
    }
}

/// Whether to compute out-of-bag evaluation during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OobMode {
    /// Score every sample with the trees that did not see it.
    Enabled,
    /// Skip OOB evaluation.
    Disabled,
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default                                    |
/// |----------------------|--------------------------------------------|
/// | `n_estimators`       | 100 (via [`Default`])                      |
/// | `max_features`       | unset: `Sqrt` (classification), `All` (regression) |
/// | `max_depth`          | `None`                                     |
/// | `min_samples_split`  | 2                                          |
/// | `min_samples_leaf`   | 1                                          |
/// | `criterion`          | `Gini` (regression always uses `Mse`)      |
/// | `random_state`       | 42                                         |
/// | `oob_mode`           | `Disabled`                                 |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomForestConfig {
    pub(crate) n_estimators: usize,
    pub(crate) max_features: Option<MaxFeatures>,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) random_state: u64,
    pub(crate) oob_mode: OobMode,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self::with_estimators(100)
    }
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidEstimatorCount`] if `n_estimators` is zero.
    pub fn new(n_estimators: usize) -> Result<Self, RfError> {
        if n_estimators == 0 {
            return Err(RfError::InvalidEstimatorCount { n_estimators });
        }
        Ok(Self::with_estimators(n_estimators))
    }

    fn with_estimators(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_features: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            random_state: 42,
            oob_mode: OobMode::Disabled,
        }
    }

    // --- Setters ---

    /// Set the max features strategy. `None` restores the per-task default.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<MaxFeatures>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the split quality criterion (classification only).
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Set the OOB evaluation mode.
    #[must_use]
    pub fn with_oob_mode(mut self, oob_mode: OobMode) -> Self {
        self.oob_mode = oob_mode;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Return the max features strategy, if set.
    #[must_use]
    pub fn max_features(&self) -> Option<MaxFeatures> {
        self.max_features
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum samples required in each leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the random seed.
    #[must_use]
    pub fn random_state(&self) -> u64 {
        self.random_state
    }

    /// Return the OOB evaluation mode.
    #[must_use]
    pub fn oob_mode(&self) -> OobMode {
        self.oob_mode
    }

    /// Resolve `max_features` for a dataset of `n_features` columns.
    pub(crate) fn resolve_max_features(&self, task: Task, n_features: usize) -> Result<usize, RfError> {
        self.max_features
            .unwrap_or_else(|| MaxFeatures::default_for(task))
            .resolve(n_features)
    }

    /// Build the shared per-tree configuration; each tree gets its own seed later.
    pub(crate) fn tree_config(&self, task: Task, n_classes: usize, max_features: usize) -> DecisionTreeConfig {
        let criterion = match task {
            Task::Classification => self.criterion,
            Task::Regression => SplitCriterion::Mse,
        };
        DecisionTreeConfig::new(task)
            .with_n_classes(n_classes)
            .with_criterion(criterion)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(Some(max_features))
            .with_seed(self.random_state)
    }

    /// Train a Random Forest for `task` on the provided dataset.
    ///
    /// `x` is `n_samples × n_features`; `y` has one entry per row. For
    /// classification, `y` holds class indices `0..n_classes` as numbers.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                              |
    /// |---------------------------------------|---------------------------------------------------|
    /// | [`RfError::SampleCountMismatch`]      | `x` rows and `y` length differ                    |
    /// | [`RfError::EmptyDataset`]             | `x` has no rows                                   |
    /// | [`RfError::ZeroFeatures`]             | `x` has no columns                                |
    /// | [`RfError::NonFiniteValue`]           | any feature value is NaN or infinite              |
    /// | [`RfError::InvalidMaxFeatures`]       | resolved max_features is outside [1, n_features]  |
    /// | [`RfError::InvalidFeatureFraction`]   | a `Fraction` strategy is outside (0.0, 1.0]       |
    /// | [`RfError::InvalidMaxDepth`]          | `max_depth` is `Some(0)`                          |
    /// | [`RfError::InvalidMinSamplesSplit`]   | `min_samples_split` < 2                           |
    /// | [`RfError::InvalidMinSamplesLeaf`]    | `min_samples_leaf` < 1                            |
    /// | [`RfError::InvalidCriterion`]         | `Mse` requested for classification                |
    /// | [`RfError::NonFiniteTarget`]          | any label is NaN or infinite                      |
    /// | [`RfError::InvalidClassLabel`]        | a label is negative, fractional, or ≥ n_samples   |
    /// | [`RfError::MissingClass`]             | class labels are not dense from 0                 |
    /// | [`RfError::OobEvaluationFailed`]      | OOB enabled but no sample has any OOB tree        |
    pub fn fit(
        &self,
        task: Task,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<RandomForestResult, RfError> {
        crate::forest::train(self, task, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RandomForestConfig::default();
        assert_eq!(config.n_estimators(), 100);
        assert_eq!(config.max_features(), None);
        assert_eq!(config.max_depth(), None);
        assert_eq!(config.min_samples_split(), 2);
        assert_eq!(config.min_samples_leaf(), 1);
        assert_eq!(config.criterion(), SplitCriterion::Gini);
        assert_eq!(config.random_state(), 42);
        assert_eq!(config.oob_mode(), OobMode::Disabled);
    }

    #[test]
    fn zero_estimators_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(RfError::InvalidEstimatorCount { n_estimators: 0 })
        ));
    }

    #[test]
    fn sqrt_rounds_down_with_minimum_one() {
        assert_eq!(MaxFeatures::Sqrt.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(3).unwrap(), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(8).unwrap(), 2);
        assert_eq!(MaxFeatures::Sqrt.resolve(9).unwrap(), 3);
    }

    #[test]
    fn log2_and_fraction() {
        assert_eq!(MaxFeatures::Log2.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Log2.resolve(10).unwrap(), 3);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(5).unwrap(), 2);
        assert_eq!(MaxFeatures::Fraction(0.01).resolve(5).unwrap(), 1);
        assert_eq!(MaxFeatures::All.resolve(7).unwrap(), 7);
    }

    #[test]
    fn invalid_fraction_rejected() {
        assert!(matches!(
            MaxFeatures::Fraction(0.0).resolve(5),
            Err(RfError::InvalidFeatureFraction { .. })
        ));
        assert!(matches!(
            MaxFeatures::Fraction(1.5).resolve(5),
            Err(RfError::InvalidFeatureFraction { .. })
        ));
    }

    #[test]
    fn fixed_out_of_range_rejected() {
        assert!(matches!(
            MaxFeatures::Fixed(0).resolve(4),
            Err(RfError::InvalidMaxFeatures { max_features: 0, n_features: 4 })
        ));
        assert!(matches!(
            MaxFeatures::Fixed(5).resolve(4),
            Err(RfError::InvalidMaxFeatures { max_features: 5, n_features: 4 })
        ));
    }

    #[test]
    fn unset_max_features_depends_on_task() {
        let config = RandomForestConfig::default();
        assert_eq!(config.resolve_max_features(Task::Classification, 16).unwrap(), 4);
        assert_eq!(config.resolve_max_features(Task::Regression, 16).unwrap(), 16);
    }

    #[test]
    fn regression_tree_config_forces_mse() {
        let config = RandomForestConfig::default().with_criterion(SplitCriterion::Entropy);
        let tree = config.tree_config(Task::Regression, 0, 3);
        assert_eq!(tree.criterion(), SplitCriterion::Mse);
        let tree = config.tree_config(Task::Classification, 2, 3);
        assert_eq!(tree.criterion(), SplitCriterion::Entropy);
        assert_eq!(tree.max_features(), Some(3));
    }
}
