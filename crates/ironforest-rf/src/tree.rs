use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewD};
use tracing::{debug, instrument};

use crate::{
    RfError,
    node::{Impurity, LeafValue, Node, NodeIndex},
    predict::majority_class,
    sampler::SeededSampler,
    split::{SplitCriterion, Targets, find_best_split, variance},
    task::Task,
    validate,
};

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
/// A forest builds one of these per tree and never mutates it afterwards.
///
/// # Defaults
///
/// | Parameter           | Default                                   |
/// |---------------------|-------------------------------------------|
/// | `n_classes`         | 0 (derived from labels when classifying)  |
/// | `criterion`         | `Gini` (classification), `Mse` (regression) |
/// | `max_depth`         | `None` (unlimited)                        |
/// | `min_samples_split` | 2                                         |
/// | `min_samples_leaf`  | 1                                         |
/// | `max_features`      | `None` (all features)                     |
/// | `seed`              | 42                                        |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTreeConfig {
    pub(crate) task: Task,
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config for `task` with default values.
    #[must_use]
    pub fn new(task: Task) -> Self {
        let criterion = match task {
            Task::Classification => SplitCriterion::Gini,
            Task::Regression => SplitCriterion::Mse,
        };
        Self {
            task,
            n_classes: 0,
            criterion,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    /// Set the number of classes. Ignored for regression.
    ///
    /// `0` derives the count from the training labels as `max(label) + 1`.
    #[must_use]
    pub fn with_n_classes(mut self, n_classes: usize) -> Self {
        self.n_classes = n_classes;
        self
    }

    /// Set the split quality criterion.
    ///
    /// Regression trees always score splits by variance, whatever is set here.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the maximum tree depth.
    ///
    /// `None` means grow until all leaves are pure or stopping conditions
    /// are met. `Some(d)` limits depth to `d` levels (root is depth 0).
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

    /// Set the maximum number of features to consider at each split.
    ///
    /// `None` means consider all features.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the task.
    #[must_use]
    pub fn task(&self) -> Task {
        self.task
    }

    /// Return the configured number of classes (0 for regression or "derive").
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
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

    /// Return the maximum features to consider per split, if set.
    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Check the hyperparameters and resolve `max_features` for `n_features`.
    pub(crate) fn validate(&self, n_features: usize) -> Result<usize, RfError> {
        if let Some(d) = self.max_depth
            && d == 0
        {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }

        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }

        if self.min_samples_leaf < 1 {
            return Err(RfError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }

        if self.task == Task::Classification && !self.criterion.is_classification() {
            return Err(RfError::InvalidCriterion {
                criterion: self.criterion,
            });
        }

        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }
        Ok(max_features)
    }

    /// Train a decision tree on every row of `x` (no bootstrap).
    ///
    /// Classification labels must be non-negative integers. With
    /// `n_classes == 0` they must cover `[0, max(label)]` densely.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                              |
    /// |--------------------------------------|---------------------------------------------------|
    /// | [`RfError::SampleCountMismatch`]     | `x` rows and `y` length differ                    |
    /// | [`RfError::EmptyDataset`]            | `x` has no rows                                   |
    /// | [`RfError::ZeroFeatures`]            | `x` has no columns                                |
    /// | [`RfError::NonFiniteValue`]          | any feature value is NaN or infinite              |
    /// | [`RfError::NonFiniteTarget`]         | any label is NaN or infinite                      |
    /// | [`RfError::InvalidClassLabel`]       | a label is negative, fractional, or out of range  |
    /// | [`RfError::MissingClass`]            | derived class labels are not dense                |
    /// | [`RfError::InvalidMaxFeatures`]      | `max_features` resolves outside [1, n_features]   |
    /// | [`RfError::InvalidMaxDepth`]         | `max_depth` is `Some(0)`                          |
    /// | [`RfError::InvalidMinSamplesSplit`]  | `min_samples_split` < 2                           |
    /// | [`RfError::InvalidMinSamplesLeaf`]   | `min_samples_leaf` < 1                            |
    /// | [`RfError::InvalidCriterion`]        | `Mse` requested for classification                |
    #[instrument(skip(self, x, y), fields(n_samples = x.nrows(), task = %self.task))]
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<DecisionTree, RfError> {
        validate::check_training_shape(x, y)?;
        let n_features = x.ncols();
        let max_features = self.validate(n_features)?;

        let columns = validate::to_columns(x);
        let sample_indices: Vec<usize> = (0..x.nrows()).collect();

        let tree = match self.task {
            Task::Classification => {
                let (labels, n_classes) = validate::encode_class_labels(y, self.n_classes)?;
                let config = self.clone().with_n_classes(n_classes);
                config.grow(
                    &columns,
                    Targets::Classes { labels: &labels, n_classes },
                    &sample_indices,
                    max_features,
                )
            }
            Task::Regression => {
                let values = validate::regression_targets(y)?;
                self.grow(&columns, Targets::Values(&values), &sample_indices, max_features)
            }
        };
        Ok(tree)
    }

    /// Train on buffers of unchecked dimensionality.
    ///
    /// # Errors
    ///
    /// [`RfError::FeatureDimensionality`] when `x` is not 2-D,
    /// [`RfError::TargetDimensionality`] when `y` is not 1-D, otherwise as
    /// [`DecisionTreeConfig::fit`].
    pub fn fit_dyn(&self, x: ArrayViewD<'_, f64>, y: ArrayViewD<'_, f64>) -> Result<DecisionTree, RfError> {
        let x = validate::as_matrix(x)?;
        let y = validate::as_vector(y)?;
        self.fit(x, y)
    }

    /// Grow a tree over `sample_indices` of pre-validated data.
    ///
    /// `sample_indices` may repeat (bootstrap draws); each occurrence counts
    /// as one training row.
    pub(crate) fn grow(
        &self,
        columns: &[Vec<f64>],
        targets: Targets<'_>,
        sample_indices: &[usize],
        max_features: usize,
    ) -> DecisionTree {
        let mut builder = TreeBuilder {
            config: self,
            columns,
            targets,
            max_features,
            sampler: SeededSampler::new(self.seed),
            arena: Vec::new(),
        };
        let root = builder.build(sample_indices, 0);
        let nodes = builder.arena;

        debug!(
            root_index = root.index(),
            n_nodes = nodes.len(),
            n_samples = sample_indices.len(),
            "decision tree built"
        );

        let n_classes = match targets {
            Targets::Classes { n_classes, .. } => n_classes,
            Targets::Values(_) => 0,
        };

        DecisionTree {
            nodes,
            n_features: columns.len(),
            n_classes,
            config: self.clone(),
        }
    }
}

/// Summary statistics of the samples reaching one node.
struct NodeSummary {
    impurity: Impurity,
    pure: bool,
    value: LeafValue,
}

fn summarize(targets: Targets<'_>, criterion: SplitCriterion, sample_indices: &[usize]) -> NodeSummary {
    let n_samples = sample_indices.len();
    match targets {
        Targets::Classes { labels, n_classes } => {
            let mut counts = vec![0usize; n_classes];
            for &si in sample_indices {
                counts[labels[si]] += 1;
            }
            let total = n_samples.max(1) as f64;
            NodeSummary {
                impurity: criterion.impurity(&counts, n_samples),
                pure: counts.iter().any(|&c| c == n_samples),
                value: LeafValue::Class {
                    class: majority_class(&counts),
                    distribution: counts.iter().map(|&c| c as f64 / total).collect(),
                },
            }
        }
        Targets::Values(values) => {
            let mean = sample_indices.iter().map(|&si| values[si]).sum::<f64>() / n_samples.max(1) as f64;
            let (sum, sum_sq) = sample_indices.iter().fold((0.0, 0.0), |(s, sq), &si| {
                let v = values[si] - mean;
                (s + v, sq + v * v)
            });
            let first = sample_indices.first().map(|&si| values[si]);
            NodeSummary {
                impurity: Impurity::new(variance(sum, sum_sq, n_samples)),
                pure: sample_indices.iter().all(|&si| Some(values[si]) == first),
                value: LeafValue::Mean(mean),
            }
        }
    }
}

/// Recursive arena builder for one tree.
struct TreeBuilder<'a> {
    config: &'a DecisionTreeConfig,
    columns: &'a [Vec<f64>],
    targets: Targets<'a>,
    max_features: usize,
    sampler: SeededSampler,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn criterion(&self) -> SplitCriterion {
        match self.targets {
            Targets::Classes { .. } => self.config.criterion,
            Targets::Values(_) => SplitCriterion::Mse,
        }
    }

    /// Recursively build the subtree for `sample_indices` at `depth`.
    ///
    /// Returns the [`NodeIndex`] of the node just created in the arena.
    fn build(&mut self, sample_indices: &[usize], depth: usize) -> NodeIndex {
        let n_samples = sample_indices.len();
        let criterion = self.criterion();
        let summary = summarize(self.targets, criterion, sample_indices);

        // Stopping conditions → leaf.
        let depth_reached = self.config.max_depth.is_some_and(|max_d| depth >= max_d);
        let too_few = n_samples < self.config.min_samples_split;

        if too_few || summary.pure || depth_reached {
            return self.push_leaf(summary, n_samples);
        }

        // Fresh feature subset for this node from a node-derived stream.
        let mut node_sampler = self.sampler.derive();
        let n_features = self.columns.len();
        let candidates = node_sampler.feature_subset(n_features, self.max_features);

        let Some(split) = find_best_split(
            self.columns,
            self.targets,
            sample_indices,
            &candidates,
            criterion,
            self.config.min_samples_leaf,
        ) else {
            debug!(depth, n_samples, "no improving split, emitting leaf");
            return self.push_leaf(summary, n_samples);
        };

        // Reserve this node's slot, recurse, then overwrite with the split.
        let node_idx = self.arena.len();
        self.arena.push(Node::Leaf {
            value: summary.value,
            impurity: summary.impurity,
            n_samples,
        });

        let left = self.build(&split.left_indices, depth + 1);
        let right = self.build(&split.right_indices, depth + 1);

        self.arena[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity: summary.impurity,
            n_samples,
            impurity_decrease: split.impurity_decrease,
        };

        NodeIndex::new(node_idx)
    }

    fn push_leaf(&mut self, summary: NodeSummary, n_samples: usize) -> NodeIndex {
        let idx = self.arena.len();
        self.arena.push(Node::Leaf {
            value: summary.value,
            impurity: summary.impurity,
            n_samples,
        });
        NodeIndex::new(idx)
    }
}

/// A fitted CART decision tree.
///
/// Stored as an arena-based `Vec<Node>` with index references, root at
/// index 0. Immutable after training.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) config: DecisionTreeConfig,
}

impl DecisionTree {
    /// Predict a single sample.
    ///
    /// Traverses from the root: at each `Split`, goes left when
    /// `sample[feature] <= threshold`, right otherwise. Classification
    /// trees return the class index as `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<f64, RfError> {
        Ok(self.predict_leaf(sample)?.as_f64())
    }

    /// Return the leaf value a sample is routed to.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_leaf(&self, sample: &[f64]) -> Result<&LeafValue, RfError> {
        validate::check_prediction_width(sample.len(), self.n_features)?;
        Ok(self.leaf_value(ArrayView1::from(sample)))
    }

    /// Return the class probability distribution for a single sample.
    ///
    /// The returned slice has length `n_classes`, summing to 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`,
    /// [`RfError::ProbabilityUnavailable`] for regression trees.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], RfError> {
        match self.predict_leaf(sample)? {
            LeafValue::Class { distribution, .. } => Ok(distribution),
            LeafValue::Mean(_) => Err(RfError::ProbabilityUnavailable),
        }
    }

    /// Predict every row of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `x.ncols() != n_features`.
    pub fn predict_batch(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, RfError> {
        validate::check_prediction_width(x.ncols(), self.n_features)?;
        Ok(x.rows().into_iter().map(|row| self.leaf_value(row).as_f64()).collect())
    }

    /// Compute Mean Decrease in Impurity (MDI) feature importances.
    ///
    /// For each `Split` node, the `impurity_decrease` is accumulated by
    /// feature index, then the totals are normalized so they sum to 1.0.
    /// Returns a `Vec` of length `n_features`; all zeros when the tree is
    /// a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the node arena (root at index 0).
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the configuration this tree was built with.
    #[must_use]
    pub fn config(&self) -> &DecisionTreeConfig {
        &self.config
    }

    /// Return the number of features this tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes (0 for regression).
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    /// Uses an iterative BFS approach.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        // BFS: (node_index, current_depth)
        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => {
                    if d > max_depth {
                        max_depth = d;
                    }
                }
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }

    /// Traverse the tree from the root and return the leaf's value.
    ///
    /// `sample` must already have `n_features` entries.
    pub(crate) fn leaf_value(&self, sample: ArrayView1<'_, f64>) -> &LeafValue {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{Array, IxDyn, array};

    use super::*;

    fn separable() -> (ndarray::Array2<f64>, ndarray::Array1<f64>) {
        let x = array![
            [1.0, 0.0],
            [2.0, 0.0],
            [3.0, 0.0],
            [10.0, 0.0],
            [11.0, 0.0],
            [12.0, 0.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn empty_dataset_error() {
        let x = Array::<f64, _>::zeros((0, 2));
        let y = Array::<f64, _>::zeros(0);
        let err = DecisionTreeConfig::new(Task::Classification)
            .fit(x.view(), y.view())
            .unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn pure_dataset_single_leaf() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let y = array![0.0, 0.0, 0.0];
        let tree = DecisionTreeConfig::new(Task::Classification)
            .fit(x.view(), y.view())
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict(&[2.0, 3.0]).unwrap(), 0.0);
    }

    #[test]
    fn linearly_separable_correct_split() {
        let (x, y) = separable();
        let tree = DecisionTreeConfig::new(Task::Classification)
            .with_seed(42)
            .fit(x.view(), y.view())
            .unwrap();
        assert_eq!(tree.predict(&[2.0, 0.0]).unwrap(), 0.0);
        assert_eq!(tree.predict(&[11.0, 0.0]).unwrap(), 1.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn xor_needs_depth_at_least_2() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 1.0, 1.0, 0.0];
        // Root split has zero gain on XOR, so the root stays a leaf.
        let tree = DecisionTreeConfig::new(Task::Classification)
            .fit(x.view(), y.view())
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn two_feature_scenario_reproduces_labels() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let tree = DecisionTreeConfig::new(Task::Classification)
            .with_max_depth(Some(1))
            .with_seed(0)
            .fit(x.view(), y.view())
            .unwrap();
        assert_eq!(tree.predict_batch(x.view()).unwrap(), y);
        match &tree.nodes()[0] {
            Node::Split { feature, threshold, .. } => {
                assert_eq!(feature.index(), 0);
                assert_abs_diff_eq!(*threshold, 0.5);
            }
            Node::Leaf { .. } => panic!("root should split"),
        }
    }

    #[test]
    fn regression_leaves_are_exact_means() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let tree = DecisionTreeConfig::new(Task::Regression)
            .fit(x.view(), y.view())
            .unwrap();
        // Unbounded depth, min_samples_leaf = 1: every row gets its own leaf.
        assert_eq!(tree.predict_batch(x.view()).unwrap(), y);
        assert_eq!(tree.n_leaves(), 4);
    }

    #[test]
    fn regression_depth_one_leaf_means() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];
        let tree = DecisionTreeConfig::new(Task::Regression)
            .with_max_depth(Some(1))
            .fit(x.view(), y.view())
            .unwrap();
        // Feature 0 removes the most variance: {1, 2} vs {3, 4}.
        assert_abs_diff_eq!(tree.predict(&[0.0, 0.0]).unwrap(), 1.5);
        assert_abs_diff_eq!(tree.predict(&[1.0, 1.0]).unwrap(), 3.5);
    }

    #[test]
    fn predict_proba_sums_to_one() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let tree = DecisionTreeConfig::new(Task::Classification)
            .with_max_depth(Some(1))
            .with_min_samples_leaf(3)
            .fit(x.view(), y.view())
            .unwrap();
        let proba = tree.predict_proba(&[5.0]).unwrap();
        let sum: f64 = proba.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10);
    }

    #[test]
    fn predict_proba_unavailable_for_regression() {
        let x = array![[1.0], [2.0]];
        let y = array![0.5, 1.5];
        let tree = DecisionTreeConfig::new(Task::Regression)
            .fit(x.view(), y.view())
            .unwrap();
        assert!(matches!(
            tree.predict_proba(&[1.0]),
            Err(RfError::ProbabilityUnavailable)
        ));
    }

    #[test]
    fn majority_leaf_breaks_ties_to_lowest_class() {
        // Constant feature: no split possible, leaf holds a 2-2 tie.
        let x = array![[1.0], [1.0], [1.0], [1.0]];
        let y = array![1.0, 0.0, 1.0, 0.0];
        let tree = DecisionTreeConfig::new(Task::Classification)
            .fit(x.view(), y.view())
            .unwrap();
        assert_eq!(tree.predict(&[1.0]).unwrap(), 0.0);
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let x = array![
            [1.0, 100.0],
            [2.0, 200.0],
            [3.0, 300.0],
            [10.0, 100.0],
            [11.0, 200.0],
            [12.0, 300.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let tree = DecisionTreeConfig::new(Task::Classification)
            .fit(x.view(), y.view())
            .unwrap();
        let importances = tree.feature_importances();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
        assert_abs_diff_eq!(importances[0], 1.0);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let x = array![
            [1.0, 5.0, 0.3],
            [2.0, 6.0, 0.1],
            [3.0, 7.0, 0.9],
            [10.0, 15.0, 0.4],
            [11.0, 16.0, 0.2],
            [12.0, 17.0, 0.8],
        ];
        let y = array![0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let config = DecisionTreeConfig::new(Task::Classification)
            .with_max_features(Some(1))
            .with_seed(123);
        let tree1 = config.fit(x.view(), y.view()).unwrap();
        let tree2 = config.fit(x.view(), y.view()).unwrap();
        assert_eq!(
            tree1.predict_batch(x.view()).unwrap(),
            tree2.predict_batch(x.view()).unwrap()
        );
        assert_eq!(tree1.n_nodes(), tree2.n_nodes());
    }

    #[test]
    fn prediction_feature_mismatch() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![0.0, 1.0];
        let tree = DecisionTreeConfig::new(Task::Classification)
            .fit(x.view(), y.view())
            .unwrap();
        let err = tree.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            RfError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn max_depth_limits_tree() {
        let x = Array::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y = Array::from_shape_fn(32, |i| (i % 2) as f64);
        let tree = DecisionTreeConfig::new(Task::Classification)
            .with_max_depth(Some(2))
            .fit(x.view(), y.view())
            .unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn min_samples_leaf_respected() {
        let x = Array::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y = Array::from_shape_fn(40, |i| ((i * 7) % 3) as f64);
        let tree = DecisionTreeConfig::new(Task::Classification)
            .with_min_samples_leaf(5)
            .fit(x.view(), y.view())
            .unwrap();
        for node in tree.nodes() {
            if node.is_leaf() {
                assert!(node.n_samples() >= 5);
            }
        }
    }

    #[test]
    fn min_samples_split_stops_growth() {
        let (x, y) = separable();
        let tree = DecisionTreeConfig::new(Task::Classification)
            .with_min_samples_split(7)
            .fit(x.view(), y.view())
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn invalid_config_errors() {
        let (x, y) = separable();
        let base = DecisionTreeConfig::new(Task::Classification);
        assert!(matches!(
            base.clone().with_max_depth(Some(0)).fit(x.view(), y.view()),
            Err(RfError::InvalidMaxDepth { .. })
        ));
        assert!(matches!(
            base.clone().with_min_samples_split(1).fit(x.view(), y.view()),
            Err(RfError::InvalidMinSamplesSplit { .. })
        ));
        assert!(matches!(
            base.clone().with_min_samples_leaf(0).fit(x.view(), y.view()),
            Err(RfError::InvalidMinSamplesLeaf { .. })
        ));
        assert!(matches!(
            base.clone().with_max_features(Some(3)).fit(x.view(), y.view()),
            Err(RfError::InvalidMaxFeatures { max_features: 3, n_features: 2 })
        ));
        assert!(matches!(
            base.with_criterion(SplitCriterion::Mse).fit(x.view(), y.view()),
            Err(RfError::InvalidCriterion { .. })
        ));
    }

    #[test]
    fn non_finite_value_error() {
        let x = array![[1.0, f64::NAN], [3.0, 4.0]];
        let y = array![0.0, 1.0];
        let err = DecisionTreeConfig::new(Task::Classification)
            .fit(x.view(), y.view())
            .unwrap_err();
        assert!(matches!(err, RfError::NonFiniteValue { .. }));
    }

    #[test]
    fn fit_dyn_rejects_wrong_dimensionality() {
        let x = Array::<f64, _>::zeros(IxDyn(&[4]));
        let y = Array::<f64, _>::zeros(IxDyn(&[4]));
        let err = DecisionTreeConfig::new(Task::Regression)
            .fit_dyn(x.view(), y.view())
            .unwrap_err();
        assert!(matches!(err, RfError::FeatureDimensionality { ndim: 1 }));
    }

    #[test]
    fn regression_ignores_configured_criterion() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 5.0, 5.0];
        let tree = DecisionTreeConfig::new(Task::Regression)
            .with_criterion(SplitCriterion::Entropy)
            .fit(x.view(), y.view())
            .unwrap();
        assert_abs_diff_eq!(tree.predict(&[0.5]).unwrap(), 0.0);
        assert_abs_diff_eq!(tree.predict(&[2.5]).unwrap(), 5.0);
    }
}
