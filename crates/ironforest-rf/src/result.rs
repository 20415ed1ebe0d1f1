//! Training result types for Random Forest.

use crate::forest::RandomForest;
use crate::importance::{RankedFeature, rank_features};
use crate::oob::OobScore;
use crate::task::Task;

/// Metadata about the training run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingMetadata {
    /// Classification or regression.
    pub task: Task,
    /// Number of trees trained.
    pub n_estimators: usize,
    /// Number of features in the dataset.
    pub n_features: usize,
    /// Number of classes (0 for regression).
    pub n_classes: usize,
    /// Number of training samples.
    pub n_samples: usize,
    /// Resolved max_features value used.
    pub max_features_resolved: usize,
    /// Forest-level seed.
    pub random_state: u64,
}

/// Result of Random Forest training.
///
/// Contains the fitted forest, feature importances, optional OOB score,
/// per-tree bootstrap indices, and training metadata.
#[derive(Debug, Clone)]
pub struct RandomForestResult {
    forest: RandomForest,
    importances: Vec<f64>,
    oob_score: Option<OobScore>,
    bootstrap_indices_per_tree: Vec<Vec<usize>>,
    metadata: TrainingMetadata,
}

impl RandomForestResult {
    /// Create a new training result.
    pub(crate) fn new(
        forest: RandomForest,
        importances: Vec<f64>,
        oob_score: Option<OobScore>,
        bootstrap_indices_per_tree: Vec<Vec<usize>>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            importances,
            oob_score,
            bootstrap_indices_per_tree,
            metadata,
        }
    }

    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Consume the result and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Return the MDI feature importances in column order (sum to 1.0, or all zeros).
    #[must_use]
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Return the importances paired with `names` and ranked descending.
    #[must_use]
    pub fn ranked_importances(&self, names: &[String]) -> Vec<RankedFeature> {
        rank_features(&self.importances, names)
    }

    /// Return the OOB score, if computed.
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.oob_score.as_ref()
    }

    /// Return training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }

    /// Return the bootstrap draw of every tree, in tree order.
    #[must_use]
    pub fn bootstrap_indices(&self) -> &[Vec<usize>] {
        &self.bootstrap_indices_per_tree
    }

    /// Return the sample indices tree `tree_idx` never drew, ascending.
    ///
    /// Empty when `tree_idx` is out of range.
    #[must_use]
    pub fn oob_indices(&self, tree_idx: usize) -> Vec<usize> {
        let Some(bootstrap) = self.bootstrap_indices_per_tree.get(tree_idx) else {
            return Vec::new();
        };
        let mut in_bag = vec![false; self.metadata.n_samples];
        for &i in bootstrap {
            in_bag[i] = true;
        }
        (0..self.metadata.n_samples).filter(|&i| !in_bag[i]).collect()
    }
}
