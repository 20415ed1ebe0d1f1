//! Random Forest training with parallel tree construction.

use ndarray::{ArrayView1, ArrayView2};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{OobMode, RandomForestConfig};
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::oob::compute_oob;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::sampler::SeededSampler;
use crate::split::Targets;
use crate::task::Task;
use crate::tree::DecisionTree;
use crate::validate;

/// A fitted Random Forest ensemble.
///
/// Trees are stored in the order they were planned, which is stable for a
/// given `random_state`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) task: Task,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

/// Validated training targets, owned for the duration of one fit.
#[derive(Debug)]
pub(crate) enum EncodedTargets {
    Classes { labels: Vec<usize>, n_classes: usize },
    Values(Vec<f64>),
}

impl EncodedTargets {
    fn encode(task: Task, y: ArrayView1<'_, f64>) -> Result<Self, RfError> {
        match task {
            Task::Classification => {
                let (labels, n_classes) = validate::encode_class_labels(y, 0)?;
                Ok(Self::Classes { labels, n_classes })
            }
            Task::Regression => Ok(Self::Values(validate::regression_targets(y)?)),
        }
    }

    pub(crate) fn as_targets(&self) -> Targets<'_> {
        match self {
            Self::Classes { labels, n_classes } => Targets::Classes {
                labels,
                n_classes: *n_classes,
            },
            Self::Values(values) => Targets::Values(values),
        }
    }

    fn n_classes(&self) -> usize {
        match self {
            Self::Classes { n_classes, .. } => *n_classes,
            Self::Values(_) => 0,
        }
    }
}

/// Draw every tree's bootstrap sample and seed from one forest-level stream.
///
/// Per tree, in increasing tree order: `n_samples` bootstrap indices, then
/// the tree seed.
fn plan_trees(random_state: u64, n_estimators: usize, n_samples: usize) -> Vec<(Vec<usize>, u64)> {
    let mut sampler = SeededSampler::new(random_state);
    (0..n_estimators)
        .map(|_| {
            let bootstrap = sampler.bootstrap(n_samples);
            let seed = sampler.next_seed();
            (bootstrap, seed)
        })
        .collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(task = %task, n_estimators = config.n_estimators, n_samples = x.nrows()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    task: Task,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
) -> Result<RandomForestResult, RfError> {
    // --- Validate inputs ---
    validate::check_training_shape(x, y)?;
    let n_samples = x.nrows();
    let n_features = x.ncols();

    // --- Validate config ---
    let max_features_resolved = config.resolve_max_features(task, n_features)?;
    let base_config = config.tree_config(task, 0, max_features_resolved);
    base_config.validate(n_features)?;

    let targets = EncodedTargets::encode(task, y)?;
    let n_classes = targets.n_classes();
    let tree_config = base_config.with_n_classes(n_classes);

    info!(
        n_estimators = config.n_estimators,
        n_samples,
        n_features,
        n_classes,
        max_features = max_features_resolved,
        "training random forest"
    );

    let plans = plan_trees(config.random_state, config.n_estimators, n_samples);

    // Shared read-only inputs for every tree-building task.
    let columns = validate::to_columns(x);
    let shared_targets = targets.as_targets();

    // Parallel tree training; collect keeps tree order.
    let tree_results: Vec<(DecisionTree, Vec<usize>)> = plans
        .into_par_iter()
        .map(|(bootstrap_indices, seed)| {
            let tree = tree_config.clone().with_seed(seed).grow(
                &columns,
                shared_targets,
                &bootstrap_indices,
                max_features_resolved,
            );
            (tree, bootstrap_indices)
        })
        .collect();

    let mut trees = Vec::with_capacity(config.n_estimators);
    let mut bootstrap_indices_per_tree = Vec::with_capacity(config.n_estimators);
    for (tree, bootstrap) in tree_results {
        trees.push(tree);
        bootstrap_indices_per_tree.push(bootstrap);
    }

    // Aggregate feature importances.
    let per_tree_importances: Vec<Vec<f64>> =
        trees.iter().map(|t| t.feature_importances()).collect();
    let importances = aggregate_importances(&per_tree_importances, n_features);

    debug!(n_trees_trained = trees.len(), "tree training complete");

    // OOB evaluation.
    let oob_score = if config.oob_mode == OobMode::Enabled {
        Some(compute_oob(&trees, x, &targets, &bootstrap_indices_per_tree)?)
    } else {
        None
    };

    let forest = RandomForest {
        trees,
        task,
        n_features,
        n_classes,
    };

    let metadata = TrainingMetadata {
        task,
        n_estimators: config.n_estimators,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved,
        random_state: config.random_state,
    };

    info!(
        oob_score = oob_score.as_ref().map(|s| s.value()),
        "random forest training complete"
    );

    Ok(RandomForestResult::new(
        forest,
        importances,
        oob_score,
        bootstrap_indices_per_tree,
        metadata,
    ))
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2};

    use super::plan_trees;
    use crate::config::{MaxFeatures, OobMode, RandomForestConfig};
    use crate::task::Task;

    /// Generate a simple 3-class separable dataset.
    fn make_separable_data() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (class, offset) in [0.0, 10.0, 20.0].into_iter().enumerate() {
            for i in 0..20 {
                rows.extend([offset + i as f64 * 0.15, 0.5]);
                labels.push(class as f64);
            }
        }
        let x = Array2::from_shape_vec((60, 2), rows).unwrap();
        (x, Array1::from_vec(labels))
    }

    #[test]
    fn three_class_separable_accuracy() {
        let (x, y) = make_separable_data();
        let config = RandomForestConfig::new(50)
            .unwrap()
            .with_max_features(Some(MaxFeatures::All))
            .with_random_state(42);
        let result = config.fit(Task::Classification, x.view(), y.view()).unwrap();

        let predictions = result.forest().predict(x.view()).unwrap();
        let correct = predictions.iter().zip(&y).filter(|&(p, l)| p == l).count();
        let accuracy = correct as f64 / y.len() as f64;
        assert!(accuracy > 0.9, "accuracy = {accuracy}");
    }

    #[test]
    fn oob_score_computed() {
        let (x, y) = make_separable_data();
        let config = RandomForestConfig::new(50)
            .unwrap()
            .with_oob_mode(OobMode::Enabled)
            .with_random_state(42);
        let result = config.fit(Task::Classification, x.view(), y.view()).unwrap();

        let oob = result.oob_score().expect("OOB should be computed");
        let accuracy = oob.accuracy().expect("classification OOB has accuracy");
        assert!(accuracy > 0.8, "oob accuracy = {accuracy}");
        assert!(oob.n_oob_samples() > 0);
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let (x, y) = make_separable_data();
        let config = RandomForestConfig::new(20).unwrap().with_random_state(42);
        let result = config.fit(Task::Classification, x.view(), y.view()).unwrap();

        let total: f64 = result.importances().iter().sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        assert!(result.importances()[0] > result.importances()[1]);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (x, y) = make_separable_data();
        let fit = || {
            RandomForestConfig::new(10)
                .unwrap()
                .with_random_state(99)
                .fit(Task::Classification, x.view(), y.view())
                .unwrap()
        };
        let result1 = fit();
        let result2 = fit();

        assert_eq!(result1.bootstrap_indices(), result2.bootstrap_indices());
        assert_eq!(
            result1.forest().predict(x.view()).unwrap(),
            result2.forest().predict(x.view()).unwrap()
        );
    }

    #[test]
    fn plans_draw_bootstrap_then_seed_per_tree() {
        let plans = plan_trees(7, 3, 5);
        assert_eq!(plans.len(), 3);
        for (bootstrap, _) in &plans {
            assert_eq!(bootstrap.len(), 5);
            assert!(bootstrap.iter().all(|&i| i < 5));
        }
        assert_eq!(plans, plan_trees(7, 3, 5));
        // A longer forest shares its prefix with a shorter one.
        assert_eq!(plans[..2], plan_trees(7, 2, 5)[..]);
    }

    #[test]
    fn metadata_records_resolved_values() {
        let (x, y) = make_separable_data();
        let result = RandomForestConfig::new(3)
            .unwrap()
            .fit(Task::Classification, x.view(), y.view())
            .unwrap();
        let meta = result.metadata();
        assert_eq!(meta.n_estimators, 3);
        assert_eq!(meta.n_samples, 60);
        assert_eq!(meta.n_features, 2);
        assert_eq!(meta.n_classes, 3);
        assert_eq!(meta.max_features_resolved, 1);
        assert_eq!(result.forest().n_trees(), 3);
    }

    #[test]
    fn empty_dataset_error() {
        let config = RandomForestConfig::new(10).unwrap();
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        let err = config.fit(Task::Classification, x.view(), y.view()).unwrap_err();
        assert!(matches!(err, crate::RfError::EmptyDataset));
    }

    #[test]
    fn regression_forest_tracks_signal() {
        let x = Array2::from_shape_fn((50, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| 2.0 * v + 1.0);
        let result = RandomForestConfig::new(20)
            .unwrap()
            .fit(Task::Regression, x.view(), y.view())
            .unwrap();
        let preds = result.forest().predict(x.view()).unwrap();
        let mse = (&preds - &y).mapv(|d| d * d).mean().unwrap();
        assert!(mse < 25.0, "mse = {mse}");
        assert_eq!(result.metadata().n_classes, 0);
    }
}
