//! Out-of-bag (OOB) evaluation for Random Forest.

use ndarray::ArrayView2;

use crate::error::RfError;
use crate::forest::EncodedTargets;
use crate::node::LeafValue;
use crate::predict::majority_class;
use crate::tree::DecisionTree;

/// Out-of-bag evaluation result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum OobScore {
    /// Majority-vote accuracy over samples with at least one OOB tree.
    Classification {
        /// Fraction of correctly predicted OOB samples.
        accuracy: f64,
        /// Number of samples that had at least one OOB tree.
        n_oob_samples: usize,
    },
    /// Mean-prediction error over samples with at least one OOB tree.
    Regression {
        /// Mean squared error of the OOB predictions.
        mse: f64,
        /// Coefficient of determination of the OOB predictions.
        r2: f64,
        /// Number of samples that had at least one OOB tree.
        n_oob_samples: usize,
    },
}

impl OobScore {
    /// Return the headline score: accuracy for classification, R² for regression.
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            OobScore::Classification { accuracy, .. } => *accuracy,
            OobScore::Regression { r2, .. } => *r2,
        }
    }

    /// Return the OOB accuracy, if this is a classification score.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            OobScore::Classification { accuracy, .. } => Some(*accuracy),
            OobScore::Regression { .. } => None,
        }
    }

    /// Return the OOB mean squared error, if this is a regression score.
    #[must_use]
    pub fn mse(&self) -> Option<f64> {
        match self {
            OobScore::Regression { mse, .. } => Some(*mse),
            OobScore::Classification { .. } => None,
        }
    }

    /// Return the OOB R², if this is a regression score.
    #[must_use]
    pub fn r2(&self) -> Option<f64> {
        match self {
            OobScore::Regression { r2, .. } => Some(*r2),
            OobScore::Classification { .. } => None,
        }
    }

    /// Return the number of samples scored.
    #[must_use]
    pub fn n_oob_samples(&self) -> usize {
        match self {
            OobScore::Classification { n_oob_samples, .. }
            | OobScore::Regression { n_oob_samples, .. } => *n_oob_samples,
        }
    }
}

/// Per-sample accumulator for OOB predictions.
enum OobAccumulator {
    Votes(Vec<Vec<usize>>),
    Sums(Vec<f64>),
}

/// Compute out-of-bag predictions and score them.
///
/// For each sample, only trees whose bootstrap did NOT draw it are used for
/// prediction (majority vote or mean). Samples with no OOB trees are skipped.
pub(crate) fn compute_oob(
    trees: &[DecisionTree],
    x: ArrayView2<'_, f64>,
    targets: &EncodedTargets,
    bootstrap_indices_per_tree: &[Vec<usize>],
) -> Result<OobScore, RfError> {
    let n_samples = x.nrows();

    let mut acc = match targets {
        EncodedTargets::Classes { n_classes, .. } => {
            OobAccumulator::Votes(vec![vec![0; *n_classes]; n_samples])
        }
        EncodedTargets::Values(_) => OobAccumulator::Sums(vec![0.0; n_samples]),
    };
    let mut n_oob_trees = vec![0usize; n_samples];

    for (tree, bootstrap) in trees.iter().zip(bootstrap_indices_per_tree) {
        let mut in_bag = vec![false; n_samples];
        for &i in bootstrap {
            in_bag[i] = true;
        }
        for sample_idx in (0..n_samples).filter(|&i| !in_bag[i]) {
            let leaf = tree.leaf_value(x.row(sample_idx));
            match (&mut acc, leaf) {
                (OobAccumulator::Votes(votes), LeafValue::Class { class, .. }) => {
                    votes[sample_idx][*class] += 1;
                }
                (OobAccumulator::Sums(sums), value) => sums[sample_idx] += value.as_f64(),
                (OobAccumulator::Votes(_), LeafValue::Mean(_)) => {
                    return Err(RfError::OobEvaluationFailed {
                        reason: "regression leaf in a classification forest".to_string(),
                    });
                }
            }
            n_oob_trees[sample_idx] += 1;
        }
    }

    let n_oob_samples = n_oob_trees.iter().filter(|&&n| n > 0).count();
    if n_oob_samples == 0 {
        return Err(RfError::OobEvaluationFailed {
            reason: "no sample has any OOB tree".to_string(),
        });
    }

    match (acc, targets) {
        (OobAccumulator::Votes(votes), EncodedTargets::Classes { labels, .. }) => {
            let correct = votes
                .iter()
                .zip(labels)
                .zip(&n_oob_trees)
                .filter(|&((v, &label), &n)| n > 0 && majority_class(v) == label)
                .count();
            Ok(OobScore::Classification {
                accuracy: correct as f64 / n_oob_samples as f64,
                n_oob_samples,
            })
        }
        (OobAccumulator::Sums(sums), EncodedTargets::Values(values)) => {
            let scored: Vec<(f64, f64)> = sums
                .iter()
                .zip(values)
                .zip(&n_oob_trees)
                .filter(|&(_, &n)| n > 0)
                .map(|((&sum, &actual), &n)| (sum / n as f64, actual))
                .collect();
            Ok(regression_score(&scored))
        }
        _ => Err(RfError::OobEvaluationFailed {
            reason: "target kind does not match forest task".to_string(),
        }),
    }
}

/// MSE and R² over `(predicted, actual)` pairs.
fn regression_score(scored: &[(f64, f64)]) -> OobScore {
    let n = scored.len() as f64;
    let mean_actual = scored.iter().map(|&(_, a)| a).sum::<f64>() / n;
    let ss_res: f64 = scored.iter().map(|&(p, a)| (a - p).powi(2)).sum();
    let ss_tot: f64 = scored.iter().map(|&(_, a)| (a - mean_actual).powi(2)).sum();
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };
    OobScore::Regression {
        mse: ss_res / n,
        r2,
        n_oob_samples: scored.len(),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::{OobScore, regression_score};

    #[test]
    fn perfect_regression_has_unit_r2() {
        let score = regression_score(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert_abs_diff_eq!(score.mse().unwrap(), 0.0);
        assert_abs_diff_eq!(score.r2().unwrap(), 1.0);
        assert_eq!(score.n_oob_samples(), 3);
    }

    #[test]
    fn mean_prediction_has_zero_r2() {
        let score = regression_score(&[(2.0, 1.0), (2.0, 2.0), (2.0, 3.0)]);
        assert_abs_diff_eq!(score.mse().unwrap(), 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(score.r2().unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_targets() {
        let exact = regression_score(&[(5.0, 5.0), (5.0, 5.0)]);
        assert_abs_diff_eq!(exact.r2().unwrap(), 1.0);
        let off = regression_score(&[(4.0, 5.0), (6.0, 5.0)]);
        assert_abs_diff_eq!(off.r2().unwrap(), 0.0);
    }

    #[test]
    fn accessors_by_kind() {
        let score = OobScore::Classification {
            accuracy: 0.75,
            n_oob_samples: 8,
        };
        assert_eq!(score.accuracy(), Some(0.75));
        assert_eq!(score.mse(), None);
        assert_eq!(score.value(), 0.75);
    }
}
