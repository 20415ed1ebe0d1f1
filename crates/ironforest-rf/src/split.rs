use crate::node::{FeatureIndex, Impurity};

/// Relative margin a split must beat the parent impurity by to count as an improvement.
const GAIN_TOLERANCE: f64 = 1e-12;

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy in bits: -Σ(p_i · log2(p_i))
    Entropy,
    /// Mean squared error: variance of the targets around the node mean.
    Mse,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// Returns [`Impurity::new(0.0)`] when `n_samples` is zero (pure node).
    ///
    /// For `Gini`: `1 - Σ(p_i²)` where `p_i = count_i / n_samples`.
    /// For `Entropy`: `-Σ(p_i · log2(p_i))` summed only over classes where `p_i > 0`.
    /// `Mse` has no class-count form and returns zero. Regression nodes are
    /// scored from their target values instead, and classifiers configured
    /// with `Mse` are rejected before training.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            SplitCriterion::Gini => {
                let sum_sq: f64 = class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
            SplitCriterion::Entropy => {
                -class_counts
                    .iter()
                    .filter(|&&c| c > 0)
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p.log2()
                    })
                    .sum::<f64>()
            }
            SplitCriterion::Mse => 0.0,
        };
        Impurity::new(value)
    }

    /// Return `true` for the criteria that score class labels.
    #[must_use]
    pub fn is_classification(self) -> bool {
        matches!(self, SplitCriterion::Gini | SplitCriterion::Entropy)
    }
}

/// Population variance from running sums.
pub(crate) fn variance(sum: f64, sum_sq: f64, n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Training targets as seen by the split finder and tree builder.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Targets<'a> {
    /// Dense class indices in `[0, n_classes)`.
    Classes {
        labels: &'a [usize],
        n_classes: usize,
    },
    /// Real-valued regression targets.
    Values(&'a [f64]),
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Threshold value.
    pub(crate) threshold: f64,
    /// Sample-weighted impurity decrease: `n * parent - n_l * left - n_r * right`.
    pub(crate) impurity_decrease: f64,
    /// Sample indices going to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub(crate) right_indices: Vec<usize>,
}

/// Best boundary found so far: `(feature, threshold, reduction)`.
type Candidate = (usize, f64, f64);

/// Find the best split among the candidate features.
///
/// For each candidate feature, sorts the `(value, sample)` pairs, scans
/// left-to-right with incremental statistics, and scores every boundary
/// between consecutive distinct values at their midpoint. The reduction is
/// `parent - (n_l * left + n_r * right) / n`. Only strictly improving
/// splits are kept, and a later candidate must beat the current best
/// strictly, so ties resolve to the lowest feature index and then the
/// lowest threshold.
///
/// Returns `None` when no valid split exists (every candidate is constant
/// on these samples, every boundary would violate `min_samples_leaf`, or no
/// boundary reduces impurity).
///
/// # Column-major layout
///
/// `columns` is column-major: `columns[feature_idx][sample_idx]`.
/// `sample_indices` are indices into these inner Vecs and may repeat.
pub(crate) fn find_best_split(
    columns: &[Vec<f64>],
    targets: Targets<'_>,
    sample_indices: &[usize],
    candidate_features: &[usize],
    criterion: SplitCriterion,
    min_samples_leaf: usize,
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 || candidate_features.is_empty() {
        return None;
    }

    let mut features: Vec<usize> = candidate_features.to_vec();
    features.sort_unstable();

    let mut best: Option<Candidate> = None;

    match targets {
        Targets::Classes { labels, n_classes } => {
            let mut parent_counts = vec![0usize; n_classes];
            for &si in sample_indices {
                parent_counts[labels[si]] += 1;
            }
            let parent_impurity = criterion.impurity(&parent_counts, n_samples).value();
            for &feat_idx in &features {
                let sorted = sorted_by_feature(&columns[feat_idx], sample_indices);
                let mut left_counts = vec![0usize; n_classes];
                let mut right_counts = parent_counts.clone();
                let feature_best = scan_boundaries(&sorted, min_samples_leaf, |si, n_left, n_right| {
                    let class = labels[si];
                    left_counts[class] += 1;
                    right_counts[class] -= 1;
                    let left = criterion.impurity(&left_counts, n_left).value();
                    let right = criterion.impurity(&right_counts, n_right).value();
                    left * n_left as f64 + right * n_right as f64
                });
                if let Some((threshold, weighted)) = feature_best {
                    consider(&mut best, feat_idx, threshold, parent_impurity, weighted, n_samples);
                }
            }
        }
        Targets::Values(values) => {
            // Shift by the node mean to keep the running sums well conditioned.
            let shift =
                sample_indices.iter().map(|&si| values[si]).sum::<f64>() / n_samples as f64;
            let (total, total_sq) = sample_indices.iter().fold((0.0, 0.0), |(s, sq), &si| {
                let v = values[si] - shift;
                (s + v, sq + v * v)
            });
            let parent_impurity = variance(total, total_sq, n_samples);
            for &feat_idx in &features {
                let sorted = sorted_by_feature(&columns[feat_idx], sample_indices);
                let (mut left_sum, mut left_sq) = (0.0, 0.0);
                let feature_best = scan_boundaries(&sorted, min_samples_leaf, |si, n_left, n_right| {
                    let v = values[si] - shift;
                    left_sum += v;
                    left_sq += v * v;
                    let left = variance(left_sum, left_sq, n_left);
                    let right = variance(total - left_sum, total_sq - left_sq, n_right);
                    left * n_left as f64 + right * n_right as f64
                });
                if let Some((threshold, weighted)) = feature_best {
                    consider(&mut best, feat_idx, threshold, parent_impurity, weighted, n_samples);
                }
            }
        }
    }

    let (best_feature, threshold, reduction) = best?;

    let column = &columns[best_feature];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| column[si] <= threshold);

    Some(SplitResult {
        feature: FeatureIndex::new(best_feature),
        threshold,
        impurity_decrease: reduction * n_samples as f64,
        left_indices,
        right_indices,
    })
}

/// Collect `(value, sample_index)` pairs for one feature, sorted by value.
fn sorted_by_feature(column: &[f64], sample_indices: &[usize]) -> Vec<(f64, usize)> {
    let mut sorted: Vec<(f64, usize)> = sample_indices
        .iter()
        .map(|&si| (column[si], si))
        .collect();
    sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
    sorted
}

/// Walk the sorted samples, moving one at a time from right to left.
///
/// `step(sample, n_left, n_right)` is called for every position; it must
/// move `sample` into its left-side statistics and return the
/// sample-weighted child impurity.
/// Only boundaries between distinct values that respect `min_samples_leaf`
/// are scored. Returns the `(threshold, weighted)` pair with the smallest
/// weighted child impurity, first boundary winning ties.
fn scan_boundaries(
    sorted: &[(f64, usize)],
    min_samples_leaf: usize,
    mut step: impl FnMut(usize, usize, usize) -> f64,
) -> Option<(f64, f64)> {
    let n_samples = sorted.len();
    let mut best: Option<(f64, f64)> = None;

    for i in 0..(n_samples - 1) {
        let n_left = i + 1;
        let n_right = n_samples - n_left;
        let weighted = step(sorted[i].1, n_left, n_right);

        let val_i = sorted[i].0;
        let val_next = sorted[i + 1].0;
        if val_i == val_next {
            continue;
        }
        if n_left < min_samples_leaf || n_right < min_samples_leaf {
            continue;
        }

        if best.is_none_or(|(_, w)| weighted < w) {
            best = Some((midpoint(val_i, val_next), weighted));
        }
    }

    best
}

/// Midpoint between two distinct sorted values that still separates them.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo / 2.0 + hi / 2.0;
    if mid < hi { mid } else { lo }
}

/// Replace `best` if this boundary strictly improves on it.
fn consider(
    best: &mut Option<Candidate>,
    feature: usize,
    threshold: f64,
    parent_impurity: f64,
    weighted_children: f64,
    n_samples: usize,
) {
    let reduction = parent_impurity - weighted_children / n_samples as f64;
    if reduction <= parent_impurity * GAIN_TOLERANCE {
        return;
    }
    if best.is_none_or(|(_, _, r)| reduction > r) {
        *best = Some((feature, threshold, reduction));
    }
}
