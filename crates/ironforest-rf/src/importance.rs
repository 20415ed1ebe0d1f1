//! Feature importance aggregation across trees.

/// A ranked feature with name, importance score, and rank.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance score (sums to 1.0 across all features).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Aggregate per-tree feature importances into one vector.
///
/// Each per-tree vector is already normalized (or all zeros for a
/// single-leaf tree). Sums across trees and normalizes to 1.0; all zeros
/// when no tree ever split.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], n_features: usize) -> Vec<f64> {
    let mut totals = vec![0.0f64; n_features];

    for tree_imp in per_tree {
        for (total, &val) in totals.iter_mut().zip(tree_imp) {
            *total += val;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }
    totals
}

/// Pair importances with feature names and rank them.
///
/// Sorts descending by importance (stable, so equal scores keep column
/// order) and assigns 1-based ranks. Missing names fall back to `x{index}`.
#[must_use]
pub fn rank_features(importances: &[f64], names: &[String]) -> Vec<RankedFeature> {
    let mut features: Vec<RankedFeature> = importances
        .iter()
        .enumerate()
        .map(|(i, &importance)| RankedFeature {
            name: names.get(i).cloned().unwrap_or_else(|| format!("x{i}")),
            importance,
            rank: 0, // will be set after sorting
        })
        .collect();

    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    for (i, feat) in features.iter_mut().enumerate() {
        feat.rank = i + 1;
    }

    features
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::{aggregate_importances, rank_features};

    #[test]
    fn averages_normalized_trees() {
        let per_tree = vec![vec![1.0, 0.0, 0.0], vec![0.5, 0.5, 0.0]];
        let agg = aggregate_importances(&per_tree, 3);
        assert_abs_diff_eq!(agg[0], 0.75);
        assert_abs_diff_eq!(agg[1], 0.25);
        assert_abs_diff_eq!(agg[2], 0.0);
    }

    #[test]
    fn single_leaf_forest_is_all_zero() {
        let per_tree = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        assert_eq!(aggregate_importances(&per_tree, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn ranks_descending_with_stable_ties() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let ranked = rank_features(&[0.2, 0.6, 0.2], &names);
        let order: Vec<(&str, usize)> = ranked.iter().map(|f| (f.name.as_str(), f.rank)).collect();
        assert_eq!(order, vec![("b", 1), ("a", 2), ("c", 3)]);
    }

    #[test]
    fn missing_names_get_positional_fallback() {
        let ranked = rank_features(&[0.1, 0.9], &[]);
        assert_eq!(ranked[0].name, "x1");
        assert_eq!(ranked[1].name, "x0");
    }
}
