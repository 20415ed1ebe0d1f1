//! Input validation shared by tree and forest entry points.
//!
//! Every check here runs before any sampling or training, so a failed fit
//! never leaves partial state behind.

use ndarray::{ArrayView1, ArrayView2, ArrayViewD, Ix1, Ix2};

use crate::error::RfError;

/// Narrow a dynamic-dimension feature buffer to a matrix.
pub(crate) fn as_matrix(x: ArrayViewD<'_, f64>) -> Result<ArrayView2<'_, f64>, RfError> {
    let ndim = x.ndim();
    x.into_dimensionality::<Ix2>()
        .map_err(|_| RfError::FeatureDimensionality { ndim })
}

/// Narrow a dynamic-dimension label buffer to a vector.
pub(crate) fn as_vector(y: ArrayViewD<'_, f64>) -> Result<ArrayView1<'_, f64>, RfError> {
    let ndim = y.ndim();
    y.into_dimensionality::<Ix1>()
        .map_err(|_| RfError::TargetDimensionality { ndim })
}

/// Check that the training matrix is non-empty, has columns, is finite,
/// and agrees with the label vector on row count.
pub(crate) fn check_training_shape(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
) -> Result<(), RfError> {
    if x.nrows() != y.len() {
        return Err(RfError::SampleCountMismatch {
            n_samples: x.nrows(),
            n_targets: y.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(RfError::EmptyDataset);
    }
    if x.ncols() == 0 {
        return Err(RfError::ZeroFeatures);
    }
    for (sample_index, row) in x.rows().into_iter().enumerate() {
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(())
}

/// Convert numeric labels into dense class indices.
///
/// Returns the labels and `n_classes = max(label) + 1`. Every label must be
/// a non-negative integer and every class in `[0, n_classes)` must occur.
/// When `expected_classes` is non-zero, labels must also fall below it and
/// the dense-coverage check is skipped (the caller fixed the class count).
/// Otherwise a dense encoding bounds every label by `y.len() - 1`, and larger
/// labels are rejected before any per-class storage is sized.
pub(crate) fn encode_class_labels(
    y: ArrayView1<'_, f64>,
    expected_classes: usize,
) -> Result<(Vec<usize>, usize), RfError> {
    let mut labels = Vec::with_capacity(y.len());
    for (sample_index, &value) in y.iter().enumerate() {
        if !value.is_finite() {
            return Err(RfError::NonFiniteTarget { sample_index });
        }
        if value < 0.0 || value.fract() != 0.0 {
            return Err(RfError::InvalidClassLabel {
                sample_index,
                value,
            });
        }
        let bound = if expected_classes > 0 { expected_classes } else { y.len() };
        if value >= bound as f64 {
            return Err(RfError::InvalidClassLabel {
                sample_index,
                value,
            });
        }
        labels.push(value as usize);
    }

    if expected_classes > 0 {
        return Ok((labels, expected_classes));
    }

    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut seen = vec![false; n_classes];
    for &class in &labels {
        seen[class] = true;
    }
    if let Some(class) = seen.iter().position(|&s| !s) {
        return Err(RfError::MissingClass { class, n_classes });
    }
    Ok((labels, n_classes))
}

/// Copy regression targets, rejecting NaN and infinities.
pub(crate) fn regression_targets(y: ArrayView1<'_, f64>) -> Result<Vec<f64>, RfError> {
    y.iter()
        .enumerate()
        .map(|(sample_index, &v)| {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(RfError::NonFiniteTarget { sample_index })
            }
        })
        .collect()
}

/// Copy a row-major matrix into column-major `columns[feature][sample]`.
pub(crate) fn to_columns(x: ArrayView2<'_, f64>) -> Vec<Vec<f64>> {
    x.columns().into_iter().map(|col| col.to_vec()).collect()
}

/// Check a prediction row width against the trained feature count.
pub(crate) fn check_prediction_width(got: usize, expected: usize) -> Result<(), RfError> {
    if got != expected {
        return Err(RfError::PredictionFeatureMismatch { expected, got });
    }
    Ok(())
}
