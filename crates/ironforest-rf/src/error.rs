use std::path::PathBuf;

use crate::split::SplitCriterion;

/// Errors from decision tree and random forest operations.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_estimators is zero.
    #[error("n_estimators must be at least 1, got {n_estimators}")]
    InvalidEstimatorCount {
        /// The invalid n_estimators value provided.
        n_estimators: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when a fractional max_features is not in (0.0, 1.0].
    #[error("max_features fraction must be in (0.0, 1.0], got {fraction}")]
    InvalidFeatureFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when a classification model is configured with a regression criterion.
    #[error("criterion {criterion:?} cannot be used for classification")]
    InvalidCriterion {
        /// The rejected criterion.
        criterion: SplitCriterion,
    },

    /// Returned when the feature matrix is not 2-dimensional.
    #[error("feature matrix must be 2-dimensional, got {ndim} dimensions")]
    FeatureDimensionality {
        /// Number of dimensions of the rejected input.
        ndim: usize,
    },

    /// Returned when the label vector is not 1-dimensional.
    #[error("label vector must be 1-dimensional, got {ndim} dimensions")]
    TargetDimensionality {
        /// Number of dimensions of the rejected input.
        ndim: usize,
    },

    /// Returned when the feature matrix and label vector disagree on row count.
    #[error("feature matrix has {n_samples} rows but label vector has {n_targets} entries")]
    SampleCountMismatch {
        /// Rows in the feature matrix.
        n_samples: usize,
        /// Entries in the label vector.
        n_targets: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a target value is NaN or infinite.
    #[error("non-finite target at sample {sample_index}")]
    NonFiniteTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a classification label is negative or not integral.
    #[error("label {value} at sample {sample_index} is not a non-negative integer class index")]
    InvalidClassLabel {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The rejected label value.
        value: f64,
    },

    /// Returned when class labels are not dense in `[0, n_classes)`.
    #[error("class {class} never occurs, labels must cover every class in [0, {n_classes})")]
    MissingClass {
        /// The first class index with no samples.
        class: usize,
        /// The number of classes implied by the largest label.
        n_classes: usize,
    },

    /// Returned when prediction is requested before a successful fit.
    #[error("model is not fitted, call fit before predicting")]
    NotFitted,

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when class probabilities are requested from a regression model.
    #[error("class probabilities are only available for classification models")]
    ProbabilityUnavailable,

    /// Returned when OOB evaluation fails (no sample has any OOB tree).
    #[error("OOB evaluation failed: {reason}")]
    OobEvaluationFailed {
        /// Human-readable description of why OOB evaluation failed.
        reason: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
