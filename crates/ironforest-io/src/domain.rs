//! Domain types for ironforest-io.

use ndarray::{Array1, Array2};

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A numeric tabular dataset read from CSV.
///
/// Produced by [`DatasetReader`](crate::DatasetReader). Rows keep file
/// order; `features` columns follow `feature_names`.
#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    features: Array2<f64>,
    target_name: Option<String>,
    targets: Option<Array1<f64>>,
}

impl Dataset {
    /// Create a new dataset.
    pub(crate) fn new(
        feature_names: Vec<String>,
        features: Array2<f64>,
        target: Option<(String, Array1<f64>)>,
    ) -> Self {
        let (target_name, targets) = match target {
            Some((name, values)) => (Some(name), Some(values)),
            None => (None, None),
        };
        Self {
            feature_names,
            features,
            target_name,
            targets,
        }
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the `n_samples × n_features` feature matrix.
    #[must_use]
    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Return the target column name, if one was split off.
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// Return the target column, if one was split off.
    #[must_use]
    pub fn targets(&self) -> Option<&Array1<f64>> {
        self.targets.as_ref()
    }

    /// Return the number of samples (rows).
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("my-experiment_01".to_string());
        assert!(name.is_ok());
        assert_eq!(name.unwrap().as_str(), "my-experiment_01");
    }

    #[test]
    fn experiment_name_rejects_empty() {
        let name = ExperimentName::new(String::new());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn experiment_name_rejects_special_chars() {
        let name = ExperimentName::new("my experiment!".to_string());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn dataset_shape_accessors() {
        let ds = Dataset::new(
            vec!["a".into(), "b".into()],
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
            Some(("y".into(), array![0.0, 1.0, 0.0])),
        );
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.target_name(), Some("y"));
        assert_eq!(ds.targets().map(|t| t.len()), Some(3));
    }
}
