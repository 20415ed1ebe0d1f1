//! Fit/predict estimators wrapping the forest trainer.
//!
//! An estimator owns its configuration and, after a successful
//! [`fit`](RandomForestClassifier::fit), the latest [`RandomForestResult`].
//! A failed fit leaves any previous state untouched.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewD};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::forest::RandomForest;
use crate::oob::OobScore;
use crate::result::RandomForestResult;
use crate::task::Task;
use crate::validate;

/// Random forest classifier: majority vote over CART trees.
///
/// Labels are class indices `0..n_classes` stored as `f64`.
#[derive(Debug, Clone, Default)]
pub struct RandomForestClassifier {
    config: RandomForestConfig,
    fitted: Option<RandomForestResult>,
}

/// Random forest regressor: mean of CART tree predictions.
#[derive(Debug, Clone, Default)]
pub struct RandomForestRegressor {
    config: RandomForestConfig,
    fitted: Option<RandomForestResult>,
}

impl RandomForestClassifier {
    /// Create an unfitted classifier.
    #[must_use]
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Train on `x` (`n_samples × n_features`) and labels `y`.
    ///
    /// # Errors
    ///
    /// As [`RandomForestConfig::fit`].
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<&mut Self, RfError> {
        self.fitted = Some(self.config.fit(Task::Classification, x, y)?);
        Ok(self)
    }

    /// Train on buffers of unchecked dimensionality.
    ///
    /// # Errors
    ///
    /// [`RfError::FeatureDimensionality`] / [`RfError::TargetDimensionality`]
    /// for wrongly shaped inputs, otherwise as [`RandomForestClassifier::fit`].
    pub fn fit_dyn(&mut self, x: ArrayViewD<'_, f64>, y: ArrayViewD<'_, f64>) -> Result<&mut Self, RfError> {
        let x = validate::as_matrix(x)?;
        let y = validate::as_vector(y)?;
        self.fit(x, y)
    }

    /// Predict one class index per row.
    ///
    /// # Errors
    ///
    /// [`RfError::NotFitted`] before a successful fit, otherwise as
    /// [`RandomForest::predict`].
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, RfError> {
        self.forest()?.predict(x)
    }

    /// Predict class probabilities, one row per sample.
    ///
    /// # Errors
    ///
    /// As [`RandomForestClassifier::predict`].
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, RfError> {
        self.forest()?.predict_proba(x)
    }

    /// Return the fitted forest.
    ///
    /// # Errors
    ///
    /// [`RfError::NotFitted`] before a successful fit.
    pub fn forest(&self) -> Result<&RandomForest, RfError> {
        self.fitted.as_ref().map(RandomForestResult::forest).ok_or(RfError::NotFitted)
    }

    /// Return the latest training result, if fitted.
    #[must_use]
    pub fn result(&self) -> Option<&RandomForestResult> {
        self.fitted.as_ref()
    }

    /// Return the MDI feature importances, if fitted.
    #[must_use]
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(RandomForestResult::importances)
    }

    /// Return the OOB score, if fitted with OOB enabled.
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.fitted.as_ref().and_then(RandomForestResult::oob_score)
    }

    /// Return the number of classes seen during fit.
    #[must_use]
    pub fn n_classes(&self) -> Option<usize> {
        self.fitted.as_ref().map(|r| r.forest().n_classes())
    }

    /// Return `true` after a successful fit.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }
}

impl RandomForestRegressor {
    /// Create an unfitted regressor.
    #[must_use]
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Train on `x` (`n_samples × n_features`) and real-valued targets `y`.
    ///
    /// # Errors
    ///
    /// As [`RandomForestConfig::fit`].
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<&mut Self, RfError> {
        self.fitted = Some(self.config.fit(Task::Regression, x, y)?);
        Ok(self)
    }

    /// Train on buffers of unchecked dimensionality.
    ///
    /// # Errors
    ///
    /// [`RfError::FeatureDimensionality`] / [`RfError::TargetDimensionality`]
    /// for wrongly shaped inputs, otherwise as [`RandomForestRegressor::fit`].
    pub fn fit_dyn(&mut self, x: ArrayViewD<'_, f64>, y: ArrayViewD<'_, f64>) -> Result<&mut Self, RfError> {
        let x = validate::as_matrix(x)?;
        let y = validate::as_vector(y)?;
        self.fit(x, y)
    }

    /// Predict the mean tree output per row.
    ///
    /// # Errors
    ///
    /// [`RfError::NotFitted`] before a successful fit, otherwise as
    /// [`RandomForest::predict`].
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, RfError> {
        self.forest()?.predict(x)
    }

    /// Return the fitted forest.
    ///
    /// # Errors
    ///
    /// [`RfError::NotFitted`] before a successful fit.
    pub fn forest(&self) -> Result<&RandomForest, RfError> {
        self.fitted.as_ref().map(RandomForestResult::forest).ok_or(RfError::NotFitted)
    }

    /// Return the latest training result, if fitted.
    #[must_use]
    pub fn result(&self) -> Option<&RandomForestResult> {
        self.fitted.as_ref()
    }

    /// Return the MDI feature importances, if fitted.
    #[must_use]
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(RandomForestResult::importances)
    }

    /// Return the OOB score, if fitted with OOB enabled.
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.fitted.as_ref().and_then(RandomForestResult::oob_score)
    }

    /// Return `true` after a successful fit.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array, IxDyn, array};

    use super::*;

    #[test]
    fn unfitted_predict_errors() {
        let clf = RandomForestClassifier::default();
        let x = array![[0.0, 1.0]];
        assert!(matches!(clf.predict(x.view()), Err(RfError::NotFitted)));
        assert!(matches!(clf.predict_proba(x.view()), Err(RfError::NotFitted)));
        assert!(!clf.is_fitted());

        let reg = RandomForestRegressor::default();
        assert!(matches!(reg.predict(x.view()), Err(RfError::NotFitted)));
    }

    #[test]
    fn failed_fit_keeps_previous_model() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut clf = RandomForestClassifier::new(RandomForestConfig::new(5).unwrap());
        clf.fit(x.view(), y.view()).unwrap();
        let before = clf.predict(x.view()).unwrap();

        let bad_y = array![0.0, 1.0, 1.0];
        assert!(clf.fit(x.view(), bad_y.view()).is_err());
        assert!(clf.is_fitted());
        assert_eq!(clf.predict(x.view()).unwrap(), before);
    }

    #[test]
    fn fit_dyn_rejects_three_dimensional_features() {
        let x = Array::<f64, _>::zeros(IxDyn(&[2, 2, 2]));
        let y = Array::<f64, _>::zeros(IxDyn(&[2]));
        let mut reg = RandomForestRegressor::default();
        assert!(matches!(
            reg.fit_dyn(x.view(), y.view()),
            Err(RfError::FeatureDimensionality { ndim: 3 })
        ));
        assert!(!reg.is_fitted());
    }

    #[test]
    fn fit_dyn_accepts_matrix_and_vector() {
        let x = Array::from_shape_vec(IxDyn(&[4, 1]), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let y = Array::from_shape_vec(IxDyn(&[4]), vec![0.0, 0.0, 1.0, 1.0]).unwrap();
        let mut clf = RandomForestClassifier::new(RandomForestConfig::new(3).unwrap());
        clf.fit_dyn(x.view(), y.view()).unwrap();
        assert_eq!(clf.n_classes(), Some(2));
        assert_eq!(clf.feature_importances().map(<[f64]>::len), Some(1));
    }
}
