//! JSON result writer for training and prediction outputs.
//!
//! The artifact types hold primitives only, so this crate has no dependency
//! on `ironforest-rf`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// One feature's importance and rank, as written to the fit artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEntry {
    /// Feature column name.
    pub name: String,
    /// Normalized importance score.
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Out-of-bag metrics, as written to the fit artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OobEntry {
    /// OOB accuracy (classification only).
    pub accuracy: Option<f64>,
    /// OOB mean squared error (regression only).
    pub mse: Option<f64>,
    /// OOB coefficient of determination (regression only).
    pub r2: Option<f64>,
    /// Number of samples with at least one OOB tree.
    pub n_oob_samples: usize,
}

/// Summary of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    /// Experiment name.
    pub experiment: String,
    /// `"classification"` or `"regression"`.
    pub task: String,
    /// Training rows.
    pub n_samples: usize,
    /// Feature columns.
    pub n_features: usize,
    /// Number of classes (0 for regression).
    pub n_classes: usize,
    /// Trees in the forest.
    pub n_estimators: usize,
    /// Features considered per split.
    pub max_features: usize,
    /// Forest-level seed.
    pub random_state: u64,
    /// Path of the saved model binary.
    pub model_path: String,
    /// OOB metrics, when computed.
    pub oob: Option<OobEntry>,
    /// Ranked feature importances.
    pub feature_importances: Vec<FeatureEntry>,
}

/// One predicted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    /// Zero-based row index in the input file.
    pub row: usize,
    /// Class index (classification) or predicted value (regression).
    pub prediction: f64,
    /// Most probable classes with probabilities; empty for regression.
    pub top_k: Vec<ClassProbability>,
}

/// A class index paired with its predicted probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    /// Class index.
    pub class: usize,
    /// Averaged leaf probability.
    pub probability: f64,
}

/// Writes training and prediction results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_fit.json` and
/// `{experiment}_predictions.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Return the experiment name.
    #[must_use]
    pub fn experiment(&self) -> &ExperimentName {
        &self.experiment
    }

    /// Write a training summary to `{experiment}_fit.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_fit(&self, summary: &FitSummary) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("fit.json");
        self.write_json(&path, summary)?;
        info!(path = %path.display(), "fit result written");
        Ok(path)
    }

    /// Write predictions to `{experiment}_predictions.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(n_rows = predictions.len()))]
    pub fn write_predictions(
        &self,
        task: &str,
        predictions: &[PredictionEntry],
    ) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("predictions.json");

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            task,
            n_rows: predictions.len(),
            predictions,
        };
        self.write_json(&path, &artifact)?;

        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything; computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.artifact_path("model.bin")
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(value).map_err(|e| IoError::SerializeArtifact {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// --- Shadow struct for JSON serialization ---

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    task: &'a str,
    n_rows: usize,
    predictions: &'a [PredictionEntry],
}
