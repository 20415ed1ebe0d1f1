//! Model serialization and deserialization via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::task::Task;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Header fields written ahead of the forest, borrowed on save.
#[derive(serde::Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    task: Task,
    n_trees: usize,
    n_features: usize,
    n_classes: usize,
    forest: &'a RandomForest,
}

/// Owned counterpart of [`EnvelopeRef`]; same field order, so the bincode
/// layouts match.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    task: Task,
    n_trees: usize,
    n_features: usize,
    n_classes: usize,
    forest: RandomForest,
}

impl RandomForest {
    /// Save the model to a binary file.
    ///
    /// The file is a bincode-encoded envelope: format version, task, tree,
    /// feature and class counts, then the forest itself.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | bincode encoding failed |
    /// | [`RfError::WriteModel`] | file write failed |
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();

        let envelope = EnvelopeRef {
            format_version: FORMAT_VERSION,
            task: self.task,
            n_trees: self.trees.len(),
            n_features: self.n_features,
            n_classes: self.n_classes,
            forest: self,
        };

        let bytes = bincode::serialize(&envelope).map_err(|e| RfError::SerializeModel {
            source: e,
        })?;

        std::fs::write(path, &bytes).map_err(|e| RfError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_trees = self.trees.len(),
            task = %self.task,
            "model saved"
        );

        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// Checks the format version and returns an error on mismatch.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::DeserializeModel`] | bincode decoding failed |
    /// | [`RfError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| RfError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope = bincode::deserialize(&bytes).map_err(|e| {
            RfError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(RfError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(
            task = %envelope.task,
            n_trees = envelope.n_trees,
            n_features = envelope.n_features,
            n_classes = envelope.n_classes,
            "model loaded"
        );

        Ok(envelope.forest)
    }
}
