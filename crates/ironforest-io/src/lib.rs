//! File I/O, validation, and serialization for the ironforest pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{Dataset, ExperimentName};
pub use error::IoError;
pub use reader::DatasetReader;
pub use writer::{
    ClassProbability, FeatureEntry, FitSummary, OobEntry, PredictionEntry, ResultWriter,
};
