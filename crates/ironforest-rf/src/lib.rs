//! Random Forest classification and regression: train, evaluate, predict.
//!
//! Provides CART decision trees with Gini/Entropy/MSE split criteria,
//! bagged ensembles trained in parallel via rayon with reproducible
//! seeding, out-of-bag evaluation, feature importance, and model
//! serialization. Inputs and outputs are `ndarray` buffers.

mod config;
mod error;
mod estimator;
mod forest;
mod importance;
mod node;
mod oob;
mod predict;
mod result;
mod sampler;
mod serialize;
mod split;
mod task;
mod tree;
mod validate;

pub use config::{MaxFeatures, OobMode, RandomForestConfig};
pub use error::RfError;
pub use estimator::{RandomForestClassifier, RandomForestRegressor};
pub use forest::RandomForest;
pub use importance::{RankedFeature, rank_features};
pub use node::{FeatureIndex, Impurity, LeafValue, Node, NodeIndex};
pub use oob::OobScore;
pub use predict::ClassDistribution;
pub use result::{RandomForestResult, TrainingMetadata};
pub use sampler::SeededSampler;
pub use split::SplitCriterion;
pub use task::Task;
pub use tree::{DecisionTree, DecisionTreeConfig};
