//! Priority classifier
//!
//! CSV datasets, a bagged decision-tree ensemble and the metrics
//! used to score it.

mod dataset;
mod forest;
mod metrics;
mod tree;

pub use dataset::{load_labels, DatasetError, FeatureTable};
pub use forest::{ForestParams, ModelError, RandomForestClassifier};
pub use metrics::f1_macro;
pub use tree::{DecisionNode, DecisionTree};
