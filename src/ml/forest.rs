//! Random Forest Ensemble
//!
//! Bagged decision trees with majority voting. The fitted forest
//! remembers the feature columns it was trained on and is stored on
//! disk as a JSON artifact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::dataset::{DatasetError, FeatureTable};
use super::tree::DecisionTree;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("{features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("test set is empty")]
    EmptyTestSet,

    #[error("model has not been fitted")]
    NotFitted,

    #[error("input is missing feature column '{0}'")]
    MissingFeature(String),

    #[error("failed to access model artifact {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("invalid model artifact {path}: {error}")]
    Format {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },

    #[error("corrupt model artifact {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("training worker panicked")]
    WorkerPanicked,
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Fixed seed for reproducible training; random when unset
    pub seed: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: None,
        }
    }
}

/// Random forest ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    /// Training columns, in the order trees index them
    feature_names: Vec<String>,
    /// Sorted distinct labels; trees predict indices into this list
    classes: Vec<i64>,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            feature_names: Vec::new(),
            classes: Vec::new(),
            trees: Vec::new(),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fit the forest, growing trees in parallel on every available core
    pub fn fit(&mut self, x: &FeatureTable, y: &[i64]) -> Result<(), ModelError> {
        if x.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.n_rows() != y.len() {
            return Err(ModelError::LengthMismatch {
                features: x.n_rows(),
                labels: y.len(),
            });
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let encoded: Vec<usize> = y
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();

        let n_trees = self.params.n_trees.max(1);
        let n_features = x.n_columns();
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let base_seed = self.params.seed.unwrap_or_else(rand::random);
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(n_trees);

        let rows = x.rows();
        let n_classes = classes.len();
        let params = &self.params;
        let encoded = &encoded;

        let mut grown: Vec<(usize, DecisionTree)> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move || {
                        (worker..n_trees)
                            .step_by(workers)
                            .map(|tree_idx| {
                                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));
                                let bootstrap: Vec<usize> =
                                    (0..rows.len()).map(|_| rng.gen_range(0..rows.len())).collect();

                                let mut tree = DecisionTree::new(params.max_depth, params.min_samples_split);
                                tree.fit(rows, encoded, n_classes, bootstrap, max_features, &mut rng);
                                (tree_idx, tree)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| ModelError::WorkerPanicked))
                .collect::<Result<Vec<_>, _>>()
                .map(|chunks| chunks.into_iter().flatten().collect::<Vec<(usize, DecisionTree)>>())
        })?;

        grown.sort_by_key(|(idx, _)| *idx);

        self.trees = grown.into_iter().map(|(_, tree)| tree).collect();
        self.feature_names = x.columns().to_vec();
        self.classes = classes;

        tracing::debug!(
            "Forest fitted: {} trees, {} samples, {} features, {} classes",
            self.trees.len(), x.n_rows(), n_features, self.classes.len()
        );
        Ok(())
    }

    /// Predict one label per row; columns are matched by name
    pub fn predict(&self, x: &FeatureTable) -> Result<Vec<i64>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }

        let positions = self
            .feature_names
            .iter()
            .map(|name| {
                x.column_index(name)
                    .ok_or_else(|| ModelError::MissingFeature(name.clone()))
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let mut aligned = Vec::with_capacity(positions.len());
        let mut votes = vec![0usize; self.classes.len()];

        Ok(x.rows()
            .iter()
            .map(|row| {
                aligned.clear();
                aligned.extend(positions.iter().map(|&p| row[p]));

                votes.iter_mut().for_each(|v| *v = 0);
                for tree in &self.trees {
                    votes[tree.predict(&aligned)] += 1;
                }

                // Ties go to the smaller label
                let mut best = 0;
                for (class, &count) in votes.iter().enumerate() {
                    if count > votes[best] {
                        best = class;
                    }
                }
                self.classes[best]
            })
            .collect())
    }

    /// Write the artifact as JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let io_err = |error| ModelError::Io {
            path: path.to_path_buf(),
            error,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer(&mut writer, self).map_err(|error| ModelError::Format {
            path: path.to_path_buf(),
            error,
        })?;
        writer.flush().map_err(io_err)?;

        tracing::info!("Model artifact saved to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file = File::open(path).map_err(|error| ModelError::Io {
            path: path.to_path_buf(),
            error,
        })?;

        let model: Self = serde_json::from_reader(BufReader::new(file)).map_err(|error| ModelError::Format {
            path: path.to_path_buf(),
            error,
        })?;

        model.check().map_err(|reason| ModelError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(model)
    }

    fn check(&self) -> Result<(), String> {
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.check(self.feature_names.len(), self.classes.len())
                .map_err(|reason| format!("tree {}: {}", idx, reason))?;
        }
        Ok(())
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}
