//! Model retraining

use std::path::PathBuf;
use std::time::Instant;

use crate::ml::{load_labels, FeatureTable, ForestParams, ModelError, RandomForestClassifier};
use crate::models::TrainingReport;

pub const X_TRAIN_FILE: &str = "X_train.csv";
pub const Y_TRAIN_FILE: &str = "y_train.csv";

/// Fits a fresh forest on the training tables and writes it next to,
/// never over, the production artifact.
pub struct TrainingService {
    data_dir: PathBuf,
    output_path: PathBuf,
    params: ForestParams,
}

impl TrainingService {
    pub fn new(data_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>, params: ForestParams) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_path: output_path.into(),
            params,
        }
    }

    /// Blocking: loads, fits and saves in one go
    pub fn train(&self) -> Result<TrainingReport, ModelError> {
        let x_train = FeatureTable::from_csv_path(&self.data_dir.join(X_TRAIN_FILE))?;
        let y_train = load_labels(&self.data_dir.join(Y_TRAIN_FILE))?;

        tracing::info!(
            "Training on {} samples x {} features ({} trees)",
            x_train.n_rows(), x_train.n_columns(), self.params.n_trees
        );

        let started = Instant::now();
        let mut forest = RandomForestClassifier::new(self.params.clone());
        forest.fit(&x_train, &y_train)?;
        let duration_secs = started.elapsed().as_secs_f64();

        forest.save(&self.output_path)?;

        Ok(TrainingReport {
            message: "Model retrained and saved.".to_string(),
            model_path: self.output_path.display().to_string(),
            samples: x_train.n_rows(),
            features: x_train.n_columns(),
            trees: forest.n_trees(),
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_training_set(dir: &Path, labels: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join(X_TRAIN_FILE),
            "nb_victim,hour\n0,1\n1,5\n3,9\n4,13\n0,17\n5,21\n",
        )
        .unwrap();
        fs::write(dir.join(Y_TRAIN_FILE), labels).unwrap();
    }

    #[test]
    fn test_train_writes_new_artifact_only() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        write_training_set(&data_dir, "priority\n0\n0\n1\n1\n0\n1\n");

        let production = dir.path().join("models").join("trained_model.json");
        let output = dir.path().join("models").join("new_trained_model.json");
        let service = TrainingService::new(
            &data_dir,
            &output,
            ForestParams { n_trees: 3, seed: Some(5), ..Default::default() },
        );

        let report = service.train().unwrap();

        assert_eq!(report.samples, 6);
        assert_eq!(report.features, 2);
        assert_eq!(report.trees, 3);
        assert!(output.exists());
        assert!(!production.exists());

        let model = RandomForestClassifier::load(&output).unwrap();
        assert_eq!(model.feature_names(), &["nb_victim", "hour"]);
    }

    #[test]
    fn test_label_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_training_set(dir.path(), "priority\n0\n1\n");

        let service = TrainingService::new(dir.path(), dir.path().join("out.json"), ForestParams::default());
        assert!(matches!(
            service.train(),
            Err(ModelError::LengthMismatch { features: 6, labels: 2 })
        ));
    }

    #[test]
    fn test_missing_training_files() {
        let dir = tempfile::tempdir().unwrap();
        let service = TrainingService::new(dir.path(), dir.path().join("out.json"), ForestParams::default());
        assert!(matches!(service.train(), Err(ModelError::Dataset(_))));
    }
}
