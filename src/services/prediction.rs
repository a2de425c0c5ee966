//! Priority prediction
//!
//! The model artifact and the test tables are read from disk on every
//! call; nothing is cached between requests.

use std::path::PathBuf;
use std::time::Instant;

use rand::Rng;

use crate::ml::{f1_macro, load_labels, FeatureTable, ModelError, RandomForestClassifier};
use crate::models::{AccidentFeatures, PredictionLogEntry, Priority};

pub const X_TEST_FILE: &str = "X_test.csv";
pub const Y_TEST_FILE: &str = "y_test.csv";

/// Result of a prediction on a random held-out sample
#[derive(Debug, Clone)]
pub struct TestSamplePrediction {
    pub priority: Priority,
    pub entry: PredictionLogEntry,
}

pub struct PredictionService {
    model_path: PathBuf,
    data_dir: PathBuf,
}

impl PredictionService {
    pub fn new(model_path: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Classify one uniformly drawn row of the test set and score the
    /// model on the whole test set.
    pub fn predict_from_test(&self, user_name: &str) -> Result<TestSamplePrediction, ModelError> {
        let model = RandomForestClassifier::load(&self.model_path)?;
        let x_test = FeatureTable::from_csv_path(&self.data_dir.join(X_TEST_FILE))?;
        let y_test = load_labels(&self.data_dir.join(Y_TEST_FILE))?;

        if x_test.is_empty() {
            return Err(ModelError::EmptyTestSet);
        }
        if x_test.n_rows() != y_test.len() {
            return Err(ModelError::LengthMismatch {
                features: x_test.n_rows(),
                labels: y_test.len(),
            });
        }

        let index = rand::thread_rng().gen_range(0..x_test.n_rows());
        let sample = x_test.select_row(index).ok_or(ModelError::EmptyTestSet)?;
        let input_features = x_test.row_features(index).unwrap_or_default();

        let started = Instant::now();
        let prediction = model
            .predict(&sample)?
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyTestSet)?;
        let prediction_time = started.elapsed().as_secs_f64();

        let y_pred = model.predict(&x_test)?;
        let f1_score_macro_average = f1_macro(&y_test, &y_pred);

        tracing::debug!(
            "Test row {} predicted {} in {:.6}s (macro F1 {:.4})",
            index, prediction, prediction_time, f1_score_macro_average
        );

        Ok(TestSamplePrediction {
            priority: Priority::from_prediction(prediction),
            entry: PredictionLogEntry {
                request_id: request_id(),
                user_name: user_name.to_string(),
                time_stamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
                input_features,
                output_prediction: prediction,
                f1_score_macro_average,
                prediction_time,
            },
        })
    }

    /// Classify an operator-supplied accident description
    pub fn predict_from_record(&self, features: &AccidentFeatures) -> Result<Priority, ModelError> {
        let model = RandomForestClassifier::load(&self.model_path)?;
        let input = FeatureTable::from_named_row(&features.to_columns());

        let prediction = model
            .predict(&input)?
            .into_iter()
            .next()
            .ok_or(ModelError::NotFitted)?;

        Ok(Priority::from_prediction(prediction))
    }
}

/// 16 random decimal digits
fn request_id() -> String {
    let mut rng = rand::thread_rng();
    (0..16)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::ForestParams;
    use std::fs;
    use std::path::Path;

    /// Writes a model trained on "more than 2 victims is prioritary" plus matching test tables
    fn fixture(dir: &Path) -> PredictionService {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let features = AccidentFeatures {
                nb_victim: i % 5,
                hour: i % 24,
                ..Default::default()
            };
            rows.push(features.to_columns().into_iter().map(|(_, v)| v).collect::<Vec<f64>>());
            labels.push(if features.nb_victim > 2 { 1 } else { 0 });
        }
        let columns: Vec<String> = AccidentFeatures::COLUMNS.iter().map(|c| c.to_string()).collect();
        let table = FeatureTable::new(columns.clone(), rows.clone()).unwrap();

        let mut forest = RandomForestClassifier::new(ForestParams {
            n_trees: 7,
            seed: Some(11),
            ..Default::default()
        });
        forest.fit(&table, &labels).unwrap();
        let model_path = dir.join("models").join("trained_model.json");
        forest.save(&model_path).unwrap();

        let data_dir = dir.join("data");
        fs::create_dir_all(&data_dir).unwrap();
        let mut x_csv = columns.join(",") + "\n";
        for row in &rows {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            x_csv.push_str(&(cells.join(",") + "\n"));
        }
        fs::write(data_dir.join(X_TEST_FILE), x_csv).unwrap();
        let y_csv: String = std::iter::once("priority".to_string())
            .chain(labels.iter().map(|l| l.to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(data_dir.join(Y_TEST_FILE), y_csv + "\n").unwrap();

        PredictionService::new(model_path, data_dir)
    }

    #[test]
    fn test_predict_from_test_builds_log_entry() {
        let dir = tempfile::tempdir().unwrap();
        let service = fixture(dir.path());

        let result = service.predict_from_test("alice").unwrap();
        let entry = &result.entry;

        assert_eq!(entry.user_name, "alice");
        assert_eq!(entry.request_id.len(), 16);
        assert!(entry.request_id.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(entry.input_features.len(), AccidentFeatures::COLUMNS.len());
        assert!(entry.input_features.contains_key("int"));
        assert!(entry.prediction_time >= 0.0);
        assert!((0.0..=1.0).contains(&entry.f1_score_macro_average));
        assert_eq!(result.priority, Priority::from_prediction(entry.output_prediction));
    }

    #[test]
    fn test_predict_from_record_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let service = fixture(dir.path());
        let features = AccidentFeatures::default();

        let first = service.predict_from_record(&features).unwrap();
        for _ in 0..5 {
            assert_eq!(service.predict_from_record(&features).unwrap(), first);
        }
    }

    #[test]
    fn test_predict_from_record_follows_model() {
        let dir = tempfile::tempdir().unwrap();
        let service = fixture(dir.path());

        let severe = AccidentFeatures { nb_victim: 4, ..Default::default() };
        let minor = AccidentFeatures { nb_victim: 0, ..Default::default() };

        assert_eq!(service.predict_from_record(&severe).unwrap(), Priority::Prioritary);
        assert_eq!(service.predict_from_record(&minor).unwrap(), Priority::NotPrioritary);
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = PredictionService::new(dir.path().join("absent.json"), dir.path());
        assert!(matches!(
            service.predict_from_record(&AccidentFeatures::default()),
            Err(ModelError::Io { .. })
        ));
    }

    #[test]
    fn test_request_ids_are_digits() {
        let id = request_id();
        assert_eq!(id.len(), 16);
        assert!(id.bytes().all(|b| b.is_ascii_digit()));
    }
}
