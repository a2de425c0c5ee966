//! Prediction, training and data refresh services

pub mod prediction;
pub mod prediction_log;
pub mod refresh;
pub mod training;

pub use prediction::{PredictionService, TestSamplePrediction};
pub use prediction_log::PredictionLog;
pub use refresh::{CommandRefresher, DataRefresher, RefreshError};
pub use training::TrainingService;
