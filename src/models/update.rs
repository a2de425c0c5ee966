//! Model and dataset update payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDataRequest {
    pub start_year: i32,
    pub end_year: i32,
}

/// Outcome of a retraining run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub message: String,
    pub model_path: String,
    pub samples: usize,
    pub features: usize,
    pub trees: usize,
    pub duration_secs: f64,
}

/// Outcome of a data refresh run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub message: String,
    pub start_year: i32,
    pub end_year: i32,
    pub root: String,
}
