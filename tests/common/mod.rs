//! Shared fixtures for HTTP tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use shield_api::ml::{FeatureTable, ForestParams, RandomForestClassifier};
use shield_api::models::{AccidentFeatures, RefreshReport};
use shield_api::services::{DataRefresher, RefreshError};
use shield_api::store::CredentialStore;
use shield_api::{create_router, AppState, Config};

pub const ADMIN: &str = "alice:pw";
pub const STANDARD: &str = "bob:x";

/// Records the year ranges it was asked to refresh
#[derive(Clone, Default)]
pub struct RecordingRefresher {
    pub calls: Arc<Mutex<Vec<(i32, i32)>>>,
}

#[axum::async_trait]
impl DataRefresher for RecordingRefresher {
    async fn refresh(&self, start_year: i32, end_year: i32, root: &Path) -> Result<RefreshReport, RefreshError> {
        self.calls.lock().unwrap().push((start_year, end_year));
        Ok(RefreshReport {
            message: "Accident data refreshed.".to_string(),
            start_year,
            end_year,
            root: root.display().to_string(),
        })
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub config: Config,
    pub state: AppState,
    pub refresher: RecordingRefresher,
}

impl TestApp {
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub fn log_path(&self) -> PathBuf {
        self.config.logs_dir.join("pred_test.jsonl")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        identification: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(identification) = identification {
            builder = builder.header("identification", identification);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, value)
    }
}

/// Rows where more than 2 victims means priority
fn accident_rows(count: i64) -> (Vec<Vec<f64>>, Vec<i64>) {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..count {
        let features = AccidentFeatures {
            nb_victim: i % 5,
            hour: i % 24,
            jour: 1 + i % 7,
            ..Default::default()
        };
        rows.push(features.to_columns().into_iter().map(|(_, v)| v).collect());
        labels.push(if features.nb_victim > 2 { 1 } else { 0 });
    }
    (rows, labels)
}

fn write_table(path: &Path, columns: &[String], rows: &[Vec<f64>]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer.write_record(columns).unwrap();
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string())).unwrap();
    }
    writer.flush().unwrap();
}

fn write_labels(path: &Path, labels: &[i64]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer.write_record(["priority"]).unwrap();
    for label in labels {
        writer.write_record([label.to_string()]).unwrap();
    }
    writer.flush().unwrap();
}

/// Temp project with users alice (admin) and bob, datasets and a trained model
pub async fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_root(dir.path());
    config.n_trees = 5;

    std::fs::write(
        &config.users_db_path,
        r#"{
    "alice": {"username": "alice", "password": "pw", "rights": 1},
    "bob": {"username": "bob", "password": "x", "rights": 0}
}"#,
    )
    .unwrap();

    std::fs::create_dir_all(&config.data_dir).unwrap();
    let columns: Vec<String> = AccidentFeatures::COLUMNS.iter().map(|c| c.to_string()).collect();
    let (train_rows, train_labels) = accident_rows(50);
    let (test_rows, test_labels) = accident_rows(20);
    write_table(&config.data_dir.join("X_train.csv"), &columns, &train_rows);
    write_labels(&config.data_dir.join("y_train.csv"), &train_labels);
    write_table(&config.data_dir.join("X_test.csv"), &columns, &test_rows);
    write_labels(&config.data_dir.join("y_test.csv"), &test_labels);

    let table = FeatureTable::new(columns, train_rows).unwrap();
    let mut forest = RandomForestClassifier::new(ForestParams {
        n_trees: 7,
        seed: Some(3),
        ..Default::default()
    });
    forest.fit(&table, &train_labels).unwrap();
    forest.save(&config.model_path).unwrap();

    let store = CredentialStore::load(&config.users_db_path).await.unwrap();
    let refresher = RecordingRefresher::default();
    let state = AppState::new(config.clone(), store).with_refresher(refresher.clone());

    TestApp {
        dir,
        config,
        state,
        refresher,
    }
}
