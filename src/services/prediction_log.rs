//! Prediction log
//!
//! Append-only JSONL file, one object per test-sample prediction.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::models::PredictionLogEntry;

/// Log file name inside the logs directory
pub const PREDICTION_LOG_FILE: &str = "pred_test.jsonl";

pub struct PredictionLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Log stored as `pred_test.jsonl` inside `logs_dir`
    pub fn in_dir(logs_dir: &Path) -> Self {
        Self::new(logs_dir.join(PREDICTION_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single line
    pub async fn append(&self, entry: &PredictionLogEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Prediction {} logged to {:?}", entry.request_id, self.path);
        Ok(())
    }
}
