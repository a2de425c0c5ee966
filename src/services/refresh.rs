//! Data refresh
//!
//! Downloading and preprocessing the yearly accident files is done by an
//! external program. It receives `<start_year> <end_year> <root>` and is
//! expected to rewrite the four train/test CSV files under the root.

use std::path::Path;

use crate::models::RefreshReport;

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("data refresh command not configured")]
    NotConfigured,

    #[error("failed to start '{program}': {error}")]
    Spawn {
        program: String,
        #[source]
        error: std::io::Error,
    },

    #[error("data refresh exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

#[axum::async_trait]
pub trait DataRefresher: Send + Sync {
    async fn refresh(&self, start_year: i32, end_year: i32, root: &Path) -> Result<RefreshReport, RefreshError>;
}

/// Runs a configured command line, appending the year range and root path
#[derive(Debug, Clone, Default)]
pub struct CommandRefresher {
    command: Option<String>,
}

impl CommandRefresher {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

#[axum::async_trait]
impl DataRefresher for CommandRefresher {
    async fn refresh(&self, start_year: i32, end_year: i32, root: &Path) -> Result<RefreshReport, RefreshError> {
        let command = self.command.as_deref().ok_or(RefreshError::NotConfigured)?;
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(RefreshError::NotConfigured)?;

        tracing::info!("Refreshing data {}-{} with '{}'", start_year, end_year, command);

        let output = tokio::process::Command::new(program)
            .args(parts)
            .arg(start_year.to_string())
            .arg(end_year.to_string())
            .arg(root)
            .output()
            .await
            .map_err(|error| RefreshError::Spawn {
                program: program.to_string(),
                error,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.trim().lines().last().unwrap_or_default().to_string();
            return Err(RefreshError::Failed {
                status: output.status.to_string(),
                stderr: tail,
            });
        }

        Ok(RefreshReport {
            message: "Accident data refreshed.".to_string(),
            start_year,
            end_year,
            root: root.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_command() {
        let refresher = CommandRefresher::default();
        let err = refresher.refresh(2019, 2021, Path::new(".")).await.unwrap_err();
        assert!(matches!(err, RefreshError::NotConfigured));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_command_reports_range() {
        let refresher = CommandRefresher::new(Some("true".to_string()));
        let report = refresher.refresh(2019, 2021, Path::new("/srv/shield")).await.unwrap();
        assert_eq!(report.start_year, 2019);
        assert_eq!(report.end_year, 2021);
        assert_eq!(report.root, "/srv/shield");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command() {
        let refresher = CommandRefresher::new(Some("false".to_string()));
        let err = refresher.refresh(2019, 2021, Path::new(".")).await.unwrap_err();
        assert!(matches!(err, RefreshError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let refresher = CommandRefresher::new(Some("shield-no-such-refresh-binary".to_string()));
        let err = refresher.refresh(2019, 2021, Path::new(".")).await.unwrap_err();
        assert!(matches!(err, RefreshError::Spawn { .. }));
    }
}
