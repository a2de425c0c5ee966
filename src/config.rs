//! Configuration module

use std::env;
use std::path::PathBuf;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// An explicit `SHIELD_LOG_FORMAT` wins; otherwise production logs JSON lines
    pub fn resolve(explicit: Option<&str>, production: bool) -> Self {
        match explicit.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(_) => LogFormat::Pretty,
            None if production => LogFormat::Json,
            None => LogFormat::Pretty,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Project root handed to the data refresh routine
    pub root_path: PathBuf,

    /// Credential store JSON file
    pub users_db_path: PathBuf,

    /// Directory holding X_train/X_test/y_train/y_test CSV files
    pub data_dir: PathBuf,

    /// Directory of the prediction log
    pub logs_dir: PathBuf,

    /// Production model artifact
    pub model_path: PathBuf,

    /// Destination of freshly trained models
    pub new_model_path: PathBuf,

    /// Number of trees grown on retraining
    pub n_trees: usize,

    /// Depth limit of each tree (None = unbounded)
    pub max_depth: Option<usize>,

    /// External program refreshing the datasets
    pub refresh_command: Option<String>,

    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let root_path = PathBuf::from(env::var("SHIELD_ROOT").unwrap_or_else(|_| ".".to_string()));

        let mut config = Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            users_db_path: env::var("SHIELD_USERS_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("users_db_bis.json")),

            data_dir: env::var("SHIELD_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| root_path.join("data").join("preprocessed")),

            logs_dir: env::var("SHIELD_LOGS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| root_path.join("logs")),

            model_path: env::var("SHIELD_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| root_path.join("models").join("trained_model.json")),

            new_model_path: env::var("SHIELD_NEW_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| root_path.join("models").join("new_trained_model.json")),

            n_trees: env::var("SHIELD_N_TREES")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(100),

            max_depth: env::var("SHIELD_MAX_DEPTH")
                .ok()
                .and_then(|d| d.parse().ok()),

            refresh_command: env::var("SHIELD_REFRESH_COMMAND")
                .ok()
                .filter(|c| !c.trim().is_empty()),

            log_format: LogFormat::Pretty,

            root_path,
        };

        let explicit_format = env::var("SHIELD_LOG_FORMAT").ok();
        config.log_format = LogFormat::resolve(explicit_format.as_deref(), config.is_production());
        config
    }

    /// Configuration rooted at a directory, with every path derived from it
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root_path = root.into();
        Self {
            port: 8000,
            environment: "development".to_string(),
            users_db_path: root_path.join("users_db_bis.json"),
            data_dir: root_path.join("data").join("preprocessed"),
            logs_dir: root_path.join("logs"),
            model_path: root_path.join("models").join("trained_model.json"),
            new_model_path: root_path.join("models").join("new_trained_model.json"),
            n_trees: 100,
            max_depth: None,
            refresh_command: None,
            log_format: LogFormat::Pretty,
            root_path,
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
