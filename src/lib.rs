//! SHIELD API
//!
//! Safety Hazard Identification and Emergency Law Deployment: predicts
//! whether a road accident intervention should be treated as a priority.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SHIELD API                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌────────────────┐  ┌─────────────────────┐  │
//! │  │  Router   │─▶│ identification │─▶│ Prediction/Training │  │
//! │  │  (Axum)   │  │  user / admin  │  │ Data refresh        │  │
//! │  └───────────┘  └───────┬────────┘  └──────────┬──────────┘  │
//! │                         ▼                      ▼             │
//! │                 ┌───────────────┐   ┌──────────────────────┐ │
//! │                 │ users JSON    │   │ CSV / model / JSONL  │ │
//! │                 └───────────────┘   └──────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ml;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, delete},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};

use crate::middleware::auth::{CredentialVerifier, PlaintextVerifier};
use crate::ml::ForestParams;
use crate::services::{
    CommandRefresher, DataRefresher, PredictionLog, PredictionService, TrainingService,
};
use crate::store::CredentialStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<CredentialStore>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub predictor: Arc<PredictionService>,
    pub prediction_log: Arc<PredictionLog>,
    pub trainer: Arc<TrainingService>,
    pub refresher: Arc<dyn DataRefresher>,
}

impl AppState {
    /// Wire every service from the configuration
    pub fn new(config: Config, store: CredentialStore) -> Self {
        let predictor = PredictionService::new(&config.model_path, &config.data_dir);
        let prediction_log = PredictionLog::in_dir(&config.logs_dir);
        let trainer = TrainingService::new(
            &config.data_dir,
            &config.new_model_path,
            ForestParams {
                n_trees: config.n_trees,
                max_depth: config.max_depth,
                ..Default::default()
            },
        );
        let refresher = CommandRefresher::new(config.refresh_command.clone());

        Self {
            store: Arc::new(store),
            verifier: Arc::new(PlaintextVerifier),
            predictor: Arc::new(predictor),
            prediction_log: Arc::new(prediction_log),
            trainer: Arc::new(trainer),
            refresher: Arc::new(refresher),
            config,
        }
    }

    pub fn with_refresher(mut self, refresher: impl DataRefresher + 'static) -> Self {
        self.refresher = Arc::new(refresher);
        self
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    // Public routes (no identification required)
    let public_routes = Router::new()
        .route("/status", get(handlers::status::check));

    // Any registered user
    let user_routes = Router::new()
        .route("/predict_from_test", get(handlers::predictions::from_test))
        .route("/predict_from_call", post(handlers::predictions::from_call))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user
        ));

    // Administrators only
    let admin_routes = Router::new()
        .route("/register", post(handlers::users::register))
        .route("/remove_user", delete(handlers::users::remove))
        .route("/train", get(handlers::model::train))
        .route("/update_data", post(handlers::model::update_data))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
