//! Model and dataset update handlers

use axum::{extract::State, Json};

use crate::{AppResult, AppState};
use crate::middleware::auth::UserContext;
use crate::models::{RefreshReport, TrainingReport, UpdateDataRequest};

/// Retrain on the training tables; the result goes to the new-model path
pub async fn train(
    State(state): State<AppState>,
    admin: UserContext,
) -> AppResult<Json<TrainingReport>> {
    let trainer = state.trainer.clone();

    tracing::info!("Retraining requested by '{}'", admin.username);

    let report = tokio::task::spawn_blocking(move || trainer.train()).await??;

    tracing::info!(
        "Model retrained on {} samples in {:.2}s -> {}",
        report.samples, report.duration_secs, report.model_path
    );

    Ok(Json(report))
}

/// Regenerate the train/test tables for a range of years
pub async fn update_data(
    State(state): State<AppState>,
    admin: UserContext,
    Json(req): Json<UpdateDataRequest>,
) -> AppResult<Json<RefreshReport>> {
    tracing::info!(
        "Data refresh {}-{} requested by '{}'",
        req.start_year, req.end_year, admin.username
    );

    let report = state
        .refresher
        .refresh(req.start_year, req.end_year, &state.config.root_path)
        .await?;

    Ok(Json(report))
}
