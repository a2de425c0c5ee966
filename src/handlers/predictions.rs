//! Prediction handlers

use axum::{extract::State, Json};

use crate::{AppError, AppResult, AppState};
use crate::middleware::auth::UserContext;
use crate::models::AccidentFeatures;

/// Predict the priority of a random held-out sample and log it
pub async fn from_test(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<String>> {
    let predictor = state.predictor.clone();
    let user_name = user.username.clone();

    let result = tokio::task::spawn_blocking(move || predictor.predict_from_test(&user_name)).await??;

    state
        .prediction_log
        .append(&result.entry)
        .await
        .map_err(|e| AppError::InternalError(format!("failed to write prediction log: {}", e)))?;

    tracing::info!(
        "Prediction {} for '{}': {}",
        result.entry.request_id, user.username, result.entry.output_prediction
    );

    Ok(Json(result.priority.message().to_string()))
}

/// Predict the priority of an operator-described accident (not logged)
pub async fn from_call(
    State(state): State<AppState>,
    user: UserContext,
    Json(features): Json<AccidentFeatures>,
) -> AppResult<Json<String>> {
    let predictor = state.predictor.clone();

    let priority = tokio::task::spawn_blocking(move || predictor.predict_from_record(&features)).await??;

    tracing::debug!("Manual prediction for '{}': {:?}", user.username, priority);

    Ok(Json(priority.message().to_string()))
}
