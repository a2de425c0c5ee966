//! Status handler

use axum::Json;
use serde::Serialize;

pub const STATUS_MESSAGE: &str = "The API is running.";

#[derive(Serialize)]
pub struct StatusResponse {
    message: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn check() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: STATUS_MESSAGE,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
