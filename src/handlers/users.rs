//! User management handlers

use axum::{extract::State, Json};

use crate::{AppState, AppResult};
use crate::middleware::auth::UserContext;
use crate::models::{MessageResponse, RegisterRequest, RemoveUserRequest};

pub const USER_ADDED_MESSAGE: &str = "New user added!";
pub const USER_REMOVED_MESSAGE: &str = "User removed!";
pub const USER_NOT_FOUND_MESSAGE: &str = "The specified user does not exist.";

/// Register or overwrite an account
pub async fn register(
    State(state): State<AppState>,
    admin: UserContext,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<MessageResponse>> {
    let record = req.into_record();
    let username = record.username.clone();
    let rights = record.rights;

    state.store.register(record).await?;

    tracing::info!("User '{}' (rights {}) registered by '{}'", username, rights, admin.username);

    Ok(Json(MessageResponse::new(USER_ADDED_MESSAGE)))
}

/// Remove an account. Unknown users are reported in the body, not as an error status.
pub async fn remove(
    State(state): State<AppState>,
    admin: UserContext,
    Json(req): Json<RemoveUserRequest>,
) -> AppResult<Json<MessageResponse>> {
    if !state.store.remove(&req.user).await? {
        tracing::info!("'{}' tried to remove unknown user '{}'", admin.username, req.user);
        return Ok(Json(MessageResponse::new(USER_NOT_FOUND_MESSAGE)));
    }

    tracing::info!("User '{}' removed by '{}'", req.user, admin.username);

    Ok(Json(MessageResponse::new(USER_REMOVED_MESSAGE)))
}
