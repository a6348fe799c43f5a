//! User handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{AppError, AppState};
use spendscope_core::UserProfile;

/// Request body for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// POST /api/users - Register a user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state.store.create_user(&req.email, req.name.as_deref())?;
    info!(user_id = %user.id, "User created");
    Ok(Json(user))
}

/// GET /api/users/:id - Get a user profile
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.store.get_user(id)?))
}
