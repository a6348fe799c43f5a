//! Category handlers
//!
//! Global defaults are visible to everyone and read-only; users manage their
//! own categories on top of them.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::UserQuery;
use crate::{AppError, AppState, MessageResponse};
use spendscope_core::models::{CategoryUpdate, NewCategory};
use spendscope_core::Category;

/// GET /api/categories - Defaults plus my own categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.store.categories_for(user.user_id)?))
}

/// POST /api/categories - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
    Json(new): Json<NewCategory>,
) -> Result<Json<Category>, AppError> {
    let category = state.store.create_category(user.user_id, new)?;
    info!(user_id = %user.user_id, category = %category.name, "Category created");
    Ok(Json(category))
}

/// PUT /api/categories/:id - Update one of my categories
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(user): Query<UserQuery>,
    Json(update): Json<CategoryUpdate>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(state.store.update_category(user.user_id, id, update)?))
}

/// DELETE /api/categories/:id - Delete one of my categories
///
/// Expenses in the category become uncategorized.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(user): Query<UserQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.delete_category(user.user_id, id)?;
    info!(user_id = %user.user_id, category_id = %id, "Category deleted");
    Ok(MessageResponse::new("Category deleted"))
}
