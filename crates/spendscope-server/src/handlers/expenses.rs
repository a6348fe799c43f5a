//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{parse_timeframe, reference_or_today, UserQuery};
use crate::{AppError, AppState, MessageResponse};
use spendscope_core::models::ExpenseUpdate;
use spendscope_core::store::DEFAULT_PAGE_SIZE;
use spendscope_core::{
    categorize_expense, dashboard_stats, DashboardStats, Expense, ExpenseQuery, ExpenseStore,
    NewExpense,
};

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ListExpensesQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub include_partner: bool,
    /// Earliest date (YYYY-MM-DD, inclusive)
    pub start_date: Option<NaiveDate>,
    /// Latest date (YYYY-MM-DD, inclusive)
    pub end_date: Option<NaiveDate>,
    /// Category name
    pub category: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub limit: usize,
    pub offset: usize,
}

/// GET /api/expenses - List expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListExpensesQuery>,
) -> Result<Json<ExpenseListResponse>, AppError> {
    if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
        if start > end {
            return Err(AppError::bad_request("start_date must not be after end_date"));
        }
    }

    let query = ExpenseQuery {
        include_partner: params.include_partner,
        start_date: params.start_date,
        end_date: params.end_date,
        category: params.category,
        limit: params.limit,
        offset: params.offset,
    };
    let expenses = state.store.list_expenses(params.user_id, &query)?;

    Ok(Json(ExpenseListResponse {
        expenses,
        // Input validation: report the clamped page size
        limit: query.page_size(),
        offset: query.offset,
    }))
}

/// POST /api/expenses - Record an expense
///
/// Without a known category, the configured AI backend is asked for one.
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
    Json(mut new): Json<NewExpense>,
) -> Result<Json<Expense>, AppError> {
    new.validate()?;
    let registry = state.store.household_registry(user.user_id, false)?;
    let known = new
        .category
        .as_deref()
        .is_some_and(|name| registry.contains(name.trim()));

    if let (false, Some(ai)) = (known, state.ai.as_ref()) {
        new.category = categorize_expense(
            ai,
            &registry,
            &new.description,
            new.merchant.as_deref(),
            state.config.insights.timeout,
        )
        .await;
    }

    let expense = state.store.add_expense(user.user_id, new)?;
    info!(user_id = %user.user_id, expense_id = %expense.id, "Expense created");
    Ok(Json(expense))
}

/// GET /api/expenses/:id - Get one of my expenses
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(user): Query<UserQuery>,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(state.store.get_expense(user.user_id, id)?))
}

/// PUT /api/expenses/:id - Update one of my expenses
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(user): Query<UserQuery>,
    Json(update): Json<ExpenseUpdate>,
) -> Result<Json<Expense>, AppError> {
    Ok(Json(state.store.update_expense(user.user_id, id, update)?))
}

/// DELETE /api/expenses/:id - Delete one of my expenses
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(user): Query<UserQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.delete_expense(user.user_id, id)?;
    info!(user_id = %user.user_id, expense_id = %id, "Expense deleted");
    Ok(MessageResponse::new("Expense deleted"))
}

/// Query parameters for dashboard statistics
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub include_partner: bool,
    /// week, month, quarter or year
    pub timeframe: Option<String>,
    /// Day the window is anchored on (today when absent)
    pub reference_date: Option<NaiveDate>,
}

/// GET /api/expenses/stats - Dashboard statistics
pub async fn expense_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    let period = parse_timeframe(params.timeframe.as_deref())?;
    let reference = reference_or_today(params.reference_date);

    let expenses = state
        .store
        .expenses_for(params.user_id, params.include_partner)
        .await?;
    let registry = state
        .store
        .household_registry(params.user_id, params.include_partner)?;

    Ok(Json(dashboard_stats(
        &expenses,
        &registry,
        period,
        reference,
        &state.config.dashboard,
    )))
}
