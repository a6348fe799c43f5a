//! Analysis handlers: insight reports and partner comparison

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::{parse_timeframe, reference_or_today, UserQuery};
use crate::{AppError, AppState};
use spendscope_core::{
    compare_expenses, Audience, ExpenseStore, InsightInput, InsightReport, PartnerComparison,
};

/// Request body for an analysis
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisRequest {
    /// week, month, quarter or year
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub include_partner: bool,
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

/// POST /api/analysis - Insight report for my (or our) spending
///
/// Always answers 200: backend failures degrade the report instead.
pub async fn analyze_expenses(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<InsightReport>, AppError> {
    let period = parse_timeframe(req.timeframe.as_deref())?;
    let reference = reference_or_today(req.reference_date);

    let household = req.include_partner && state.store.partner_of(user.user_id)?.is_some();
    let audience = if household {
        Audience::Household
    } else {
        Audience::Individual
    };

    let expenses = state.store.expenses_for(user.user_id, household).await?;
    let registry = state.store.household_registry(user.user_id, household)?;
    let input = InsightInput::from_expenses(
        &expenses,
        &registry,
        period,
        reference,
        audience,
        state.config.insights.window,
    );

    let report = state.insights.analyze(&input).await;
    debug!(user_id = %user.user_id, status = %report.status, "Analysis complete");
    Ok(Json(report))
}

/// Query parameters for a partner comparison
#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    pub user_id: Uuid,
    pub timeframe: Option<String>,
    pub reference_date: Option<NaiveDate>,
}

/// GET /api/analysis/comparison - My spending next to my partner's
pub async fn compare_with_partner(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ComparisonQuery>,
) -> Result<Json<PartnerComparison>, AppError> {
    let period = parse_timeframe(params.timeframe.as_deref())?;
    let reference = reference_or_today(params.reference_date);

    let partner = state
        .store
        .partner_of(params.user_id)?
        .ok_or_else(|| AppError::bad_request("No partner linked"))?;

    let mine = state.store.expenses_for(params.user_id, false).await?;
    let theirs = state.store.expenses_for(partner.id, false).await?;
    let registry = state.store.household_registry(params.user_id, true)?;

    Ok(Json(compare_expenses(
        &mine, &theirs, &registry, period, reference,
    )))
}
