//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use spendscope_core::ai::InsightBackend;

#[derive(Serialize)]
pub struct AiStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub available: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ai: AiStatus,
}

/// GET /api/health - Liveness and AI backend status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ai = match state.ai {
        Some(ref client) => AiStatus {
            configured: true,
            model: Some(client.model().to_string()),
            available: client.health_check().await,
        },
        None => AiStatus {
            configured: false,
            model: None,
            available: false,
        },
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        ai,
    })
}
