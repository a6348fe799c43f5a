//! Gmail import handler
//!
//! The client fetches labelled receipt messages and posts them here, either
//! flattened or as raw Gmail API `messages.get` payloads.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{reference_or_today, UserQuery};
use crate::{AppError, AppState};
use spendscope_core::ai::AIClient;
use spendscope_core::{import_messages, EmailMessage, GmailMessage, ImportSummary};

/// Upper bound on messages per request
const MAX_MESSAGES: usize = 500;

fn default_true() -> bool {
    true
}

/// Request body for an import
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub messages: Vec<EmailMessage>,
    /// Raw Gmail API messages (base64url bodies)
    #[serde(default)]
    pub gmail_messages: Vec<GmailMessage>,
    /// Ask the AI backend for a category (when one is configured)
    #[serde(default = "default_true")]
    pub auto_categorize: bool,
    /// Date for messages without a parseable `Date` header (today when absent)
    #[serde(default)]
    pub default_date: Option<NaiveDate>,
}

/// POST /api/gmail/import - Extract expenses from fetched receipt emails
pub async fn import_gmail(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportSummary>, AppError> {
    if req.messages.len() + req.gmail_messages.len() > MAX_MESSAGES {
        return Err(AppError::bad_request(&format!(
            "At most {} messages per import",
            MAX_MESSAGES
        )));
    }
    // Unknown users fail before any work is done
    state.store.get_user(user.user_id)?;

    let mut messages = req.messages;
    for raw in &req.gmail_messages {
        messages.push(EmailMessage::from_gmail(raw)?);
    }

    let backend: Option<&AIClient> = if req.auto_categorize {
        state.ai.as_ref()
    } else {
        None
    };
    let registry = state.store.household_registry(user.user_id, false)?;

    let summary = import_messages(
        &state.store,
        user.user_id,
        &messages,
        backend,
        &registry,
        reference_or_today(req.default_date),
        state.config.insights.timeout,
    )
    .await?;

    Ok(Json(summary))
}
