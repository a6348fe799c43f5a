//! Partner linking handlers
//!
//! Linking is mutual and invite-based: the invitee accepts an invite
//! addressed to their email, after which both users see the household view.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::UserQuery;
use crate::{AppError, AppState, MessageResponse};
use spendscope_core::models::{InviteList, PartnerInvite, PartnerStatus};

/// Request body for inviting a partner
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
}

/// POST /api/partners/invite - Invite someone by email
pub async fn send_invite(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
    Json(req): Json<InviteRequest>,
) -> Result<Json<PartnerInvite>, AppError> {
    if req.email.trim().is_empty() {
        return Err(AppError::bad_request("Email is required"));
    }
    Ok(Json(state.store.send_invite(user.user_id, &req.email)?))
}

/// GET /api/partners/invites - Pending invites I sent and received
pub async fn list_invites(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<InviteList>, AppError> {
    Ok(Json(state.store.list_invites(user.user_id)?))
}

/// POST /api/partners/invites/:id/accept - Accept an invite addressed to me
pub async fn accept_invite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(user): Query<UserQuery>,
) -> Result<Json<PartnerStatus>, AppError> {
    let partner = state.store.accept_invite(user.user_id, id)?;
    Ok(Json(PartnerStatus {
        has_partner: true,
        partner: Some(partner),
    }))
}

/// POST /api/partners/invites/:id/decline - Decline an invite addressed to me
pub async fn decline_invite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(user): Query<UserQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.decline_invite(user.user_id, id)?;
    Ok(MessageResponse::new("Invite declined"))
}

/// DELETE /api/partners/unlink - Remove the partner link (expenses are kept)
pub async fn unlink_partner(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.unlink_partner(user.user_id)?;
    Ok(MessageResponse::new("Partner unlinked successfully"))
}

/// GET /api/partners/status - Whether I have a partner, and who
pub async fn partner_status(
    State(state): State<Arc<AppState>>,
    Query(user): Query<UserQuery>,
) -> Result<Json<PartnerStatus>, AppError> {
    Ok(Json(state.store.partner_status(user.user_id)?))
}
