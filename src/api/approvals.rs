//! Public endpoint behind the links in host approval emails

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::visit::{EmailApprovalAction, EmailApprovalOutcome, EmailApprovalQuery},
    AppState,
};

use super::ApiResponse;

/// Approve or reject the host's newest pending visit from an email link
#[utoipa::path(
    get,
    path = "/visit-approvals/{token}",
    tag = "approvals",
    params(
        ("token" = String, Path, description = "Host approval token from the email"),
        EmailApprovalQuery
    ),
    responses(
        (status = 200, description = "Decision applied", body = ApiResponse<EmailApprovalOutcome>),
        (status = 400, description = "Rejection reason too short", body = crate::error::ErrorResponse),
        (status = 404, description = "Invalid link or no pending visit", body = crate::error::ErrorResponse),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn resolve_email_approval(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<EmailApprovalQuery>,
) -> AppResult<Json<ApiResponse<EmailApprovalOutcome>>> {
    let outcome = state
        .services
        .visits
        .resolve_email_approval(&token, query.action, query.reason.as_deref())
        .await?;

    let mut message = match query.action {
        EmailApprovalAction::Approve => format!("Visit of {} approved", outcome.visit.visitor_name),
        EmailApprovalAction::Reject => format!("Visit of {} rejected", outcome.visit.visitor_name),
    };
    if outcome.other_pending_visits > 0 {
        message.push_str(&format!(
            "; {} other pending visit(s) still need a decision",
            outcome.other_pending_visits
        ));
    }

    Ok(Json(ApiResponse::ok(message, outcome)))
}
