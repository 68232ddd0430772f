//! Audit log endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::audit::{AuditEntry, AuditQuery},
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List audit entries (administrators only)
#[utoipa::path(
    get,
    path = "/audit-logs",
    tag = "audit",
    security(("bearer_auth" = [])),
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit entries, newest first", body = PaginatedResponse<AuditEntry>),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<PaginatedResponse<AuditEntry>>> {
    claims.require_admin()?;

    let (entries, total) = state.services.audit.list(&query).await?;
    Ok(Json(PaginatedResponse::new(entries, total, query.page, query.per_page)))
}
