//! Visit lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::visit::{CreateVisit, RejectVisit, Visit, VisitCounters, VisitQuery},
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse};

/// Checked-out visit with the time spent on site
#[derive(Serialize, ToSchema)]
pub struct CheckOutResult {
    pub visit: Visit,
    /// Minutes between check-in and checkout
    pub duration_minutes: Option<i64>,
}

/// Register a visit
#[utoipa::path(
    post,
    path = "/visits",
    tag = "visits",
    security(("bearer_auth" = [])),
    request_body = CreateVisit,
    responses(
        (status = 201, description = "Visit created", body = ApiResponse<Visit>),
        (status = 400, description = "Invalid request or unknown host", body = crate::error::ErrorResponse),
        (status = 403, description = "Auto-approval needs approval rights", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_visit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateVisit>,
) -> AppResult<(StatusCode, Json<ApiResponse<Visit>>)> {
    if request.auto_approve == Some(true) {
        claims.require_approve_visits()?;
    }
    let visit = state.services.visits.create(request, claims.user_id).await?;
    let message = match visit.status {
        crate::models::VisitStatus::Approved => "Visit registered and approved",
        _ => "Visit registered, waiting for host approval",
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, visit))))
}

/// List visits with filters and pagination
#[utoipa::path(
    get,
    path = "/visits",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(VisitQuery),
    responses(
        (status = 200, description = "Visits", body = PaginatedResponse<Visit>)
    )
)]
pub async fn list_visits(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<VisitQuery>,
) -> AppResult<Json<PaginatedResponse<Visit>>> {
    let (visits, total) = state.services.visits.list(&query).await?;
    Ok(Json(PaginatedResponse::new(visits, total, query.page, query.per_page)))
}

/// Front desk counters for today
#[utoipa::path(
    get,
    path = "/visits/today",
    tag = "visits",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Counters", body = VisitCounters)
    )
)]
pub async fn today_counters(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<VisitCounters>> {
    let counters = state.services.visits.counters().await?;
    Ok(Json(counters))
}

/// Get visit by ID
#[utoipa::path(
    get,
    path = "/visits/{id}",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit", body = Visit),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_visit(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Visit>> {
    let visit = state.services.visits.get(id).await?;
    Ok(Json(visit))
}

/// Approve a pending visit
#[utoipa::path(
    post,
    path = "/visits/{id}/approve",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit approved", body = ApiResponse<Visit>),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visit is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_visit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Visit>>> {
    claims.require_approve_visits()?;

    let visit = state.services.visits.approve(id, Some(claims.user_id)).await?;
    Ok(Json(ApiResponse::ok("Visit approved", visit)))
}

/// Reject a pending visit
#[utoipa::path(
    post,
    path = "/visits/{id}/reject",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit ID")),
    request_body = RejectVisit,
    responses(
        (status = 200, description = "Visit rejected", body = ApiResponse<Visit>),
        (status = 400, description = "Missing or short reason", body = crate::error::ErrorResponse),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visit is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_visit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectVisit>,
) -> AppResult<Json<ApiResponse<Visit>>> {
    claims.require_approve_visits()?;

    let visit = state
        .services
        .visits
        .reject(id, Some(claims.user_id), request.reason.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok("Visit rejected", visit)))
}

/// Check an approved visitor in at the gate
#[utoipa::path(
    post,
    path = "/visits/{id}/check-in",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visitor checked in", body = ApiResponse<Visit>),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visit is not approved", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_in_visit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Visit>>> {
    let visit = state.services.visits.check_in(id, claims.user_id).await?;
    Ok(Json(ApiResponse::ok("Visitor checked in", visit)))
}

/// Confirm a checked-in visitor at reception
#[utoipa::path(
    post,
    path = "/visits/{id}/confirm",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visitor confirmed (or already confirmed)", body = ApiResponse<Visit>),
        (status = 403, description = "Role not allowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visitor is not checked in", body = crate::error::ErrorResponse)
    )
)]
pub async fn confirm_visit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Visit>>> {
    claims.require_reception()?;

    let visit = state.services.visits.confirm(id, claims.user_id).await?;
    Ok(Json(ApiResponse::ok("Visitor confirmed at reception", visit)))
}

/// Check a confirmed visitor out
#[utoipa::path(
    post,
    path = "/visits/{id}/check-out",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visitor checked out", body = ApiResponse<CheckOutResult>),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not checked in or not confirmed at reception", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_out_visit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CheckOutResult>>> {
    let visit = state.services.visits.check_out(id, claims.user_id).await?;
    let duration_minutes = visit.duration_minutes();
    Ok(Json(ApiResponse::ok(
        "Visitor checked out",
        CheckOutResult {
            visit,
            duration_minutes,
        },
    )))
}

/// Delete a visit
#[utoipa::path(
    delete,
    path = "/visits/{id}",
    tag = "visits",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Visit ID")),
    responses(
        (status = 200, description = "Visit deleted", body = MessageResponse),
        (status = 404, description = "Visit not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Visitor is on site", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_visit(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_manage_visits()?;

    state.services.visits.delete(id, claims.user_id).await?;
    Ok(Json(MessageResponse::ok("Visit deleted")))
}
