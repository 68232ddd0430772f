//! Fleet movement ledger and presence endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::vehicle::{
        Movement, MovementDetails, MovementQuery, OnSiteStats, RecordMovement, UpdateMovement,
        VehicleSiteStatus,
    },
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse};

/// Record a fleet vehicle entry or exit
#[utoipa::path(
    post,
    path = "/vehicle-movements",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    request_body = RecordMovement,
    responses(
        (status = 201, description = "Movement recorded", body = ApiResponse<MovementDetails>),
        (status = 400, description = "Invalid movement or inactive vehicle", body = crate::error::ErrorResponse),
        (status = 403, description = "Role not allowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Vehicle not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn record_movement(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<RecordMovement>,
) -> AppResult<(StatusCode, Json<ApiResponse<MovementDetails>>)> {
    claims.require_record_movements()?;

    let movement = state
        .services
        .vehicles
        .record_movement(request, claims.user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Vehicle movement recorded", movement)),
    ))
}

/// List fleet movements
#[utoipa::path(
    get,
    path = "/vehicle-movements",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(MovementQuery),
    responses(
        (status = 200, description = "Movements, newest first", body = PaginatedResponse<MovementDetails>)
    )
)]
pub async fn list_movements(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<PaginatedResponse<MovementDetails>>> {
    let (movements, total) = state.services.vehicles.list_movements(&query).await?;
    Ok(Json(PaginatedResponse::new(movements, total, query.page, query.per_page)))
}

/// Correct a ledger row (administrators only)
#[utoipa::path(
    put,
    path = "/vehicle-movements/{id}",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Movement ID")),
    request_body = UpdateMovement,
    responses(
        (status = 200, description = "Movement corrected", body = ApiResponse<Movement>),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Movement not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_movement(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMovement>,
) -> AppResult<Json<ApiResponse<Movement>>> {
    claims.require_admin()?;

    let movement = state
        .services
        .vehicles
        .update_movement(id, request, claims.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("Vehicle movement updated", movement)))
}

/// Delete a ledger row (administrators only)
#[utoipa::path(
    delete,
    path = "/vehicle-movements/{id}",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Movement ID")),
    responses(
        (status = 200, description = "Movement deleted", body = MessageResponse),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Movement not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_movement(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.vehicles.delete_movement(id, claims.user_id).await?;
    Ok(Json(MessageResponse::ok("Vehicle movement deleted")))
}

/// On-site figures for the fleet
#[utoipa::path(
    get,
    path = "/vehicles/on-site/stats",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fleet presence figures", body = OnSiteStats)
    )
)]
pub async fn on_site_stats(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<OnSiteStats>> {
    let stats = state.services.vehicles.on_site_stats().await?;
    Ok(Json(stats))
}

/// Every non-retired vehicle with its derived site status
#[utoipa::path(
    get,
    path = "/vehicles/status",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Vehicle site status", body = Vec<VehicleSiteStatus>)
    )
)]
pub async fn vehicle_status(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<VehicleSiteStatus>>> {
    let vehicles = state.services.vehicles.site_status_list().await?;
    Ok(Json(vehicles))
}
