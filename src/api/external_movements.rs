//! External vehicle movements and the merged feed

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::external_movement::{
        ExternalMovement, ExternalMovementQuery, ExternalOnSite, FeedMovement,
        RecordExternalMovement,
    },
    AppState,
};

use super::{ApiResponse, AuthenticatedUser, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum number of rows (1-200, default 20)
    pub limit: Option<i64>,
}

/// Record an external vehicle entry or exit
#[utoipa::path(
    post,
    path = "/external-movements",
    tag = "external-movements",
    security(("bearer_auth" = [])),
    request_body = RecordExternalMovement,
    responses(
        (status = 201, description = "Movement recorded", body = ApiResponse<ExternalMovement>),
        (status = 400, description = "Invalid movement", body = crate::error::ErrorResponse),
        (status = 403, description = "Role not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn record_external_movement(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<RecordExternalMovement>,
) -> AppResult<(StatusCode, Json<ApiResponse<ExternalMovement>>)> {
    claims.require_record_movements()?;

    let movement = state
        .services
        .external_movements
        .record(request, claims.user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("External movement recorded", movement)),
    ))
}

/// List external movements
#[utoipa::path(
    get,
    path = "/external-movements",
    tag = "external-movements",
    security(("bearer_auth" = [])),
    params(ExternalMovementQuery),
    responses(
        (status = 200, description = "Movements, newest first", body = PaginatedResponse<ExternalMovement>)
    )
)]
pub async fn list_external_movements(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ExternalMovementQuery>,
) -> AppResult<Json<PaginatedResponse<ExternalMovement>>> {
    let (movements, total) = state.services.external_movements.list(&query).await?;
    Ok(Json(PaginatedResponse::new(movements, total, query.page, query.per_page)))
}

/// External vehicles currently on site
#[utoipa::path(
    get,
    path = "/external-movements/on-site",
    tag = "external-movements",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Plates whose latest movement is an entry", body = Vec<ExternalOnSite>)
    )
)]
pub async fn external_on_site(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ExternalOnSite>>> {
    let vehicles = state.services.external_movements.on_site().await?;
    Ok(Json(vehicles))
}

/// Fleet and external movements in one feed
#[utoipa::path(
    get,
    path = "/movements/recent",
    tag = "external-movements",
    security(("bearer_auth" = [])),
    params(RecentQuery),
    responses(
        (status = 200, description = "Newest movements of both ledgers", body = Vec<FeedMovement>)
    )
)]
pub async fn recent_movements(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<FeedMovement>>> {
    let feed = state
        .services
        .external_movements
        .recent(query.limit.unwrap_or(20))
        .await?;
    Ok(Json(feed))
}
