//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{approvals, audit, external_movements, health, vehicles, visits};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gatekeeper API",
        version = "1.0.0",
        description = "Site access management REST API: visitors, fleet and external vehicle movements",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Visits
        visits::create_visit,
        visits::list_visits,
        visits::today_counters,
        visits::get_visit,
        visits::approve_visit,
        visits::reject_visit,
        visits::check_in_visit,
        visits::confirm_visit,
        visits::check_out_visit,
        visits::delete_visit,
        // Email approvals
        approvals::resolve_email_approval,
        // Fleet
        vehicles::record_movement,
        vehicles::list_movements,
        vehicles::update_movement,
        vehicles::delete_movement,
        vehicles::on_site_stats,
        vehicles::vehicle_status,
        // External vehicles
        external_movements::record_external_movement,
        external_movements::list_external_movements,
        external_movements::external_on_site,
        external_movements::recent_movements,
        // Audit
        audit::list_audit_logs,
    ),
    components(
        schemas(
            // Visits
            crate::models::visit::Visit,
            crate::models::visit::CreateVisit,
            crate::models::visit::RejectVisit,
            crate::models::visit::VisitCounters,
            crate::models::visit::EmailApprovalAction,
            crate::models::visit::EmailApprovalOutcome,
            crate::models::enums::VisitStatus,
            visits::CheckOutResult,
            // Fleet
            crate::models::vehicle::Movement,
            crate::models::vehicle::MovementDetails,
            crate::models::vehicle::RecordMovement,
            crate::models::vehicle::UpdateMovement,
            crate::models::vehicle::VehicleSiteStatus,
            crate::models::vehicle::OnSiteStats,
            crate::models::vehicle::AreaCount,
            crate::models::enums::MovementType,
            crate::models::enums::VehicleStatus,
            crate::models::enums::SiteStatus,
            // External vehicles
            crate::models::external_movement::ExternalMovement,
            crate::models::external_movement::RecordExternalMovement,
            crate::models::external_movement::ExternalOnSite,
            crate::models::external_movement::FeedMovement,
            // Audit
            crate::models::audit::AuditEntry,
            // Envelopes
            crate::api::MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "visits", description = "Visitor lifecycle"),
        (name = "approvals", description = "Host decisions from email links"),
        (name = "vehicles", description = "Fleet movement ledger"),
        (name = "external-movements", description = "Non-fleet vehicle movements"),
        (name = "audit", description = "Audit log")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
