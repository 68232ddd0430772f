//! Audit log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Consequential transitions recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    VisitCreated,
    VisitApproved,
    VisitRejected,
    CheckIn,
    ReceptionConfirmed,
    CheckOut,
    VisitDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::VisitCreated => "VISIT_CREATED",
            AuditAction::VisitApproved => "VISIT_APPROVED",
            AuditAction::VisitRejected => "VISIT_REJECTED",
            AuditAction::CheckIn => "CHECK_IN",
            AuditAction::ReceptionConfirmed => "RECEPTION_CONFIRMED",
            AuditAction::CheckOut => "CHECK_OUT",
            AuditAction::VisitDeleted => "VISIT_DELETED",
        }
    }
}

/// Immutable audit entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuditEntry {
    pub id: i64,
    /// Visit or employee the entry is about
    pub subject_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub location: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Entry to append
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub subject_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub location: String,
    pub note: Option<String>,
}

/// Query parameters for audit lists
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AuditQuery {
    pub subject_id: Option<Uuid>,
    pub action: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
