//! Visit model, transition guards and related request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::VisitStatus;
use crate::error::{AppError, AppResult};

/// Minimum trimmed length of a rejection reason
pub const MIN_REJECTION_REASON_LEN: usize = 5;

/// Visit record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visit {
    pub id: Uuid,
    pub visitor_name: String,
    /// Email or phone number of the visitor
    pub visitor_contact: String,
    /// Identity document number
    pub id_number: String,
    pub company: Option<String>,
    /// Host reference as typed by the operator
    pub host: String,
    /// Directory entry the host reference resolved to
    pub host_employee_id: Option<Uuid>,
    pub purpose: String,
    pub requested_at: DateTime<Utc>,
    pub status: VisitStatus,
    pub actual_check_in: Option<DateTime<Utc>>,
    pub actual_check_out: Option<DateTime<Utc>>,
    pub reception_confirmed_at: Option<DateTime<Utc>>,
    pub reception_confirmed_by: Option<Uuid>,
    /// Credential presented at the gate, set on first approval and never regenerated
    pub qr_code: Option<String>,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped by every transition
    pub version: i32,
}

impl Visit {
    fn ensure_edge(&self, next: VisitStatus, verb: &str) -> AppResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "Cannot {} a visit with status {}",
                verb, self.status
            )))
        }
    }

    pub fn ensure_can_approve(&self) -> AppResult<()> {
        self.ensure_edge(VisitStatus::Approved, "approve")
    }

    pub fn ensure_can_reject(&self) -> AppResult<()> {
        self.ensure_edge(VisitStatus::Rejected, "reject")
    }

    pub fn ensure_can_check_in(&self) -> AppResult<()> {
        self.ensure_edge(VisitStatus::CheckedIn, "check in")
    }

    /// Reception confirmation only exists on checked-in visits.
    /// Returns `true` when the visit is already confirmed.
    pub fn ensure_can_confirm(&self) -> AppResult<bool> {
        if self.status != VisitStatus::CheckedIn {
            return Err(AppError::InvalidState(format!(
                "Only checked-in visitors can be confirmed at reception (status is {})",
                self.status
            )));
        }
        Ok(self.reception_confirmed_at.is_some())
    }

    /// Checkout needs both the checked-in status and the reception confirmation
    pub fn ensure_can_check_out(&self) -> AppResult<()> {
        self.ensure_edge(VisitStatus::CheckedOut, "check out")?;
        if self.reception_confirmed_at.is_none() {
            return Err(AppError::InvalidState(
                "Visitor must be confirmed at reception first".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ensure_can_delete(&self) -> AppResult<()> {
        if self.status == VisitStatus::CheckedIn {
            return Err(AppError::InvalidState(
                "Cannot delete a visit while the visitor is checked in".to_string(),
            ));
        }
        Ok(())
    }

    /// Minutes between check-in and checkout, once both happened
    pub fn duration_minutes(&self) -> Option<i64> {
        match (self.actual_check_in, self.actual_check_out) {
            (Some(check_in), Some(check_out)) => Some((check_out - check_in).num_minutes()),
            _ => None,
        }
    }

    /// Email address to notify the visitor at, if the contact is one
    pub fn visitor_email(&self) -> Option<&str> {
        let contact = self.visitor_contact.trim();
        if contact.contains('@') {
            Some(contact)
        } else {
            None
        }
    }
}

/// Build the gate credential of a visit.
///
/// Composite of the visit id, the id-document number and the issue time in
/// milliseconds. Uniqueness comes from the visit id.
pub fn generate_qr_code(visit_id: Uuid, id_number: &str, issued_at: DateTime<Utc>) -> String {
    format!(
        "{}:{}:{}",
        visit_id,
        id_number.trim(),
        issued_at.timestamp_millis()
    )
}

/// Trim a rejection reason and enforce its minimum length
pub fn validate_rejection_reason(reason: Option<&str>) -> AppResult<String> {
    let reason = reason.map(str::trim).unwrap_or_default();
    if reason.chars().count() < MIN_REJECTION_REASON_LEN {
        return Err(AppError::Validation(format!(
            "Rejection reason must be at least {} characters",
            MIN_REJECTION_REASON_LEN
        )));
    }
    Ok(reason.to_string())
}

/// Create visit request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVisit {
    #[validate(length(min = 2, max = 255, message = "Visitor name must be 2-255 characters"))]
    pub visitor_name: String,
    /// Email or phone number
    #[validate(length(min = 3, max = 255, message = "Visitor contact must be 3-255 characters"))]
    pub visitor_contact: String,
    #[validate(length(min = 2, max = 100, message = "ID number must be 2-100 characters"))]
    pub id_number: String,
    pub company: Option<String>,
    /// Host email, employee id or full name
    #[validate(length(min = 1, max = 255, message = "Host is required"))]
    pub host: String,
    #[validate(length(min = 2, message = "Purpose is required"))]
    pub purpose: String,
    pub requested_at: DateTime<Utc>,
    /// Approve immediately instead of asking the host
    pub auto_approve: Option<bool>,
}

/// Fully resolved visit row to insert
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub id: Uuid,
    pub visitor_name: String,
    pub visitor_contact: String,
    pub id_number: String,
    pub company: Option<String>,
    pub host: String,
    pub host_employee_id: Uuid,
    pub purpose: String,
    pub requested_at: DateTime<Utc>,
    pub status: VisitStatus,
    pub qr_code: Option<String>,
    pub approved_by: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Reject visit request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectVisit {
    pub reason: Option<String>,
}

/// Query parameters for visit lists
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct VisitQuery {
    pub status: Option<VisitStatus>,
    /// Matches visitor name, id number, company or host
    pub search: Option<String>,
    /// Requested on or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Requested before this instant
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Front desk counters for the current day
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitCounters {
    pub pending: i64,
    pub approved_today: i64,
    pub checked_in: i64,
    pub awaiting_confirmation: i64,
    pub checked_out_today: i64,
}

/// Action carried by an email approval link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EmailApprovalAction {
    Approve,
    Reject,
}

/// Query string of an email approval link
#[derive(Debug, Deserialize, IntoParams)]
pub struct EmailApprovalQuery {
    pub action: EmailApprovalAction,
    /// Optional rejection reason typed on the landing page
    pub reason: Option<String>,
}

/// Outcome of an email approval click
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmailApprovalOutcome {
    pub visit: Visit,
    /// Other pending visits of the same host left untouched by this link
    pub other_pending_visits: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn visit(status: VisitStatus) -> Visit {
        let now = Utc::now();
        Visit {
            id: Uuid::new_v4(),
            visitor_name: "Amina Otieno".to_string(),
            visitor_contact: "amina@example.com".to_string(),
            id_number: "29384756".to_string(),
            company: None,
            host: "host@example.com".to_string(),
            host_employee_id: Some(Uuid::new_v4()),
            purpose: "Supplier meeting".to_string(),
            requested_at: now,
            status,
            actual_check_in: None,
            actual_check_out: None,
            reception_confirmed_at: None,
            reception_confirmed_by: None,
            qr_code: None,
            rejection_reason: None,
            approved_by: None,
            created_by: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[test]
    fn test_approve_and_reject_only_from_pending() {
        assert!(visit(VisitStatus::Pending).ensure_can_approve().is_ok());
        assert!(visit(VisitStatus::Pending).ensure_can_reject().is_ok());

        for status in [
            VisitStatus::Approved,
            VisitStatus::Rejected,
            VisitStatus::CheckedIn,
            VisitStatus::CheckedOut,
        ] {
            assert!(matches!(
                visit(status).ensure_can_approve(),
                Err(AppError::InvalidState(_))
            ));
            assert!(matches!(
                visit(status).ensure_can_reject(),
                Err(AppError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn test_check_in_only_from_approved() {
        assert!(visit(VisitStatus::Approved).ensure_can_check_in().is_ok());
        assert!(visit(VisitStatus::Pending).ensure_can_check_in().is_err());
        assert!(visit(VisitStatus::CheckedOut).ensure_can_check_in().is_err());
    }

    #[test]
    fn test_check_out_requires_reception_confirmation() {
        let mut v = visit(VisitStatus::CheckedIn);
        match v.ensure_can_check_out() {
            Err(AppError::InvalidState(msg)) => assert!(msg.contains("confirmed at reception")),
            other => panic!("unexpected result: {:?}", other),
        }

        v.reception_confirmed_at = Some(Utc::now());
        assert!(v.ensure_can_check_out().is_ok());

        let mut approved = visit(VisitStatus::Approved);
        approved.reception_confirmed_at = Some(Utc::now());
        assert!(approved.ensure_can_check_out().is_err());
    }

    #[test]
    fn test_confirm_is_idempotent_guard() {
        let mut v = visit(VisitStatus::CheckedIn);
        assert!(!v.ensure_can_confirm().unwrap());
        v.reception_confirmed_at = Some(Utc::now());
        assert!(v.ensure_can_confirm().unwrap());
        assert!(visit(VisitStatus::Approved).ensure_can_confirm().is_err());
    }

    #[test]
    fn test_delete_blocked_only_while_checked_in() {
        assert!(visit(VisitStatus::CheckedIn).ensure_can_delete().is_err());
        for status in [
            VisitStatus::Pending,
            VisitStatus::Approved,
            VisitStatus::Rejected,
            VisitStatus::CheckedOut,
        ] {
            assert!(visit(status).ensure_can_delete().is_ok());
        }
    }

    #[test]
    fn test_qr_code_format() {
        let id = Uuid::new_v4();
        let at = Utc::now();
        let code = generate_qr_code(id, " A1234567 ", at);
        assert_eq!(code, format!("{}:A1234567:{}", id, at.timestamp_millis()));
        assert_eq!(code.split(':').count(), 3);
    }

    #[test]
    fn test_rejection_reason_length() {
        assert!(validate_rejection_reason(None).is_err());
        assert!(validate_rejection_reason(Some("  no  ")).is_err());
        assert_eq!(
            validate_rejection_reason(Some("  Host is travelling ")).unwrap(),
            "Host is travelling"
        );
    }

    #[test]
    fn test_duration_minutes() {
        let mut v = visit(VisitStatus::CheckedOut);
        assert_eq!(v.duration_minutes(), None);
        let check_in = Utc::now();
        v.actual_check_in = Some(check_in);
        v.actual_check_out = Some(check_in + Duration::minutes(95));
        assert_eq!(v.duration_minutes(), Some(95));
    }

    #[test]
    fn test_visitor_email_only_for_email_contacts() {
        let mut v = visit(VisitStatus::Pending);
        assert_eq!(v.visitor_email(), Some("amina@example.com"));
        v.visitor_contact = "+254 700 000 000".to_string();
        assert_eq!(v.visitor_email(), None);
    }
}
