//! Visitor lifecycle
//!
//! PENDING → APPROVED | REJECTED, APPROVED → CHECKED_IN, CHECKED_IN →
//! CHECKED_OUT once reception confirmed the visitor. Each transition is one
//! transaction holding the compare-and-swap update and its audit entry.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::{
    approval_tokens::ApprovalTokenService,
    notifications::{self, NotificationDispatcher},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        audit::{AuditAction, NewAuditEntry},
        employee::{Employee, HostRef},
        enums::VisitStatus,
        visit::{
            generate_qr_code, validate_rejection_reason, CreateVisit, EmailApprovalAction,
            EmailApprovalOutcome, NewVisit, Visit, VisitCounters, VisitQuery,
        },
    },
    repository::Repository,
};

/// Reason recorded when a host rejects from the email link without typing one
pub const DEFAULT_EMAIL_REJECTION_REASON: &str = "Rejected by host via email";

#[derive(Clone)]
pub struct VisitsService {
    repository: Repository,
    tokens: ApprovalTokenService,
    notifications: NotificationDispatcher,
    location: String,
}

impl VisitsService {
    pub fn new(
        repository: Repository,
        tokens: ApprovalTokenService,
        notifications: NotificationDispatcher,
        location: String,
    ) -> Self {
        Self {
            repository,
            tokens,
            notifications,
            location,
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Visit> {
        self.repository.visits.get_by_id(id).await
    }

    pub async fn list(&self, query: &VisitQuery) -> AppResult<(Vec<Visit>, i64)> {
        self.repository.visits.list(query).await
    }

    /// Front desk counters for the current UTC day
    pub async fn counters(&self) -> AppResult<VisitCounters> {
        self.repository.visits.counters(day_start(Utc::now())).await
    }

    fn audit(&self, subject_id: Uuid, actor_id: Option<Uuid>, action: AuditAction, note: Option<String>) -> NewAuditEntry {
        NewAuditEntry {
            subject_id,
            actor_id,
            action,
            location: self.location.clone(),
            note,
        }
    }

    /// Resolve the host text typed at the desk to exactly one employee
    async fn resolve_host(&self, raw: &str) -> AppResult<Employee> {
        let host = HostRef::parse(raw)
            .ok_or_else(|| AppError::Validation("Host is required".to_string()))?;

        let mut matches = self.repository.employees.find_by_ref(&host).await?;
        match matches.len() {
            0 => Err(AppError::Validation(format!(
                "Host '{}' does not match any active employee",
                host
            ))),
            1 => Ok(matches.remove(0)),
            n => Err(AppError::Validation(format!(
                "Host '{}' matches {} employees, use an email address instead",
                host, n
            ))),
        }
    }

    /// Explain why a compare-and-swap found nothing to update.
    /// Another request won the race; re-read and report the current state.
    async fn lost_race(&self, id: Uuid, guard: fn(&Visit) -> AppResult<()>) -> AppError {
        match self.repository.visits.get_by_id(id).await {
            Ok(current) => race_outcome(&current, guard),
            Err(e) => e,
        }
    }

    /// Register a visit, optionally approving it on the spot
    pub async fn create(&self, data: CreateVisit, actor: Uuid) -> AppResult<Visit> {
        data.validate()?;
        let host = self.resolve_host(&data.host).await?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let auto_approve = data.auto_approve.unwrap_or(false);

        let new_visit = NewVisit {
            id,
            visitor_name: data.visitor_name.trim().to_string(),
            visitor_contact: data.visitor_contact.trim().to_string(),
            id_number: data.id_number.trim().to_string(),
            company: data.company.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            host: data.host.trim().to_string(),
            host_employee_id: host.id,
            purpose: data.purpose.trim().to_string(),
            requested_at: data.requested_at,
            status: if auto_approve { VisitStatus::Approved } else { VisitStatus::Pending },
            qr_code: auto_approve.then(|| generate_qr_code(id, &data.id_number, now)),
            approved_by: auto_approve.then_some(actor),
            created_by: Some(actor),
            created_at: now,
        };

        let mut tx = self.repository.pool.begin().await?;
        let visit = self.repository.visits.insert(&mut *tx, &new_visit).await?;
        let note = auto_approve.then(|| "auto-approved at creation".to_string());
        self.repository
            .audit
            .append(&mut *tx, &self.audit(visit.id, Some(actor), AuditAction::VisitCreated, note))
            .await?;
        tx.commit().await?;

        tracing::info!(
            visit_id = %visit.id,
            actor = %actor,
            host = %host.id,
            status = %visit.status,
            "Visit created"
        );

        if visit.status == VisitStatus::Pending {
            let tokens = self.tokens.clone();
            let pending = visit.clone();
            self.notifications.submit("approval request", async move {
                let (approve_url, reject_url) = tokens.links(&host)?;
                Ok::<_, AppError>(Some(notifications::approval_request(
                    &pending,
                    &host,
                    &approve_url,
                    &reject_url,
                )))
            });
        }

        Ok(visit)
    }

    /// PENDING → APPROVED. `actor` is None only for system-initiated approvals.
    pub async fn approve(&self, id: Uuid, actor: Option<Uuid>) -> AppResult<Visit> {
        let visit = self.repository.visits.get_by_id(id).await?;
        visit.ensure_can_approve()?;

        let now = Utc::now();
        let qr_code = generate_qr_code(visit.id, &visit.id_number, now);

        let mut tx = self.repository.pool.begin().await?;
        let Some(updated) = self
            .repository
            .visits
            .mark_approved(&mut *tx, &visit, actor, &qr_code, now)
            .await?
        else {
            drop(tx);
            return Err(self.lost_race(id, Visit::ensure_can_approve).await);
        };
        self.repository
            .audit
            .append(&mut *tx, &self.audit(id, actor, AuditAction::VisitApproved, None))
            .await?;
        tx.commit().await?;

        tracing::info!(visit_id = %id, actor = ?actor, "Visit approved");
        self.notify_visitor(&updated);
        Ok(updated)
    }

    /// PENDING → REJECTED with a reason of at least five characters
    pub async fn reject(&self, id: Uuid, actor: Option<Uuid>, reason: Option<&str>) -> AppResult<Visit> {
        let reason = validate_rejection_reason(reason)?;
        let visit = self.repository.visits.get_by_id(id).await?;
        visit.ensure_can_reject()?;

        let now = Utc::now();
        let mut tx = self.repository.pool.begin().await?;
        let Some(updated) = self
            .repository
            .visits
            .mark_rejected(&mut *tx, &visit, &reason, now)
            .await?
        else {
            drop(tx);
            return Err(self.lost_race(id, Visit::ensure_can_reject).await);
        };
        self.repository
            .audit
            .append(&mut *tx, &self.audit(id, actor, AuditAction::VisitRejected, Some(reason)))
            .await?;
        tx.commit().await?;

        tracing::info!(visit_id = %id, actor = ?actor, "Visit rejected");
        self.notify_visitor(&updated);
        Ok(updated)
    }

    /// APPROVED → CHECKED_IN. The host hears about it in the background.
    pub async fn check_in(&self, id: Uuid, actor: Uuid) -> AppResult<Visit> {
        let visit = self.repository.visits.get_by_id(id).await?;
        visit.ensure_can_check_in()?;

        let now = Utc::now();
        let mut tx = self.repository.pool.begin().await?;
        let Some(updated) = self
            .repository
            .visits
            .mark_checked_in(&mut *tx, &visit, now)
            .await?
        else {
            drop(tx);
            return Err(self.lost_race(id, Visit::ensure_can_check_in).await);
        };
        self.repository
            .audit
            .append(&mut *tx, &self.audit(id, Some(actor), AuditAction::CheckIn, None))
            .await?;
        tx.commit().await?;

        tracing::info!(visit_id = %id, actor = %actor, "Visitor checked in");

        let repository = self.repository.clone();
        let arrived = updated.clone();
        self.notifications.submit("check-in notification", async move {
            let Some(host_id) = arrived.host_employee_id else {
                return Ok(None);
            };
            let host = repository.employees.get_by_id(host_id).await?;
            Ok::<_, AppError>(Some(notifications::visitor_checked_in(&arrived, &host)))
        });

        Ok(updated)
    }

    /// Reception confirmation of a checked-in visitor. Confirming twice is a no-op.
    pub async fn confirm(&self, id: Uuid, actor: Uuid) -> AppResult<Visit> {
        let visit = self.repository.visits.get_by_id(id).await?;
        if visit.ensure_can_confirm()? {
            return Ok(visit);
        }

        let now = Utc::now();
        let mut tx = self.repository.pool.begin().await?;
        let swapped = self
            .repository
            .visits
            .mark_confirmed(&mut *tx, &visit, actor, now)
            .await?;
        let updated = match swapped {
            Some(updated) => updated,
            None => {
                drop(tx);
                let current = self.repository.visits.get_by_id(id).await?;
                if current.ensure_can_confirm()? {
                    return Ok(current);
                }
                return Err(AppError::Conflict(format!(
                    "Visit {} was modified concurrently, please retry",
                    id
                )));
            }
        };
        self.repository
            .audit
            .append(&mut *tx, &self.audit(id, Some(actor), AuditAction::ReceptionConfirmed, None))
            .await?;
        tx.commit().await?;

        tracing::info!(visit_id = %id, actor = %actor, "Visitor confirmed at reception");
        Ok(updated)
    }

    /// CHECKED_IN → CHECKED_OUT, gated by the reception confirmation
    pub async fn check_out(&self, id: Uuid, actor: Uuid) -> AppResult<Visit> {
        let visit = self.repository.visits.get_by_id(id).await?;
        visit.ensure_can_check_out()?;

        let now = Utc::now();
        let mut tx = self.repository.pool.begin().await?;
        let Some(updated) = self
            .repository
            .visits
            .mark_checked_out(&mut *tx, &visit, now)
            .await?
        else {
            drop(tx);
            return Err(self.lost_race(id, Visit::ensure_can_check_out).await);
        };
        let note = updated
            .duration_minutes()
            .map(|minutes| format!("on site for {} minutes", minutes));
        self.repository
            .audit
            .append(&mut *tx, &self.audit(id, Some(actor), AuditAction::CheckOut, note))
            .await?;
        tx.commit().await?;

        tracing::info!(
            visit_id = %id,
            actor = %actor,
            duration_minutes = ?updated.duration_minutes(),
            "Visitor checked out"
        );
        Ok(updated)
    }

    /// Delete a visit that is not currently on site
    pub async fn delete(&self, id: Uuid, actor: Uuid) -> AppResult<()> {
        let visit = self.repository.visits.get_by_id(id).await?;
        visit.ensure_can_delete()?;

        let mut tx = self.repository.pool.begin().await?;
        if !self
            .repository
            .visits
            .delete_unless_checked_in(&mut *tx, id)
            .await?
        {
            drop(tx);
            return Err(self.lost_race(id, Visit::ensure_can_delete).await);
        }
        let note = Some(format!("{} ({})", visit.visitor_name, visit.status));
        self.repository
            .audit
            .append(&mut *tx, &self.audit(id, Some(actor), AuditAction::VisitDeleted, note))
            .await?;
        tx.commit().await?;

        tracing::info!(visit_id = %id, actor = %actor, "Visit deleted");
        Ok(())
    }

    /// Apply the decision carried by an email approval link.
    ///
    /// The token names the host; the host's newest pending visit is the one
    /// decided. Older pending visits stay pending and are counted in the outcome.
    pub async fn resolve_email_approval(
        &self,
        token: &str,
        action: EmailApprovalAction,
        reason: Option<&str>,
    ) -> AppResult<EmailApprovalOutcome> {
        let host = self.tokens.verify(token).await?;

        let visit = self
            .repository
            .visits
            .newest_pending_for_host(&host)
            .await?
            .ok_or_else(|| AppError::NotFound("No pending visit awaits this host".to_string()))?;

        let pending = self.repository.visits.count_pending_for_host(&host).await?;
        let other_pending_visits = (pending - 1).max(0);
        if other_pending_visits > 0 {
            tracing::warn!(
                host = %host.id,
                visit_id = %visit.id,
                other_pending_visits,
                "Email decision applied to the newest pending visit only"
            );
        }

        let visit = match action {
            EmailApprovalAction::Approve => self.approve(visit.id, Some(host.id)).await?,
            EmailApprovalAction::Reject => {
                let reason = reason
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(DEFAULT_EMAIL_REJECTION_REASON);
                self.reject(visit.id, Some(host.id), Some(reason)).await?
            }
        };

        Ok(EmailApprovalOutcome {
            visit,
            other_pending_visits,
        })
    }

    fn notify_visitor(&self, visit: &Visit) {
        if let Some(update) = notifications::status_update(visit) {
            self.notifications.dispatch(update);
        }
    }
}

/// Error for a writer whose compare-and-swap matched no row, given the row as it is now.
/// The guard's own error wins; a row that would still pass was only bumped by someone else.
fn race_outcome(current: &Visit, guard: fn(&Visit) -> AppResult<()>) -> AppError {
    match guard(current) {
        Err(e) => e,
        Ok(()) => AppError::Conflict(format!(
            "Visit {} was modified concurrently, please retry",
            current.id
        )),
    }
}

/// Start of the UTC day containing `at`
fn day_start(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(at)
}
