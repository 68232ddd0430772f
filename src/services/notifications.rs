//! Outbound notifications
//!
//! Triggering operations hand a notification to the dispatcher and move on.
//! Delivery runs on its own task; failures are logged and dropped.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::{
    error::AppResult,
    models::{employee::Employee, visit::Visit},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Asks the host to approve or reject a pending visit
    VisitApprovalRequest,
    /// Tells the host their visitor is at the gate
    VisitorCheckedIn,
    /// Tells the visitor the host decided
    VisitStatusUpdate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient: String,
    pub payload: Value,
}

/// Transport for notifications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, kind: NotificationKind, recipient: &str, payload: &Value) -> AppResult<()>;
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Send and report whether it went through. Errors never escape.
    pub async fn deliver(&self, notification: &Notification) -> bool {
        match self
            .notifier
            .send(notification.kind, &notification.recipient, &notification.payload)
            .await
        {
            Ok(()) => {
                tracing::debug!(kind = ?notification.kind, recipient = %notification.recipient, "Notification sent");
                true
            }
            Err(e) => {
                tracing::warn!(
                    kind = ?notification.kind,
                    recipient = %notification.recipient,
                    "Notification delivery failed: {}",
                    e
                );
                false
            }
        }
    }

    /// Deliver a ready notification in the background
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<bool> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver(&notification).await })
    }

    /// Build and deliver a notification in the background.
    ///
    /// `build` may do its own lookups; `Ok(None)` means there is nobody to notify.
    pub fn submit<F>(&self, label: &'static str, build: F) -> JoinHandle<bool>
    where
        F: Future<Output = AppResult<Option<Notification>>> + Send + 'static,
    {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            match build.await {
                Ok(Some(notification)) => dispatcher.deliver(&notification).await,
                Ok(None) => {
                    tracing::debug!("{}: nothing to send", label);
                    false
                }
                Err(e) => {
                    tracing::warn!("{}: could not prepare notification: {}", label, e);
                    false
                }
            }
        })
    }
}

pub fn approval_request(visit: &Visit, host: &Employee, approve_url: &str, reject_url: &str) -> Notification {
    Notification {
        kind: NotificationKind::VisitApprovalRequest,
        recipient: host.email.clone(),
        payload: json!({
            "visit_id": visit.id,
            "host_name": host.full_name,
            "visitor_name": visit.visitor_name,
            "company": visit.company,
            "purpose": visit.purpose,
            "requested_at": visit.requested_at,
            "approve_url": approve_url,
            "reject_url": reject_url,
        }),
    }
}

pub fn visitor_checked_in(visit: &Visit, host: &Employee) -> Notification {
    Notification {
        kind: NotificationKind::VisitorCheckedIn,
        recipient: host.email.clone(),
        payload: json!({
            "visit_id": visit.id,
            "host_name": host.full_name,
            "visitor_name": visit.visitor_name,
            "company": visit.company,
            "checked_in_at": visit.actual_check_in,
        }),
    }
}

/// Only visitors who left an email address hear back
pub fn status_update(visit: &Visit) -> Option<Notification> {
    let recipient = visit.visitor_email()?;
    Some(Notification {
        kind: NotificationKind::VisitStatusUpdate,
        recipient: recipient.to_string(),
        payload: json!({
            "visit_id": visit.id,
            "visitor_name": visit.visitor_name,
            "status": visit.status,
            "requested_at": visit.requested_at,
            "qr_code": visit.qr_code,
            "rejection_reason": visit.rejection_reason,
        }),
    })
}

fn text<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Subject and plain-text body of a notification email
pub fn render(kind: NotificationKind, payload: &Value) -> (String, String) {
    let visitor = text(payload, "visitor_name");
    match kind {
        NotificationKind::VisitApprovalRequest => (
            format!("Visit request from {}", visitor),
            format!(
                "Hello {host},\n\n{visitor} ({company}) asked to visit you on {at}.\nPurpose: {purpose}\n\nApprove: {approve}\nReject: {reject}\n",
                host = text(payload, "host_name"),
                visitor = visitor,
                company = text(payload, "company"),
                at = text(payload, "requested_at"),
                purpose = text(payload, "purpose"),
                approve = text(payload, "approve_url"),
                reject = text(payload, "reject_url"),
            ),
        ),
        NotificationKind::VisitorCheckedIn => (
            format!("{} has arrived", visitor),
            format!(
                "Hello {host},\n\n{visitor} checked in at the gate at {at}.\n",
                host = text(payload, "host_name"),
                visitor = visitor,
                at = text(payload, "checked_in_at"),
            ),
        ),
        NotificationKind::VisitStatusUpdate => {
            let status = text(payload, "status");
            let mut body = format!("Hello {},\n\nYour visit request is now {}.\n", visitor, status);
            match status {
                "approved" => body.push_str(&format!(
                    "Show this code at the gate: {}\n",
                    text(payload, "qr_code")
                )),
                "rejected" => body.push_str(&format!(
                    "Reason: {}\n",
                    text(payload, "rejection_reason")
                )),
                _ => {}
            }
            (format!("Your visit request was {}", status), body)
        }
    }
}
