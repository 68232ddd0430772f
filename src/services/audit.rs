//! Audit log reads. Entries are written by the transitions they record.

use crate::{
    error::AppResult,
    models::audit::{AuditEntry, AuditQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuditService {
    repository: Repository,
}

impl AuditService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &AuditQuery) -> AppResult<(Vec<AuditEntry>, i64)> {
        self.repository.audit.list(query).await
    }
}
