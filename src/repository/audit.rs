//! Audit log repository (append-only)

use sqlx::{PgConnection, Pool, Postgres};

use super::page_bounds;
use crate::{
    error::AppResult,
    models::audit::{AuditEntry, AuditQuery, NewAuditEntry},
};

#[derive(Clone)]
pub struct AuditRepository {
    pool: Pool<Postgres>,
}

impl AuditRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry on the caller's connection, so it commits with the transition it records
    pub async fn append(&self, conn: &mut PgConnection, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        let row = sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_logs (subject_id, actor_id, action, location, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(entry.subject_id)
        .bind(entry.actor_id)
        .bind(entry.action.as_str())
        .bind(&entry.location)
        .bind(&entry.note)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// List entries, newest first
    pub async fn list(&self, query: &AuditQuery) -> AppResult<(Vec<AuditEntry>, i64)> {
        let (limit, offset) = page_bounds(query.page, query.per_page, 50);

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.subject_id.is_some() {
            conditions.push(format!("subject_id = ${}", idx));
            idx += 1;
        }
        if query.action.is_some() {
            conditions.push(format!("action = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let action = query.action.as_ref().map(|a| a.trim().to_uppercase());

        let count_q = format!("SELECT COUNT(*) FROM audit_logs {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(subject) = query.subject_id { count_builder = count_builder.bind(subject); }
        if let Some(ref a) = action { count_builder = count_builder.bind(a); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM audit_logs {} ORDER BY created_at DESC, id DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut builder = sqlx::query_as::<_, AuditEntry>(&select_q);
        if let Some(subject) = query.subject_id { builder = builder.bind(subject); }
        if let Some(ref a) = action { builder = builder.bind(a); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }
}
