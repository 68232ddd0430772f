//! Visits repository
//!
//! Every transition is a compare-and-swap on `(status, version)`. A `None`
//! result means another request changed the visit first.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::{AppError, AppResult},
    models::{
        employee::Employee,
        visit::{NewVisit, Visit, VisitCounters, VisitQuery},
    },
};

#[derive(Clone)]
pub struct VisitsRepository {
    pool: Pool<Postgres>,
}

/// Pending visits addressed to an employee, by resolved id or by the text typed at the desk
const PENDING_FOR_HOST: &str = r#"
    status = 'pending'
    AND (
        host_employee_id = $1
        OR LOWER(TRIM(host)) = LOWER($2)
        OR LOWER(TRIM(host)) = LOWER($3)
    )
"#;

impl VisitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get visit by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Visit> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit {} not found", id)))
    }

    /// List visits with optional filters and pagination
    pub async fn list(&self, query: &VisitQuery) -> AppResult<(Vec<Visit>, i64)> {
        let (limit, offset) = page_bounds(query.page, query.per_page, 50);

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.status.is_some() {
            conditions.push(format!("status = ${}", idx));
            idx += 1;
        }
        if query.search.is_some() {
            conditions.push(format!(
                "(visitor_name ILIKE ${i} OR id_number ILIKE ${i} OR company ILIKE ${i} OR host ILIKE ${i})",
                i = idx
            ));
            idx += 1;
        }
        if query.from.is_some() {
            conditions.push(format!("requested_at >= ${}", idx));
            idx += 1;
        }
        if query.to.is_some() {
            conditions.push(format!("requested_at < ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let search = query
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.trim()));

        // Count total
        let count_q = format!("SELECT COUNT(*) FROM visits {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(status) = query.status { count_builder = count_builder.bind(status); }
        if let Some(ref s) = search { count_builder = count_builder.bind(s); }
        if let Some(from) = query.from { count_builder = count_builder.bind(from); }
        if let Some(to) = query.to { count_builder = count_builder.bind(to); }
        let total = count_builder.fetch_one(&self.pool).await?;

        // Fetch rows
        let select_q = format!(
            "SELECT * FROM visits {} ORDER BY requested_at DESC, created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut builder = sqlx::query_as::<_, Visit>(&select_q);
        if let Some(status) = query.status { builder = builder.bind(status); }
        if let Some(ref s) = search { builder = builder.bind(s); }
        if let Some(from) = query.from { builder = builder.bind(from); }
        if let Some(to) = query.to { builder = builder.bind(to); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// Front desk counters since `day_start`
    pub async fn counters(&self, day_start: DateTime<Utc>) -> AppResult<VisitCounters> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'approved' AND requested_at >= $1) AS approved_today,
                COUNT(*) FILTER (WHERE status = 'checked_in') AS checked_in,
                COUNT(*) FILTER (WHERE status = 'checked_in' AND reception_confirmed_at IS NULL) AS awaiting_confirmation,
                COUNT(*) FILTER (WHERE status = 'checked_out' AND actual_check_out >= $1) AS checked_out_today
            FROM visits
            "#,
        )
        .bind(day_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(VisitCounters {
            pending: row.get("pending"),
            approved_today: row.get("approved_today"),
            checked_in: row.get("checked_in"),
            awaiting_confirmation: row.get("awaiting_confirmation"),
            checked_out_today: row.get("checked_out_today"),
        })
    }

    /// Insert a new visit
    pub async fn insert(&self, conn: &mut PgConnection, visit: &NewVisit) -> AppResult<Visit> {
        let row = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (
                id, visitor_name, visitor_contact, id_number, company,
                host, host_employee_id, purpose, requested_at, status,
                qr_code, approved_by, created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING *
            "#,
        )
        .bind(visit.id)
        .bind(&visit.visitor_name)
        .bind(&visit.visitor_contact)
        .bind(&visit.id_number)
        .bind(&visit.company)
        .bind(&visit.host)
        .bind(visit.host_employee_id)
        .bind(&visit.purpose)
        .bind(visit.requested_at)
        .bind(visit.status)
        .bind(&visit.qr_code)
        .bind(visit.approved_by)
        .bind(visit.created_by)
        .bind(visit.created_at)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// PENDING → APPROVED. An existing credential is kept.
    pub async fn mark_approved(
        &self,
        conn: &mut PgConnection,
        visit: &Visit,
        approved_by: Option<Uuid>,
        qr_code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Visit>> {
        let row = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits
            SET status = 'approved',
                approved_by = $3,
                rejection_reason = NULL,
                qr_code = COALESCE(qr_code, $4),
                updated_at = $5,
                version = version + 1
            WHERE id = $1 AND version = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(visit.id)
        .bind(visit.version)
        .bind(approved_by)
        .bind(qr_code)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// PENDING → REJECTED
    pub async fn mark_rejected(
        &self,
        conn: &mut PgConnection,
        visit: &Visit,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Visit>> {
        let row = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits
            SET status = 'rejected',
                rejection_reason = $3,
                approved_by = NULL,
                updated_at = $4,
                version = version + 1
            WHERE id = $1 AND version = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(visit.id)
        .bind(visit.version)
        .bind(reason)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// APPROVED → CHECKED_IN
    pub async fn mark_checked_in(
        &self,
        conn: &mut PgConnection,
        visit: &Visit,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Visit>> {
        let row = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits
            SET status = 'checked_in',
                actual_check_in = $3,
                updated_at = $3,
                version = version + 1
            WHERE id = $1 AND version = $2 AND status = 'approved'
            RETURNING *
            "#,
        )
        .bind(visit.id)
        .bind(visit.version)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Reception confirmation on a CHECKED_IN visit, set once
    pub async fn mark_confirmed(
        &self,
        conn: &mut PgConnection,
        visit: &Visit,
        confirmed_by: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Visit>> {
        let row = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits
            SET reception_confirmed_at = $3,
                reception_confirmed_by = $4,
                updated_at = $3,
                version = version + 1
            WHERE id = $1 AND version = $2
              AND status = 'checked_in'
              AND reception_confirmed_at IS NULL
            RETURNING *
            "#,
        )
        .bind(visit.id)
        .bind(visit.version)
        .bind(now)
        .bind(confirmed_by)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// CHECKED_IN → CHECKED_OUT, only once reception confirmed the visitor
    pub async fn mark_checked_out(
        &self,
        conn: &mut PgConnection,
        visit: &Visit,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Visit>> {
        let row = sqlx::query_as::<_, Visit>(
            r#"
            UPDATE visits
            SET status = 'checked_out',
                actual_check_out = $3,
                updated_at = $3,
                version = version + 1
            WHERE id = $1 AND version = $2
              AND status = 'checked_in'
              AND reception_confirmed_at IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(visit.id)
        .bind(visit.version)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Delete a visit unless the visitor is on site. Returns whether a row was removed.
    pub async fn delete_unless_checked_in(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM visits WHERE id = $1 AND status <> 'checked_in'")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recently created pending visit addressed to an employee
    pub async fn newest_pending_for_host(&self, host: &Employee) -> AppResult<Option<Visit>> {
        let query = format!(
            "SELECT * FROM visits WHERE {} ORDER BY created_at DESC, id DESC LIMIT 1",
            PENDING_FOR_HOST
        );
        let row = sqlx::query_as::<_, Visit>(&query)
            .bind(host.id)
            .bind(host.email.trim())
            .bind(host.full_name.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Number of pending visits addressed to an employee
    pub async fn count_pending_for_host(&self, host: &Employee) -> AppResult<i64> {
        let query = format!("SELECT COUNT(*) FROM visits WHERE {}", PENDING_FOR_HOST);
        let count: i64 = sqlx::query_scalar(&query)
            .bind(host.id)
            .bind(host.email.trim())
            .bind(host.full_name.trim())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
