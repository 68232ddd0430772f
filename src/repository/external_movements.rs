//! External movements repository and the merged movement feed

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::AppResult,
    models::external_movement::{
        normalize_plate, ExternalMovement, ExternalMovementQuery, ExternalOnSite, FeedMovement,
        NewExternalMovement, EXTERNAL_STATUS_COMPLETED,
    },
};

#[derive(Clone)]
pub struct ExternalMovementsRepository {
    pool: Pool<Postgres>,
}

impl ExternalMovementsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an external movement, always recorded as completed
    pub async fn insert(
        &self,
        movement: &NewExternalMovement,
        recorded_by: Option<Uuid>,
    ) -> AppResult<ExternalMovement> {
        let row = sqlx::query_as::<_, ExternalMovement>(
            r#"
            INSERT INTO external_movements (
                plate, movement_type, area, driver_name, company, purpose, status, recorded_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&movement.plate)
        .bind(movement.movement_type)
        .bind(&movement.area)
        .bind(&movement.driver_name)
        .bind(&movement.company)
        .bind(&movement.purpose)
        .bind(EXTERNAL_STATUS_COMPLETED)
        .bind(recorded_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// List external movements, newest first
    pub async fn list(&self, query: &ExternalMovementQuery) -> AppResult<(Vec<ExternalMovement>, i64)> {
        let (limit, offset) = page_bounds(query.page, query.per_page, 50);

        let mut conditions = Vec::new();
        let mut idx = 1;

        let plate = query
            .plate
            .as_deref()
            .map(normalize_plate)
            .filter(|p| !p.is_empty());

        if plate.is_some() {
            conditions.push(format!("plate = ${}", idx));
            idx += 1;
        }
        if query.area.is_some() {
            conditions.push(format!("area ILIKE ${}", idx));
            idx += 1;
        }
        if query.from.is_some() {
            conditions.push(format!("recorded_at >= ${}", idx));
            idx += 1;
        }
        if query.to.is_some() {
            conditions.push(format!("recorded_at < ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let area = query.area.as_ref().map(|a| format!("%{}%", a.trim()));

        let count_q = format!("SELECT COUNT(*) FROM external_movements {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref p) = plate { count_builder = count_builder.bind(p); }
        if let Some(ref a) = area { count_builder = count_builder.bind(a); }
        if let Some(from) = query.from { count_builder = count_builder.bind(from); }
        if let Some(to) = query.to { count_builder = count_builder.bind(to); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM external_movements {} ORDER BY recorded_at DESC, id DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut builder = sqlx::query_as::<_, ExternalMovement>(&select_q);
        if let Some(ref p) = plate { builder = builder.bind(p); }
        if let Some(ref a) = area { builder = builder.bind(a); }
        if let Some(from) = query.from { builder = builder.bind(from); }
        if let Some(to) = query.to { builder = builder.bind(to); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// Plates whose latest movement is an entry
    pub async fn on_site(&self) -> AppResult<Vec<ExternalOnSite>> {
        let rows = sqlx::query_as::<_, ExternalOnSite>(
            r#"
            WITH ranked AS (
                SELECT plate, movement_type, area, driver_name, company, recorded_at,
                       ROW_NUMBER() OVER (
                           PARTITION BY plate
                           ORDER BY recorded_at DESC, id DESC
                       ) AS rn
                FROM external_movements
            )
            SELECT plate, area, driver_name, company, recorded_at AS entered_at
            FROM ranked
            WHERE rn = 1 AND movement_type = 'entry'
            ORDER BY recorded_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Latest movements of both ledgers, merged and keyed by normalized plate
    pub async fn recent_feed(&self, limit: i64) -> AppResult<Vec<FeedMovement>> {
        let rows = sqlx::query_as::<_, FeedMovement>(
            r#"
            SELECT * FROM (
                SELECT 'fleet' AS source, m.id,
                       UPPER(REGEXP_REPLACE(v.plate, '\s', '', 'g')) AS plate,
                       m.movement_type, m.area, m.driver_name, m.recorded_at
                FROM vehicle_movements m
                JOIN vehicles v ON v.id = m.vehicle_id
                UNION ALL
                SELECT 'external' AS source, e.id, e.plate,
                       e.movement_type, e.area, e.driver_name, e.recorded_at
                FROM external_movements e
            ) feed
            ORDER BY recorded_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, 200))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
