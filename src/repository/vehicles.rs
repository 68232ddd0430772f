//! Fleet vehicles and their movement ledger

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{MovementType, VehicleStatus},
        vehicle::{
            Movement, MovementDetails, MovementQuery, NewMovement, Vehicle, VehicleLatestRow,
        },
    },
};

#[derive(Clone)]
pub struct VehiclesRepository {
    pool: Pool<Postgres>,
}

/// Field changes of an administrative movement correction
#[derive(Debug, Default)]
pub struct MovementCorrection {
    pub area: Option<String>,
    pub movement_type: Option<MovementType>,
    pub mileage: Option<i64>,
    pub driver_name: Option<String>,
    pub recorded_at: Option<chrono::DateTime<Utc>>,
    pub notes: Option<String>,
}

const MOVEMENT_DETAILS_SELECT: &str = r#"
    SELECT m.id, m.vehicle_id, v.plate, v.make, v.model, m.area, m.movement_type,
           m.mileage, m.driver_name, m.notes, m.recorded_at, m.recorded_by,
           v.current_mileage
    FROM vehicle_movements m
    JOIN vehicles v ON v.id = m.vehicle_id
"#;

impl VehiclesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get vehicle by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", id)))
    }

    /// Append a row to the ledger
    pub async fn append_movement(
        &self,
        conn: &mut PgConnection,
        movement: &NewMovement,
        recorded_by: Option<Uuid>,
    ) -> AppResult<Movement> {
        let row = sqlx::query_as::<_, Movement>(
            r#"
            INSERT INTO vehicle_movements (
                vehicle_id, area, movement_type, mileage, driver_name, notes, recorded_at, recorded_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(movement.vehicle_id)
        .bind(&movement.area)
        .bind(movement.movement_type)
        .bind(movement.mileage)
        .bind(&movement.driver_name)
        .bind(&movement.notes)
        .bind(movement.recorded_at)
        .bind(recorded_by)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Raise the mileage snapshot to `mileage` if it is higher, in a single statement.
    /// Returns the snapshot after the update.
    pub async fn raise_mileage(
        &self,
        conn: &mut PgConnection,
        vehicle_id: Uuid,
        mileage: i64,
    ) -> AppResult<i64> {
        let current: i64 = sqlx::query_scalar(
            r#"
            UPDATE vehicles
            SET current_mileage = GREATEST(current_mileage, $2),
                updated_at = CASE WHEN $2 > current_mileage THEN NOW() ELSE updated_at END
            WHERE id = $1
            RETURNING current_mileage
            "#,
        )
        .bind(vehicle_id)
        .bind(mileage)
        .fetch_one(&mut *conn)
        .await?;
        Ok(current)
    }

    /// Get a movement with vehicle details
    pub async fn get_movement(&self, id: i64) -> AppResult<MovementDetails> {
        let query = format!("{} WHERE m.id = $1", MOVEMENT_DETAILS_SELECT);
        sqlx::query_as::<_, MovementDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Movement {} not found", id)))
    }

    /// List movements with optional filters, newest first
    pub async fn list_movements(&self, query: &MovementQuery) -> AppResult<(Vec<MovementDetails>, i64)> {
        let (limit, offset) = page_bounds(query.page, query.per_page, 50);

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.vehicle_id.is_some() {
            conditions.push(format!("m.vehicle_id = ${}", idx));
            idx += 1;
        }
        if query.area.is_some() {
            conditions.push(format!("m.area ILIKE ${}", idx));
            idx += 1;
        }
        if query.movement_type.is_some() {
            conditions.push(format!("m.movement_type = ${}", idx));
            idx += 1;
        }
        if query.from.is_some() {
            conditions.push(format!("m.recorded_at >= ${}", idx));
            idx += 1;
        }
        if query.to.is_some() {
            conditions.push(format!("m.recorded_at < ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let area = query.area.as_ref().map(|a| format!("%{}%", a.trim()));

        let count_q = format!(
            "SELECT COUNT(*) FROM vehicle_movements m {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(v) = query.vehicle_id { count_builder = count_builder.bind(v); }
        if let Some(ref a) = area { count_builder = count_builder.bind(a); }
        if let Some(t) = query.movement_type { count_builder = count_builder.bind(t); }
        if let Some(from) = query.from { count_builder = count_builder.bind(from); }
        if let Some(to) = query.to { count_builder = count_builder.bind(to); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "{} {} ORDER BY m.recorded_at DESC, m.id DESC LIMIT {} OFFSET {}",
            MOVEMENT_DETAILS_SELECT, where_clause, limit, offset
        );
        let mut builder = sqlx::query_as::<_, MovementDetails>(&select_q);
        if let Some(v) = query.vehicle_id { builder = builder.bind(v); }
        if let Some(ref a) = area { builder = builder.bind(a); }
        if let Some(t) = query.movement_type { builder = builder.bind(t); }
        if let Some(from) = query.from { builder = builder.bind(from); }
        if let Some(to) = query.to { builder = builder.bind(to); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// Rewrite fields of a ledger row. Derived data is left alone.
    pub async fn update_movement(&self, id: i64, data: &MovementCorrection) -> AppResult<Movement> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.area, "area");
        add_field!(data.movement_type, "movement_type");
        add_field!(data.mileage, "mileage");
        add_field!(data.driver_name, "driver_name");
        add_field!(data.recorded_at, "recorded_at");
        add_field!(data.notes, "notes");

        if sets.is_empty() {
            return sqlx::query_as::<_, Movement>("SELECT * FROM vehicle_movements WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Movement {} not found", id)));
        }

        let query = format!(
            "UPDATE vehicle_movements SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Movement>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.area);
        bind_field!(data.movement_type);
        bind_field!(data.mileage);
        bind_field!(data.driver_name);
        bind_field!(data.recorded_at);
        bind_field!(data.notes);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Movement {} not found", id)))
    }

    /// Delete a ledger row
    pub async fn delete_movement(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM vehicle_movements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Movement {} not found", id)));
        }
        Ok(())
    }

    /// Vehicles with the given statuses, each with its latest movement.
    /// Latest means newest `recorded_at`, ties broken by the insertion sequence.
    pub async fn latest_movements(&self, statuses: &[VehicleStatus]) -> AppResult<Vec<VehicleLatestRow>> {
        let statuses: Vec<&'static str> = statuses.iter().map(|s| s.as_str()).collect();
        let rows = sqlx::query_as::<_, VehicleLatestRow>(
            r#"
            WITH ranked AS (
                SELECT m.vehicle_id, m.movement_type, m.area, m.recorded_at,
                       ROW_NUMBER() OVER (
                           PARTITION BY m.vehicle_id
                           ORDER BY m.recorded_at DESC, m.id DESC
                       ) AS rn
                FROM vehicle_movements m
            )
            SELECT v.id, v.plate, v.make, v.model, v.status, v.current_mileage,
                   r.movement_type AS last_movement_type,
                   r.area AS last_area,
                   r.recorded_at AS last_recorded_at
            FROM vehicles v
            LEFT JOIN ranked r ON r.vehicle_id = v.id AND r.rn = 1
            WHERE v.status = ANY($1)
            ORDER BY v.plate
            "#,
        )
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Number of vehicles per status attribute
    pub async fn status_counts(&self) -> AppResult<Vec<(VehicleStatus, i64)>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM vehicles GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let counts = rows
            .iter()
            .map(|r| (r.get::<VehicleStatus, _>("status"), r.get::<i64, _>("count")))
            .collect();
        Ok(counts)
    }
}
