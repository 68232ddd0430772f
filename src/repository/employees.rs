//! Employee directory lookups (read-only)

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::employee::{Employee, HostRef},
};

#[derive(Clone)]
pub struct EmployeesRepository {
    pool: Pool<Postgres>,
}

impl EmployeesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get employee by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Employee> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", id)))
    }

    /// Active employees matching a host reference.
    /// Names are not unique, so several rows may come back.
    pub async fn find_by_ref(&self, host: &HostRef) -> AppResult<Vec<Employee>> {
        let rows = match host {
            HostRef::EmployeeId(id) => {
                sqlx::query_as::<_, Employee>(
                    "SELECT * FROM employees WHERE id = $1 AND is_active = TRUE",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            HostRef::Email(email) => {
                sqlx::query_as::<_, Employee>(
                    "SELECT * FROM employees WHERE LOWER(email) = LOWER($1) AND is_active = TRUE",
                )
                .bind(email)
                .fetch_all(&self.pool)
                .await?
            }
            HostRef::Name(name) => {
                sqlx::query_as::<_, Employee>(
                    r#"
                    SELECT * FROM employees
                    WHERE LOWER(full_name) = LOWER($1) AND is_active = TRUE
                    ORDER BY created_at
                    "#,
                )
                .bind(name)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }
}
