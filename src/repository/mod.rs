//! Repository layer for database operations

pub mod audit;
pub mod employees;
pub mod external_movements;
pub mod vehicles;
pub mod visits;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub visits: visits::VisitsRepository,
    pub employees: employees::EmployeesRepository,
    pub audit: audit::AuditRepository,
    pub vehicles: vehicles::VehiclesRepository,
    pub external_movements: external_movements::ExternalMovementsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            visits: visits::VisitsRepository::new(pool.clone()),
            employees: employees::EmployeesRepository::new(pool.clone()),
            audit: audit::AuditRepository::new(pool.clone()),
            vehicles: vehicles::VehiclesRepository::new(pool.clone()),
            external_movements: external_movements::ExternalMovementsRepository::new(pool.clone()),
            pool,
        }
    }
}

/// Clamp pagination parameters, returning (limit, offset)
pub(crate) fn page_bounds(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> (i64, i64) {
    let per_page = per_page.unwrap_or(default_per_page).clamp(1, 200);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1) * per_page)
}
