//! Fleet vehicles, movement ledger rows and on-site derivation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{MovementType, SiteStatus, VehicleStatus};
use crate::error::{AppError, AppResult};

/// Fleet vehicle (owned by the fleet module, only `current_mileage` moves here)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub status: VehicleStatus,
    /// Highest odometer reading seen so far, never moves backwards
    pub current_mileage: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Movement ledger row. `id` is the monotonic insertion sequence.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Movement {
    pub id: i64,
    pub vehicle_id: Uuid,
    pub area: String,
    pub movement_type: MovementType,
    pub mileage: i64,
    pub driver_name: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<Uuid>,
}

/// Movement with vehicle and recorder details attached
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MovementDetails {
    pub id: i64,
    pub vehicle_id: Uuid,
    pub plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub area: String,
    pub movement_type: MovementType,
    pub mileage: i64,
    pub driver_name: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<Uuid>,
    /// Vehicle snapshot after this movement was applied
    pub current_mileage: i64,
}

/// Record movement request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordMovement {
    pub vehicle_id: Option<Uuid>,
    /// "entry" or "exit"
    pub movement_type: Option<String>,
    #[validate(length(max = 255, message = "Area must be at most 255 characters"))]
    pub area: Option<String>,
    #[validate(range(min = 0, message = "Mileage cannot be negative"))]
    pub mileage: Option<i64>,
    #[validate(length(max = 255, message = "Driver name must be at most 255 characters"))]
    pub driver_name: Option<String>,
    /// Defaults to the time of the call
    pub recorded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Validated movement ready to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub vehicle_id: Uuid,
    pub movement_type: MovementType,
    pub area: String,
    pub mileage: i64,
    pub driver_name: String,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Trimmed, non-empty text or a validation error naming the field
pub(crate) fn required_text(value: Option<&str>, field: &str) -> AppResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

pub(crate) fn parse_movement_type(value: Option<&str>) -> AppResult<MovementType> {
    let raw = required_text(value, "movement_type")?;
    raw.parse().map_err(|_| {
        AppError::Validation(format!(
            "movement_type must be 'entry' or 'exit', got '{}'",
            raw
        ))
    })
}

impl RecordMovement {
    /// Validate the request and resolve defaults against `now`
    pub fn into_new(self, now: DateTime<Utc>) -> AppResult<NewMovement> {
        self.validate()?;
        let vehicle_id = self
            .vehicle_id
            .ok_or_else(|| AppError::Validation("vehicle_id is required".to_string()))?;
        let movement_type = parse_movement_type(self.movement_type.as_deref())?;
        let area = required_text(self.area.as_deref(), "area")?;
        let driver_name = required_text(self.driver_name.as_deref(), "driver_name")?;
        let mileage = self
            .mileage
            .ok_or_else(|| AppError::Validation("mileage is required".to_string()))?;

        Ok(NewMovement {
            vehicle_id,
            movement_type,
            area,
            mileage,
            driver_name,
            recorded_at: self.recorded_at.unwrap_or(now),
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Administrative correction of a movement row
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMovement {
    #[validate(length(min = 1, max = 255, message = "Area must be 1-255 characters"))]
    pub area: Option<String>,
    pub movement_type: Option<String>,
    #[validate(range(min = 0, message = "Mileage cannot be negative"))]
    pub mileage: Option<i64>,
    #[validate(length(min = 1, max = 255, message = "Driver name must be 1-255 characters"))]
    pub driver_name: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Query parameters for movement lists
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct MovementQuery {
    pub vehicle_id: Option<Uuid>,
    pub area: Option<String>,
    pub movement_type: Option<MovementType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// One vehicle with the latest row of its ledger (if any)
#[derive(Debug, Clone, FromRow)]
pub struct VehicleLatestRow {
    pub id: Uuid,
    pub plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub status: VehicleStatus,
    pub current_mileage: i64,
    pub last_movement_type: Option<MovementType>,
    pub last_area: Option<String>,
    pub last_recorded_at: Option<DateTime<Utc>>,
}

/// Vehicle with its derived site status
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VehicleSiteStatus {
    pub id: Uuid,
    pub plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub status: VehicleStatus,
    pub current_mileage: i64,
    pub site_status: SiteStatus,
    /// Area of the latest movement
    pub area: Option<String>,
    pub last_movement_at: Option<DateTime<Utc>>,
}

impl From<VehicleLatestRow> for VehicleSiteStatus {
    fn from(row: VehicleLatestRow) -> Self {
        VehicleSiteStatus {
            id: row.id,
            plate: row.plate,
            make: row.make,
            model: row.model,
            status: row.status,
            current_mileage: row.current_mileage,
            site_status: SiteStatus::from_latest(row.last_movement_type),
            area: row.last_area,
            last_movement_at: row.last_recorded_at,
        }
    }
}

/// On-site count for one area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AreaCount {
    pub area: String,
    pub count: i64,
}

/// Fleet presence dashboard figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OnSiteStats {
    pub total_active: i64,
    pub on_site: i64,
    pub off_site: i64,
    /// On-site vehicles grouped by the area of their latest entry
    pub by_area: Vec<AreaCount>,
    pub inactive: i64,
    pub maintenance: i64,
    pub retired: i64,
}

/// Aggregate latest-row data of active vehicles into dashboard figures.
/// `status_counts` holds the plain attribute counts per vehicle status.
pub fn summarize_on_site(
    active: &[VehicleSiteStatus],
    status_counts: &[(VehicleStatus, i64)],
) -> OnSiteStats {
    let mut by_area: Vec<AreaCount> = Vec::new();
    let mut on_site = 0;

    for vehicle in active.iter().filter(|v| v.site_status == SiteStatus::OnSite) {
        on_site += 1;
        let area = vehicle.area.clone().unwrap_or_else(|| "Unknown".to_string());
        match by_area.iter_mut().find(|a| a.area == area) {
            Some(entry) => entry.count += 1,
            None => by_area.push(AreaCount { area, count: 1 }),
        }
    }
    by_area.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.area.cmp(&b.area)));

    let count_of = |status: VehicleStatus| {
        status_counts
            .iter()
            .filter(|(s, _)| *s == status)
            .map(|(_, c)| *c)
            .sum::<i64>()
    };

    let total_active = active.len() as i64;
    OnSiteStats {
        total_active,
        on_site,
        off_site: total_active - on_site,
        by_area,
        inactive: count_of(VehicleStatus::Inactive),
        maintenance: count_of(VehicleStatus::Maintenance),
        retired: count_of(VehicleStatus::Retired),
    }
}
