//! Fleet movement ledger and on-site derivation

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::VehicleStatus,
        vehicle::{
            parse_movement_type, summarize_on_site, Movement, MovementDetails, MovementQuery,
            OnSiteStats, RecordMovement, UpdateMovement, VehicleSiteStatus,
        },
    },
    repository::{vehicles::MovementCorrection, Repository},
};

#[derive(Clone)]
pub struct VehiclesService {
    repository: Repository,
}

impl VehiclesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Append a movement for an active vehicle and raise its mileage snapshot
    pub async fn record_movement(&self, data: RecordMovement, actor: Uuid) -> AppResult<MovementDetails> {
        let movement = data.into_new(Utc::now())?;
        let vehicle = self.repository.vehicles.get_by_id(movement.vehicle_id).await?;
        if vehicle.status != VehicleStatus::Active {
            return Err(AppError::Validation(format!(
                "Vehicle {} is {} and cannot record movements",
                vehicle.plate, vehicle.status
            )));
        }

        let mut tx = self.repository.pool.begin().await?;
        let row = self
            .repository
            .vehicles
            .append_movement(&mut *tx, &movement, Some(actor))
            .await?;
        let current_mileage = self
            .repository
            .vehicles
            .raise_mileage(&mut *tx, vehicle.id, movement.mileage)
            .await?;
        tx.commit().await?;

        if current_mileage > movement.mileage {
            tracing::debug!(
                vehicle_id = %vehicle.id,
                mileage = movement.mileage,
                current_mileage,
                "Movement mileage below snapshot, snapshot kept"
            );
        }
        tracing::info!(
            movement_id = row.id,
            vehicle_id = %vehicle.id,
            movement_type = %row.movement_type,
            area = %row.area,
            actor = %actor,
            "Vehicle movement recorded"
        );

        Ok(MovementDetails {
            id: row.id,
            vehicle_id: row.vehicle_id,
            plate: vehicle.plate,
            make: vehicle.make,
            model: vehicle.model,
            area: row.area,
            movement_type: row.movement_type,
            mileage: row.mileage,
            driver_name: row.driver_name,
            notes: row.notes,
            recorded_at: row.recorded_at,
            recorded_by: row.recorded_by,
            current_mileage,
        })
    }

    pub async fn list_movements(&self, query: &MovementQuery) -> AppResult<(Vec<MovementDetails>, i64)> {
        self.repository.vehicles.list_movements(query).await
    }

    pub async fn get_movement(&self, id: i64) -> AppResult<MovementDetails> {
        self.repository.vehicles.get_movement(id).await
    }

    /// Rewrite a ledger row. Mileage snapshots and site status are not recomputed.
    pub async fn update_movement(&self, id: i64, data: UpdateMovement, actor: Uuid) -> AppResult<Movement> {
        data.validate()?;
        let movement_type = match data.movement_type.as_deref() {
            Some(raw) => Some(parse_movement_type(Some(raw))?),
            None => None,
        };
        let correction = MovementCorrection {
            area: data.area.map(|a| a.trim().to_string()),
            movement_type,
            mileage: data.mileage,
            driver_name: data.driver_name.map(|d| d.trim().to_string()),
            recorded_at: data.recorded_at,
            notes: data.notes,
        };
        if correction.area.as_deref() == Some("") || correction.driver_name.as_deref() == Some("") {
            return Err(AppError::Validation("Area and driver name cannot be blank".to_string()));
        }

        let movement = self.repository.vehicles.update_movement(id, &correction).await?;
        tracing::info!(movement_id = id, actor = %actor, "Vehicle movement corrected");
        Ok(movement)
    }

    pub async fn delete_movement(&self, id: i64, actor: Uuid) -> AppResult<()> {
        self.repository.vehicles.delete_movement(id).await?;
        tracing::info!(movement_id = id, actor = %actor, "Vehicle movement deleted");
        Ok(())
    }

    /// Presence figures for active vehicles plus attribute counts
    pub async fn on_site_stats(&self) -> AppResult<OnSiteStats> {
        let active: Vec<VehicleSiteStatus> = self
            .repository
            .vehicles
            .latest_movements(&[VehicleStatus::Active])
            .await?
            .into_iter()
            .map(VehicleSiteStatus::from)
            .collect();
        let counts = self.repository.vehicles.status_counts().await?;
        Ok(summarize_on_site(&active, &counts))
    }

    /// Every non-retired vehicle with its derived site status
    pub async fn site_status_list(&self) -> AppResult<Vec<VehicleSiteStatus>> {
        let rows = self
            .repository
            .vehicles
            .latest_movements(&[
                VehicleStatus::Active,
                VehicleStatus::Inactive,
                VehicleStatus::Maintenance,
            ])
            .await?;
        Ok(rows.into_iter().map(VehicleSiteStatus::from).collect())
    }
}
