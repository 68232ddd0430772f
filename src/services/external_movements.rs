//! Non-fleet vehicle movements and the merged movement feed

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::external_movement::{
        ExternalMovement, ExternalMovementQuery, ExternalOnSite, FeedMovement,
        RecordExternalMovement,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ExternalMovementsService {
    repository: Repository,
}

impl ExternalMovementsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Normalize, validate and append an external movement
    pub async fn record(&self, data: RecordExternalMovement, actor: Uuid) -> AppResult<ExternalMovement> {
        let movement = data.into_new()?;
        let row = self.repository.external_movements.insert(&movement, Some(actor)).await?;
        tracing::info!(
            movement_id = row.id,
            plate = %row.plate,
            movement_type = %row.movement_type,
            actor = %actor,
            "External movement recorded"
        );
        Ok(row)
    }

    pub async fn list(&self, query: &ExternalMovementQuery) -> AppResult<(Vec<ExternalMovement>, i64)> {
        self.repository.external_movements.list(query).await
    }

    pub async fn on_site(&self) -> AppResult<Vec<ExternalOnSite>> {
        self.repository.external_movements.on_site().await
    }

    /// Fleet and external movements in one feed, newest first
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<FeedMovement>> {
        self.repository.external_movements.recent_feed(limit).await
    }
}
