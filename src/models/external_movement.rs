//! Movements of non-fleet vehicles, keyed by normalized plate text

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::MovementType;
use super::vehicle::{parse_movement_type, required_text};
use crate::error::{AppError, AppResult};

/// Longest plate accepted after normalization
pub const MAX_PLATE_LEN: usize = 15;

/// External movements skip any approval phase
pub const EXTERNAL_STATUS_COMPLETED: &str = "completed";

/// External movement record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExternalMovement {
    pub id: i64,
    /// Normalized plate (uppercase, no whitespace)
    pub plate: String,
    pub movement_type: MovementType,
    pub area: String,
    pub driver_name: String,
    pub company: Option<String>,
    pub purpose: Option<String>,
    pub status: String,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<Uuid>,
}

/// Record external movement request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordExternalMovement {
    pub plate: Option<String>,
    /// "entry" or "exit"
    pub movement_type: Option<String>,
    #[validate(length(max = 255, message = "Area must be at most 255 characters"))]
    pub area: Option<String>,
    #[validate(length(max = 255, message = "Driver name must be at most 255 characters"))]
    pub driver_name: Option<String>,
    pub company: Option<String>,
    pub purpose: Option<String>,
}

/// Validated external movement ready to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewExternalMovement {
    pub plate: String,
    pub movement_type: MovementType,
    pub area: String,
    pub driver_name: String,
    pub company: Option<String>,
    pub purpose: Option<String>,
}

/// Uppercase the plate and strip every whitespace character
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

impl RecordExternalMovement {
    /// Normalize the plate first, then validate
    pub fn into_new(self) -> AppResult<NewExternalMovement> {
        self.validate()?;
        let plate = normalize_plate(self.plate.as_deref().unwrap_or_default());
        if plate.is_empty() {
            return Err(AppError::Validation("plate is required".to_string()));
        }
        if plate.chars().count() > MAX_PLATE_LEN {
            return Err(AppError::Validation(format!(
                "plate must be at most {} characters",
                MAX_PLATE_LEN
            )));
        }

        Ok(NewExternalMovement {
            plate,
            movement_type: parse_movement_type(self.movement_type.as_deref())?,
            area: required_text(self.area.as_deref(), "area")?,
            driver_name: required_text(self.driver_name.as_deref(), "driver_name")?,
            company: self.company.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            purpose: self.purpose.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        })
    }
}

/// Query parameters for external movement lists
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ExternalMovementQuery {
    /// Normalized the same way as recorded plates
    pub plate: Option<String>,
    pub area: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// External vehicle currently on site
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ExternalOnSite {
    pub plate: String,
    pub area: String,
    pub driver_name: String,
    pub company: Option<String>,
    pub entered_at: DateTime<Utc>,
}

/// Row of the merged fleet + external movement feed
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FeedMovement {
    /// "fleet" or "external"
    pub source: String,
    pub id: i64,
    /// Normalized plate, the correlation key across both ledgers
    pub plate: String,
    pub movement_type: MovementType,
    pub area: String,
    pub driver_name: String,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate(" kda 123x "), "KDA123X");
        assert_eq!(normalize_plate("kd\tb\n45 6"), "KDB456");
        assert_eq!(normalize_plate("   "), "");
    }

    fn request(plate: &str) -> RecordExternalMovement {
        RecordExternalMovement {
            plate: Some(plate.to_string()),
            movement_type: Some("entry".to_string()),
            area: Some("Visitor Parking".to_string()),
            driver_name: Some("J. Kamau".to_string()),
            company: Some("  ".to_string()),
            purpose: Some("Delivery".to_string()),
        }
    }

    #[test]
    fn test_plate_is_normalized_before_validation() {
        let movement = request(" kda 123x ").into_new().unwrap();
        assert_eq!(movement.plate, "KDA123X");
        assert_eq!(movement.company, None);
        assert_eq!(movement.purpose.as_deref(), Some("Delivery"));

        // 16 characters after normalization
        let long = request("ABCD EFGH IJKL MNOP");
        assert!(matches!(long.into_new(), Err(AppError::Validation(_))));

        // Blank plates fail even though the raw text is non-empty
        assert!(matches!(request("  \t ").into_new(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unknown_movement_type_is_rejected() {
        let mut r = request("KDA123X");
        r.movement_type = Some("transit".to_string());
        assert!(matches!(r.into_new(), Err(AppError::Validation(_))));
    }
}
