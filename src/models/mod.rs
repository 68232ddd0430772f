//! Data models for Gatekeeper

pub mod audit;
pub mod employee;
pub mod enums;
pub mod external_movement;
pub mod principal;
pub mod vehicle;
pub mod visit;

// Re-export commonly used types
pub use audit::{AuditAction, AuditEntry, NewAuditEntry};
pub use employee::{Employee, HostRef};
pub use enums::{MovementType, SiteStatus, VehicleStatus, VisitStatus};
pub use external_movement::ExternalMovement;
pub use principal::{Role, UserClaims};
pub use vehicle::{Movement, MovementDetails, Vehicle};
pub use visit::Visit;
