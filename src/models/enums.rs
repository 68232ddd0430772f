//! Text-backed domain enums shared by the models

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Implements string conversions and the sqlx TEXT/VARCHAR mapping for a unit enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Invalid {}: {}", stringify!($name), other)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// VisitStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a visit request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Pending,
    Approved,
    Rejected,
    CheckedIn,
    CheckedOut,
    /// Representable for legacy rows, no operation moves a visit here
    Expired,
}

text_enum!(VisitStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    CheckedIn => "checked_in",
    CheckedOut => "checked_out",
    Expired => "expired",
});

impl VisitStatus {
    /// The only edges of the visit graph. There are no back-edges.
    pub fn can_transition_to(self, next: VisitStatus) -> bool {
        matches!(
            (self, next),
            (VisitStatus::Pending, VisitStatus::Approved)
                | (VisitStatus::Pending, VisitStatus::Rejected)
                | (VisitStatus::Approved, VisitStatus::CheckedIn)
                | (VisitStatus::CheckedIn, VisitStatus::CheckedOut)
        )
    }
}

// ---------------------------------------------------------------------------
// MovementType
// ---------------------------------------------------------------------------

/// Direction of a gate movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Entry,
    Exit,
}

text_enum!(MovementType {
    Entry => "entry",
    Exit => "exit",
});

// ---------------------------------------------------------------------------
// VehicleStatus
// ---------------------------------------------------------------------------

/// Fleet vehicle status (owned by the fleet module)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Active,
    Inactive,
    Maintenance,
    Retired,
}

text_enum!(VehicleStatus {
    Active => "active",
    Inactive => "inactive",
    Maintenance => "maintenance",
    Retired => "retired",
});

// ---------------------------------------------------------------------------
// SiteStatus
// ---------------------------------------------------------------------------

/// Derived presence of a vehicle on site. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    OnSite,
    OffSite,
}

impl SiteStatus {
    /// Status implied by the latest movement of a vehicle, if any
    pub fn from_latest(latest: Option<MovementType>) -> Self {
        match latest {
            Some(MovementType::Entry) => SiteStatus::OnSite,
            Some(MovementType::Exit) | None => SiteStatus::OffSite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [VisitStatus; 6] = [
        VisitStatus::Pending,
        VisitStatus::Approved,
        VisitStatus::Rejected,
        VisitStatus::CheckedIn,
        VisitStatus::CheckedOut,
        VisitStatus::Expired,
    ];

    #[test]
    fn test_visit_graph_has_exactly_four_edges() {
        let edges: Vec<(VisitStatus, VisitStatus)> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(
            edges,
            vec![
                (VisitStatus::Pending, VisitStatus::Approved),
                (VisitStatus::Pending, VisitStatus::Rejected),
                (VisitStatus::Approved, VisitStatus::CheckedIn),
                (VisitStatus::CheckedIn, VisitStatus::CheckedOut),
            ]
        );
    }

    #[test]
    fn test_nothing_reaches_expired() {
        assert!(ALL.iter().all(|s| !s.can_transition_to(VisitStatus::Expired)));
    }

    #[test]
    fn test_status_text_round_trip() {
        assert_eq!("checked_in".parse::<VisitStatus>(), Ok(VisitStatus::CheckedIn));
        assert_eq!(VisitStatus::CheckedOut.as_str(), "checked_out");
        assert_eq!(" Entry ".parse::<MovementType>(), Ok(MovementType::Entry));
        assert!("parked".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_site_status_from_latest() {
        assert_eq!(SiteStatus::from_latest(None), SiteStatus::OffSite);
        assert_eq!(SiteStatus::from_latest(Some(MovementType::Entry)), SiteStatus::OnSite);
        assert_eq!(SiteStatus::from_latest(Some(MovementType::Exit)), SiteStatus::OffSite);
    }
}
