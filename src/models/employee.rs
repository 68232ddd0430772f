//! Employee directory entries and host references

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Employee record from the directory (read-only here)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub department: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// How the operator identified the host of a visit.
///
/// The front desk types whatever it knows: an email, the internal id, or
/// the person's display name. Parsing happens once, at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRef {
    Email(String),
    EmployeeId(Uuid),
    Name(String),
}

impl HostRef {
    /// Returns `None` for blank input
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(id) = Uuid::parse_str(trimmed) {
            return Some(HostRef::EmployeeId(id));
        }
        if trimmed.contains('@') {
            return Some(HostRef::Email(trimmed.to_lowercase()));
        }
        let name = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        Some(HostRef::Name(name))
    }
}

impl std::fmt::Display for HostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostRef::Email(email) => write!(f, "{}", email),
            HostRef::EmployeeId(id) => write!(f, "{}", id),
            HostRef::Name(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_ref() {
        assert_eq!(
            HostRef::parse("  Jane.Doe@Example.com "),
            Some(HostRef::Email("jane.doe@example.com".to_string()))
        );
        assert_eq!(
            HostRef::parse("Jane   Doe"),
            Some(HostRef::Name("Jane Doe".to_string()))
        );

        let id = Uuid::new_v4();
        assert_eq!(HostRef::parse(&id.to_string()), Some(HostRef::EmployeeId(id)));
        assert_eq!(HostRef::parse("   "), None);
    }
}
