//! Authenticated principal and role checks
//!
//! Tokens are issued by the upstream identity service; this server only
//! validates them and enforces the role requirements of each operation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Operator roles known to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Receptionist,
    Security,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Receptionist => "receptionist",
            Role::Security => "security",
            Role::Staff => "staff",
        }
    }
}

/// JWT claims for authenticated operators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    fn require_any(&self, roles: &[Role], what: &str) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Role {} is not allowed to {}",
                self.role.as_str(),
                what
            )))
        }
    }

    // Authorization checks

    pub fn require_approve_visits(&self) -> Result<(), AppError> {
        self.require_any(
            &[Role::Admin, Role::Receptionist, Role::Staff],
            "approve or reject visits",
        )
    }

    /// Reception confirmation is restricted to front desk staff
    pub fn require_reception(&self) -> Result<(), AppError> {
        self.require_any(&[Role::Admin, Role::Receptionist], "confirm visitors at reception")
    }

    pub fn require_manage_visits(&self) -> Result<(), AppError> {
        self.require_any(&[Role::Admin, Role::Receptionist], "delete visits")
    }

    pub fn require_record_movements(&self) -> Result<(), AppError> {
        self.require_any(&[Role::Admin, Role::Security], "record vehicle movements")
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}
