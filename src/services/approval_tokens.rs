//! Host approval tokens carried by email links
//!
//! A token is an HS256 JWT naming the employee and a fingerprint of their
//! email address. It decodes straight to the employee id; verification then
//! checks the fingerprint against the directory, so changing the email or
//! rotating the secret invalidates every link issued before.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    config::ApprovalConfig,
    error::{AppError, AppResult},
    models::employee::Employee,
    repository::Repository,
};

const PURPOSE: &str = "visit_approval";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApprovalClaims {
    sub: Uuid,
    fpr: String,
    purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Hex SHA-256 of the lowercased, trimmed email
pub fn email_fingerprint(email: &str) -> String {
    hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()))
}

#[derive(Clone)]
pub struct ApprovalTokenService {
    repository: Repository,
    config: ApprovalConfig,
}

impl ApprovalTokenService {
    pub fn new(repository: Repository, config: ApprovalConfig) -> Self {
        Self { repository, config }
    }

    /// Sign the approval token of an employee
    pub fn sign(&self, employee: &Employee) -> AppResult<String> {
        sign_token(&self.config, employee.id, &employee.email)
    }

    /// Approve/reject links for the approval email
    pub fn links(&self, employee: &Employee) -> AppResult<(String, String)> {
        let token = self.sign(employee)?;
        let base = self.config.public_base_url.trim_end_matches('/');
        Ok((
            format!("{}/visit-approvals/{}?action=approve", base, token),
            format!("{}/visit-approvals/{}?action=reject", base, token),
        ))
    }

    /// Resolve a token to the active employee it was issued for
    pub async fn verify(&self, token: &str) -> AppResult<Employee> {
        let claims = decode_token(&self.config, token)?;

        let employee = match self.repository.employees.get_by_id(claims.sub).await {
            Ok(employee) => employee,
            Err(AppError::NotFound(_)) => return Err(invalid_link()),
            Err(e) => return Err(e),
        };

        if !employee.is_active || email_fingerprint(&employee.email) != claims.fpr {
            tracing::warn!(employee_id = %employee.id, "Approval link no longer matches the employee");
            return Err(invalid_link());
        }
        Ok(employee)
    }
}

fn invalid_link() -> AppError {
    AppError::NotFound("Invalid or expired approval link".to_string())
}

fn sign_token(config: &ApprovalConfig, employee_id: Uuid, email: &str) -> AppResult<String> {
    let exp = (config.token_ttl_hours > 0)
        .then(|| (Utc::now() + Duration::hours(config.token_ttl_hours as i64)).timestamp());
    let claims = ApprovalClaims {
        sub: employee_id,
        fpr: email_fingerprint(email),
        purpose: PURPOSE.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.token_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign approval token: {}", e)))
}

fn decode_token(config: &ApprovalConfig, token: &str) -> AppResult<ApprovalClaims> {
    let mut validation = Validation::default();
    if config.token_ttl_hours == 0 {
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
    }

    let claims = decode::<ApprovalClaims>(
        token,
        &DecodingKey::from_secret(config.token_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("Rejected approval token: {}", e);
        invalid_link()
    })?
    .claims;

    if claims.purpose != PURPOSE {
        return Err(invalid_link());
    }
    Ok(claims)
}
