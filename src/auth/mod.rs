use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::{Actor, Role};

/// Session claims carried in the bearer token. `student_id` is only present
/// for student accounts.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
    pub role: Role,
    #[serde(default)]
    pub permissions: HashSet<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        student_id: Option<Uuid>,
        role: Role,
        permissions: HashSet<String>,
        expiry_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self { user_id, student_id, role, permissions, exp, iat: now.timestamp() }
    }
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Actor {
            user_id: claims.user_id,
            student_id: claims.student_id,
            role: claims.role,
            permissions: claims.permissions,
        }
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(secret: &str, claims: &Claims) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}
