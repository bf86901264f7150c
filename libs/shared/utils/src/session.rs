use chrono::{DateTime, Utc};
use tracing::{debug, info};

use shared_models::auth::JwtClaims;
use shared_models::error::AppError;

use crate::jwt::{decode_claims, expires_at};

/// Authenticated doctor session, created at login and consumed at logout.
///
/// Passed explicitly to the services that need a bearer token instead of
/// living in a global store.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    doctor_id: String,
    claims: Option<JwtClaims>,
}

impl Session {
    pub fn login(token: impl Into<String>, doctor_id: impl Into<String>) -> Result<Self, AppError> {
        let token = token.into().trim().to_string();
        let doctor_id = doctor_id.into().trim().to_string();

        if token.is_empty() {
            return Err(AppError::Auth("Missing session token".to_string()));
        }
        if doctor_id.is_empty() {
            return Err(AppError::Auth("Missing doctor id".to_string()));
        }

        // Opaque tokens are allowed; only JWTs carry an expiry we can read.
        let claims = match decode_claims(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Session token is not a readable JWT: {}", e);
                None
            }
        };

        info!("Session started for doctor {}", doctor_id);
        Ok(Self { token, doctor_id, claims })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    pub fn claims(&self) -> Option<&JwtClaims> {
        self.claims.as_ref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims.as_ref().and_then(expires_at)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|exp| exp <= now).unwrap_or(false)
    }

    pub fn logout(self) {
        info!("Session ended for doctor {}", self.doctor_id);
    }
}
