use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use shared_models::auth::JwtClaims;
use shared_models::error::AppError;

/// Reads the claims segment of a bearer token without verifying the
/// signature; the backend remains the authority on validity.
pub fn decode_claims(token: &str) -> Result<JwtClaims, AppError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AppError::Auth("Invalid token format".to_string()));
    }

    let claims_json = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| AppError::Auth("Invalid claims encoding".to_string()))?;

    serde_json::from_str(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        AppError::Auth("Invalid claims format".to_string())
    })
}

pub fn expires_at(claims: &JwtClaims) -> Option<DateTime<Utc>> {
    claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
}
