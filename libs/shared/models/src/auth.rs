use serde::{Deserialize, Serialize};

/// Payload of the bearer token issued at login.
///
/// The client never holds the signing secret, so these claims are only
/// read for housekeeping (expiry, subject) and never trusted for access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub email: Option<String>,
    pub role: Option<String>,
}
