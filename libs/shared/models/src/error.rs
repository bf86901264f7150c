use serde_json::Value;
use thiserror::Error;

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please try again";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Backend error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Backend { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a backend error from a non-success response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| extract_backend_message(&value))
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && !trimmed.starts_with('{') && !trimmed.starts_with('<'))
                    .then(|| trimmed.to_string())
            });

        match status {
            401 | 403 => AppError::Auth(message.unwrap_or_else(|| "Unauthorized".to_string())),
            _ => AppError::Backend { status, message },
        }
    }

    /// Message shown to the user in an alert.
    ///
    /// Backend message first, then the transport error text, then the
    /// error's own display text, then a generic fallback.
    pub fn user_message(&self) -> String {
        let message = match self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::Backend { message, .. } => message.clone().unwrap_or_default(),
            AppError::Auth(msg) => msg.clone(),
            AppError::Network(msg) => msg.clone(),
            other => other.to_string(),
        };

        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::ValidationError(_))
    }

    /// True when the request never got an answer.
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    /// No usable answer from the API: transport failure or a gateway
    /// reporting the backend down. The offline cache covers these.
    pub fn is_unavailable(&self) -> bool {
        match self {
            AppError::Network(_) => true,
            AppError::Backend { status, .. } => matches!(*status, 502..=504),
            _ => false,
        }
    }
}

fn extract_backend_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("data").and_then(|d| d.get("message")),
        body.get("error").and_then(|e| e.get("message")),
        body.get("error"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
}
