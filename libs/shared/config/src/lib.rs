use std::env;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_seconds: u64,
    pub offline_cache_dir: PathBuf,
    pub approval_poll_interval_seconds: u64,
    pub default_dial_code: String,
    pub session_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("API_BASE_URL not set, using empty value");
                    String::new()
                }),
            request_timeout_seconds: parse_u64("API_TIMEOUT_SECONDS", 30),
            offline_cache_dir: env::var("OFFLINE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("OFFLINE_CACHE_DIR not set, using default");
                    PathBuf::from(".cache/doctor-booking")
                }),
            approval_poll_interval_seconds: parse_u64("APPROVAL_POLL_INTERVAL_SECONDS", 10),
            default_dial_code: env::var("DEFAULT_DIAL_CODE")
                .unwrap_or_else(|_| {
                    warn!("DEFAULT_DIAL_CODE not set, using default");
                    "+964".to_string()
                }),
            session_token: env::var("SESSION_TOKEN").ok().filter(|t| !t.trim().is_empty()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }

    pub fn has_session_token(&self) -> bool {
        self.session_token.is_some()
    }
}

fn parse_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} is not a valid number ({}), using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
