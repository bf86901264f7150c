use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::{ApiClient, CacheKey, Listing, OfflineCache};
use shared_models::error::AppError;
use shared_utils::normalize::{extract_list, extract_object, normalize_list, NamedItem};

use crate::models::{Doctor, UpdateDoctorRequest};

pub struct DoctorService {
    api: ApiClient,
    cache: OfflineCache,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: ApiClient::new(config),
            cache: OfflineCache::new(config),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Profile of the logged-in doctor
    pub async fn get_me(&self, auth_token: &str, categories: &[NamedItem]) -> Result<Doctor, AppError> {
        debug!("Fetching own doctor profile");

        let body = self
            .api
            .request_value(Method::GET, "/doctors/me", Some(auth_token), None)
            .await?;

        let raw = extract_object(&body, &["doctor", "data", "data.doctor"])
            .ok_or_else(|| AppError::InvalidResponse("Doctor profile missing from response".to_string()))?;

        Doctor::from_raw(&raw, categories)
    }

    /// Specialty categories in any of the shapes the backend serves
    pub async fn list_categories(&self) -> Result<Vec<NamedItem>, AppError> {
        debug!("Fetching doctor categories");

        let body = self
            .api
            .request_value(Method::GET, "/categories", None, None)
            .await?;

        Ok(normalize_list(&body))
    }

    /// Public doctor directory; served from the offline cache when the
    /// backend cannot be reached.
    pub async fn list_doctors(&self, categories: &[NamedItem]) -> Result<Listing<Doctor>, AppError> {
        debug!("Fetching doctor directory");

        let key = CacheKey::DoctorsList;
        let body = match self.api.request_value(Method::GET, "/doctors", None, None).await {
            Ok(body) => body,
            Err(e) if e.is_unavailable() => {
                warn!("Doctor directory unavailable, trying offline cache: {}", e);
                return self
                    .cache
                    .read::<Doctor>(&key)
                    .await
                    .map(Listing::from)
                    .ok_or(e);
            }
            Err(e) => return Err(e),
        };

        let doctors = parse_doctors(&body, categories);
        self.cache.store(&key, &doctors).await;

        Ok(Listing::from_network(doctors))
    }

    /// Update profile fields of the logged-in doctor
    pub async fn update_profile(
        &self,
        doctor_id: &str,
        request: UpdateDoctorRequest,
        auth_token: &str,
        categories: &[NamedItem],
    ) -> Result<Doctor, AppError> {
        debug!("Updating doctor profile: {}", doctor_id);

        if request.is_empty() {
            return Err(AppError::ValidationError("Nothing to update".to_string()));
        }
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(AppError::ValidationError("Name cannot be empty".to_string()));
            }
        }

        let body = serde_json::to_value(&request).map_err(|e| AppError::Internal(e.to_string()))?;
        let path = format!("/doctors/{}", urlencoding::encode(doctor_id));
        let response = self
            .api
            .request_value(Method::PUT, &path, Some(auth_token), Some(body))
            .await?;

        let raw = extract_object(&response, &["doctor", "data"])
            .ok_or_else(|| AppError::InvalidResponse("Updated profile missing from response".to_string()))?;

        Doctor::from_raw(&raw, categories)
    }
}

fn parse_doctors(body: &Value, categories: &[NamedItem]) -> Vec<Doctor> {
    let Some(items) = extract_list(body, &["doctors", "data", "data.doctors"]) else {
        debug!("Unrecognised doctor list payload: {}", body);
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|raw| match Doctor::from_raw(raw, categories) {
            Ok(doctor) => Some(doctor),
            Err(e) => {
                debug!("Skipping doctor entry: {}", e);
                None
            }
        })
        .collect()
}
