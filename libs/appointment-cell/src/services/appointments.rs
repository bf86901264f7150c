use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{ApiClient, CacheKey, Listing, OfflineCache};
use shared_models::error::AppError;
use shared_utils::normalize::extract_list;

use crate::models::{Appointment, AppointmentStatus};
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct AppointmentService {
    api: ApiClient,
    cache: OfflineCache,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: ApiClient::new(config),
            cache: OfflineCache::new(config),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// All appointments of a doctor. The last successful response is kept
    /// on disk and served when the backend is unreachable.
    pub async fn list_for_doctor(&self, doctor_id: &str, auth_token: &str) -> Result<Listing<Appointment>, AppError> {
        debug!("Fetching appointments for doctor: {}", doctor_id);

        let key = CacheKey::Appointments(doctor_id.to_string());
        let path = format!("/doctors/{}/appointments", urlencoding::encode(doctor_id));

        let body = match self
            .api
            .request_value(Method::GET, &path, Some(auth_token), None)
            .await
        {
            Ok(body) => body,
            Err(e) if e.is_unavailable() => {
                warn!("Appointments unavailable, trying offline cache: {}", e);
                return self
                    .cache
                    .read::<Appointment>(&key)
                    .await
                    .map(Listing::from)
                    .ok_or(e);
            }
            Err(e) => return Err(e),
        };

        let appointments = parse_appointments(&body);
        self.cache.store(&key, &appointments).await;

        Ok(Listing::from_network(appointments))
    }

    /// Move an appointment to `new_status` and return the refreshed list.
    pub async fn update_status(
        &self,
        doctor_id: &str,
        appointment: &Appointment,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Listing<Appointment>, AppError> {
        self.lifecycle
            .validate_status_transition(appointment.status, new_status)?;

        debug!("Updating appointment {} to {}", appointment.id, new_status);

        let path = format!("/appointments/{}/status", urlencoding::encode(&appointment.id));
        self.api
            .request_value(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "status": new_status })),
            )
            .await?;

        info!("Appointment {} is now {}", appointment.id, new_status);
        self.list_for_doctor(doctor_id, auth_token).await
    }

    pub async fn confirm(&self, doctor_id: &str, appointment: &Appointment, auth_token: &str) -> Result<Listing<Appointment>, AppError> {
        self.client_action(doctor_id, appointment, AppointmentStatus::Confirmed, auth_token).await
    }

    pub async fn cancel(&self, doctor_id: &str, appointment: &Appointment, auth_token: &str) -> Result<Listing<Appointment>, AppError> {
        self.client_action(doctor_id, appointment, AppointmentStatus::Cancelled, auth_token).await
    }

    async fn client_action(
        &self,
        doctor_id: &str,
        appointment: &Appointment,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Listing<Appointment>, AppError> {
        if !self.lifecycle.client_actions(appointment.status).contains(&new_status) {
            return Err(AppError::InvalidTransition {
                from: appointment.status.to_string(),
                to: new_status.to_string(),
            });
        }
        self.update_status(doctor_id, appointment, new_status, auth_token).await
    }
}

fn parse_appointments(body: &Value) -> Vec<Appointment> {
    let Some(items) = extract_list(body, &["data", "appointments", "data.appointments"]) else {
        debug!("Unrecognised appointments payload: {}", body);
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Appointment>(item) {
            Ok(appointment) => Some(appointment),
            Err(e) => {
                debug!("Skipping appointment entry: {}", e);
                None
            }
        })
        .collect()
}
