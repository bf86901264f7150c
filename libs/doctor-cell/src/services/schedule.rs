use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::ApiClient;
use shared_models::error::AppError;
use shared_utils::normalize::extract_list;
use shared_utils::time::normalize_wire_time;

use crate::models::{WeeklySchedule, WeeklyScheduleEntry};

pub struct ScheduleService {
    api: ApiClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: ApiClient::new(config),
        }
    }

    /// Weekly schedule with all seven weekdays present
    pub async fn get_schedule(&self, doctor_id: &str, auth_token: &str) -> Result<WeeklySchedule, AppError> {
        debug!("Fetching weekly schedule for doctor: {}", doctor_id);

        let path = schedule_path(doctor_id);
        let body = self
            .api
            .request_value(Method::GET, &path, Some(auth_token), None)
            .await?;

        let items = extract_list(&body, &["schedules", "data", "data.schedules"]).unwrap_or_else(|| {
            debug!("Schedule payload has no list, treating every day as inactive: {}", body);
            Vec::new()
        });

        let entries = items.into_iter().filter_map(|item| {
            match serde_json::from_value::<WeeklyScheduleEntry>(item) {
                Ok(mut entry) => {
                    entry.start_time = normalize_wire_time(&entry.start_time);
                    entry.end_time = normalize_wire_time(&entry.end_time);
                    Some(entry)
                }
                Err(e) => {
                    debug!("Skipping schedule entry: {}", e);
                    None
                }
            }
        });

        Ok(WeeklySchedule::from_entries(entries))
    }

    /// Rejects an active day whose times are missing or not `HH:MM`.
    pub fn validate_entry(entry: &WeeklyScheduleEntry) -> Result<(), AppError> {
        if !entry.is_active {
            return Ok(());
        }

        if !entry.has_valid_times() {
            return Err(AppError::ValidationError(format!(
                "Please enter valid start and end times (HH:MM) for {}",
                entry.day_of_week
            )));
        }

        if !entry.has_ordered_range() {
            warn!(
                "Schedule for {} ends before it starts ({} - {})",
                entry.day_of_week, entry.start_time, entry.end_time
            );
        }

        Ok(())
    }

    /// Save a single weekday and return the refreshed schedule
    pub async fn save_day(
        &self,
        doctor_id: &str,
        entry: WeeklyScheduleEntry,
        auth_token: &str,
    ) -> Result<WeeklySchedule, AppError> {
        debug!("Saving {} schedule for doctor: {}", entry.day_of_week, doctor_id);

        Self::validate_entry(&entry)?;

        self.put_schedules(doctor_id, vec![entry], auth_token).await?;
        self.get_schedule(doctor_id, auth_token).await
    }

    /// Toggle a weekday on or off.
    ///
    /// Turning a day off is saved as-is even when its times are invalid;
    /// turning it on goes through the same validation as [`save_day`](Self::save_day).
    pub async fn set_day_active(
        &self,
        doctor_id: &str,
        mut entry: WeeklyScheduleEntry,
        active: bool,
        auth_token: &str,
    ) -> Result<WeeklySchedule, AppError> {
        entry.is_active = active;

        if active {
            return self.save_day(doctor_id, entry, auth_token).await;
        }

        info!("Deactivating {} for doctor {}", entry.day_of_week, doctor_id);
        self.put_schedules(doctor_id, vec![entry], auth_token).await?;
        self.get_schedule(doctor_id, auth_token).await
    }

    /// Save every weekday that carries valid times; the rest are left out
    /// of the request.
    pub async fn save_all(
        &self,
        doctor_id: &str,
        entries: &[WeeklyScheduleEntry],
        auth_token: &str,
    ) -> Result<WeeklySchedule, AppError> {
        debug!("Saving full weekly schedule for doctor: {}", doctor_id);

        let (valid, skipped): (Vec<WeeklyScheduleEntry>, Vec<WeeklyScheduleEntry>) =
            entries.iter().cloned().partition(|entry| entry.has_valid_times());

        if valid.is_empty() {
            return Err(AppError::ValidationError(
                "No day has valid working hours to save".to_string(),
            ));
        }

        if !skipped.is_empty() {
            let days: Vec<&str> = skipped.iter().map(|entry| entry.day_of_week.as_str()).collect();
            info!("Skipping days without valid times: {}", days.join(", "));
        }

        self.put_schedules(doctor_id, valid, auth_token).await?;
        self.get_schedule(doctor_id, auth_token).await
    }

    async fn put_schedules(
        &self,
        doctor_id: &str,
        schedules: Vec<WeeklyScheduleEntry>,
        auth_token: &str,
    ) -> Result<(), AppError> {
        let path = schedule_path(doctor_id);
        self.api
            .request_value(
                Method::PUT,
                &path,
                Some(auth_token),
                Some(json!({ "schedules": schedules })),
            )
            .await?;
        Ok(())
    }
}

fn schedule_path(doctor_id: &str) -> String {
    format!("/doctors/{}/schedule", urlencoding::encode(doctor_id))
}
