use reqwest::Method;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::ApiClient;
use shared_models::error::AppError;
use shared_utils::de::parse_date;
use shared_utils::normalize::extract_object;
use shared_utils::time::is_valid_time;

use crate::models::{Appointment, BookingForm, CreateAppointmentRequest};

pub struct AppointmentBookingService {
    api: ApiClient,
    default_dial_code: String,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: ApiClient::new(config),
            default_dial_code: config.default_dial_code.clone(),
        }
    }

    /// Check the form and build the request body. Nothing is sent when a
    /// required field is blank or malformed.
    pub fn validate(&self, form: &BookingForm) -> Result<CreateAppointmentRequest, AppError> {
        let patient_name = form.patient_name.trim();
        if patient_name.is_empty() {
            return Err(AppError::ValidationError("Please enter the patient name".to_string()));
        }

        let local_digits: String = form.local_phone.chars().filter(char::is_ascii_digit).collect();
        if local_digits.is_empty() {
            return Err(AppError::ValidationError("Please enter a phone number".to_string()));
        }

        let appointment_date = parse_date(&form.appointment_date)
            .ok_or_else(|| AppError::ValidationError("Please choose an appointment date".to_string()))?;

        let appointment_time = form.appointment_time.trim();
        if !is_valid_time(appointment_time) {
            return Err(AppError::ValidationError("Please choose an appointment time".to_string()));
        }

        if form.doctor_id.trim().is_empty() {
            return Err(AppError::ValidationError("No doctor selected".to_string()));
        }

        let dial_code = form
            .dial_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(self.default_dial_code.as_str());

        Ok(CreateAppointmentRequest {
            doctor_id: form.doctor_id.trim().to_string(),
            patient_name: patient_name.to_string(),
            phone_number: compose_phone_number(dial_code, &local_digits),
            appointment_date,
            appointment_time: appointment_time.to_string(),
            notes: form
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_string),
        })
    }

    /// Book an appointment from the patient booking form
    pub async fn create(&self, form: &BookingForm, auth_token: Option<&str>) -> Result<Appointment, AppError> {
        let request = self.validate(form)?;
        debug!(
            "Booking appointment with doctor {} on {} at {}",
            request.doctor_id, request.appointment_date, request.appointment_time
        );

        let body = serde_json::to_value(&request).map_err(|e| AppError::Internal(e.to_string()))?;
        let response = self
            .api
            .request_value(Method::POST, "/appointments", auth_token, Some(body))
            .await?;

        let raw = extract_object(&response, &["appointment", "data", "data.appointment"])
            .ok_or_else(|| AppError::InvalidResponse("Appointment missing from response".to_string()))?;
        let appointment: Appointment =
            serde_json::from_value(raw).map_err(|e| AppError::InvalidResponse(e.to_string()))?;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }
}

/// `"+964"` and `"0770-123 4567"` give `"+96407701234567"`.
pub fn compose_phone_number(dial_code: &str, local_number: &str) -> String {
    let digits: String = local_number.chars().filter(char::is_ascii_digit).collect();
    format!("{}{}", dial_code.trim(), digits)
}
