use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_models::error::AppError;
use shared_utils::de::{id_string, lenient_date, opt_id_string, string_or_empty};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub doctor_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub patient_name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub phone_number: String,
    #[serde(deserialize_with = "lenient_date")]
    pub appointment_date: NaiveDate,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub appointment_time: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown appointment status: {}", s)))
    }
}

// ==============================================================================
// BOOKING
// ==============================================================================

/// Raw input of the patient booking form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingForm {
    pub doctor_id: String,
    pub patient_name: String,
    /// Local number as typed; only its digits are kept.
    pub local_phone: String,
    /// Falls back to the configured default when absent.
    pub dial_code: Option<String>,
    pub appointment_date: String,
    pub appointment_time: String,
    pub notes: Option<String>,
}

/// Body of `POST /appointments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub doctor_id: String,
    pub patient_name: String,
    pub phone_number: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// FILTERING
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

/// Read-side appointment filter. Every set criterion must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub status: StatusFilter,
    pub date: Option<NaiveDate>,
    pub patient_query: Option<String>,
}

impl AppointmentFilter {
    /// The doctor dashboard opens on today's appointments.
    pub fn for_doctor_dashboard(today: NaiveDate) -> Self {
        Self {
            date: Some(today),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn with_patient_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.patient_query = if query.trim().is_empty() { None } else { Some(query) };
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => appointment.status == status,
        };
        let date_ok = self.date.map_or(true, |date| appointment.appointment_date == date);
        let patient_ok = self.patient_query.as_deref().map_or(true, |query| {
            appointment
                .patient_name
                .to_lowercase()
                .contains(&query.trim().to_lowercase())
        });

        status_ok && date_ok && patient_ok
    }

    pub fn apply(&self, appointments: &[Appointment]) -> Vec<Appointment> {
        appointments
            .iter()
            .filter(|appointment| self.matches(appointment))
            .cloned()
            .collect()
    }
}

// ==============================================================================
// STATS
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentStats {
    pub total_appointments: usize,
    pub pending_appointments: usize,
    pub confirmed_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    pub today_appointments: usize,
}

impl AppointmentStats {
    pub fn from_appointments(appointments: &[Appointment], today: NaiveDate) -> Self {
        let count = |status: AppointmentStatus| {
            appointments
                .iter()
                .filter(|appointment| appointment.status == status)
                .count()
        };

        Self {
            total_appointments: appointments.len(),
            pending_appointments: count(AppointmentStatus::Pending),
            confirmed_appointments: count(AppointmentStatus::Confirmed),
            completed_appointments: count(AppointmentStatus::Completed),
            cancelled_appointments: count(AppointmentStatus::Cancelled),
            today_appointments: appointments
                .iter()
                .filter(|appointment| appointment.appointment_date == today)
                .count(),
        }
    }
}
