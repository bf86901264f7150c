use chrono::{Duration, NaiveDate};
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::ApiClient;
use shared_models::error::AppError;
use shared_utils::normalize::extract_list;
use shared_utils::time::TimeSlot;

use crate::models::DaySlots;

/// Patients can book from tomorrow up to a week ahead.
pub const BOOKING_WINDOW_DAYS: i64 = 7;

/// The dates offered to a patient, `today + 1 ..= today + 7`, ascending.
pub fn candidate_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (1..=BOOKING_WINDOW_DAYS)
        .map(|offset| today + Duration::days(offset))
        .collect()
}

pub struct AvailabilityService {
    api: ApiClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: ApiClient::new(config),
        }
    }

    /// Bookable slots for `date`, taken verbatim from the backend.
    pub async fn list_available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<DaySlots, AppError> {
        debug!("Fetching available slots for doctor {} on {}", doctor_id, date);

        if !candidate_dates(today).contains(&date) {
            return Err(AppError::ValidationError(format!(
                "{} is outside the booking window",
                date.format("%Y-%m-%d")
            )));
        }

        let path = format!("/doctors/{}/available-slots", urlencoding::encode(doctor_id));
        let body = self
            .api
            .get_with_query(&path, &[("date", date.format("%Y-%m-%d").to_string())], None)
            .await?;

        let slots = extract_list(&body, &["slots", "data.slots", "data"])
            .unwrap_or_else(|| {
                debug!("Unrecognised slots payload: {}", body);
                Vec::new()
            })
            .iter()
            .filter_map(|slot| match slot {
                Value::String(time) => Some(TimeSlot::from_wire(time)),
                other => {
                    warn!("Ignoring non-string slot: {}", other);
                    None
                }
            })
            .collect();

        Ok(DaySlots { date, slots })
    }
}

/// Date and time picked in the booking flow.
///
/// Every call to [`select_date`](Self::select_date) drops the chosen time,
/// including re-selecting the date that is already selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingSelection {
    date: Option<NaiveDate>,
    time: Option<TimeSlot>,
}

impl BookingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<&TimeSlot> {
        self.time.as_ref()
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
        self.time = None;
    }

    pub fn select_time(&mut self, slot: TimeSlot) -> Result<(), AppError> {
        if self.date.is_none() {
            return Err(AppError::ValidationError("Please choose a date first".to_string()));
        }
        self.time = Some(slot);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.time.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_candidate_dates_start_tomorrow() {
        let today = date(2024, 12, 28);
        let dates = candidate_dates(today);

        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], date(2024, 12, 29));
        assert_eq!(dates[6], date(2025, 1, 4));
        assert!(!dates.contains(&today));
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_candidate_dates_for_a_whole_year() {
        let mut today = date(2024, 1, 1);
        for _ in 0..366 {
            let dates = candidate_dates(today);
            assert_eq!(dates.len(), 7);
            assert_eq!(dates[0], today.succ_opt().unwrap());
            assert!(dates.windows(2).all(|pair| pair[1] - pair[0] == Duration::days(1)));
            today = today.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_select_date_always_clears_time() {
        let mut selection = BookingSelection::new();
        let day = date(2024, 3, 10);

        selection.select_date(day);
        selection.select_time(TimeSlot::from_wire("10:00")).unwrap();
        assert!(selection.is_complete());

        selection.select_date(date(2024, 3, 11));
        assert!(selection.time().is_none());

        selection.select_time(TimeSlot::from_wire("11:30")).unwrap();
        selection.select_date(date(2024, 3, 11));
        assert!(selection.time().is_none());
        assert_eq!(selection.date(), Some(date(2024, 3, 11)));
    }

    #[test]
    fn test_select_time_requires_date() {
        let mut selection = BookingSelection::new();
        let result = selection.select_time(TimeSlot::from_wire("09:00"));

        assert_matches!(result, Err(AppError::ValidationError(_)));
        assert!(!selection.is_complete());
    }

    #[test]
    fn test_clear() {
        let mut selection = BookingSelection::new();
        selection.select_date(date(2024, 3, 10));
        selection.clear();
        assert_eq!(selection, BookingSelection::default());
    }
}
