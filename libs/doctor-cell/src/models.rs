use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use shared_models::error::AppError;
use shared_utils::de::{parse_datetime, string_or_empty, value_to_id};
use shared_utils::normalize::{FieldResolver, NamedItem};
use shared_utils::time::{is_valid_time, TimeSlot};

pub const DEFAULT_APPOINTMENT_DURATION: u32 = 30;

const NAME_FIELDS: FieldResolver<'static> = FieldResolver::new(&["name", "full_name", "doctor_name", "user.name"]);
const PHONE_FIELDS: FieldResolver<'static> = FieldResolver::new(&[
    "phone",
    "phone_number",
    "mobile",
    "user.phone",
    "user.phone_number",
    "contact.phone",
]);
const AREA_FIELDS: FieldResolver<'static> = FieldResolver::new(&[
    "area",
    "area_name",
    "location",
    "clinic.area",
    "clinic.address",
    "address",
    "city",
]);
const EMAIL_FIELDS: FieldResolver<'static> = FieldResolver::new(&["email", "user.email", "contact.email"]);
const CATEGORY_NAME_FIELDS: FieldResolver<'static> =
    FieldResolver::new(&["category.name", "category_name", "specialty.name"]);
const CATEGORY_REF_FIELDS: FieldResolver<'static> =
    FieldResolver::new(&["category", "category_id", "specialty", "specialty_id"]);

// ==============================================================================
// DOCTOR
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: String,
    pub subscription: Option<DoctorSubscription>,
}

impl Doctor {
    /// Builds a doctor from whatever shape the backend returned, resolving
    /// the category reference against `categories`.
    pub fn from_raw(raw: &Value, categories: &[NamedItem]) -> Result<Self, AppError> {
        let id = raw
            .get("id")
            .and_then(value_to_id)
            .ok_or_else(|| AppError::InvalidResponse("Doctor payload has no id".to_string()))?;

        Ok(Self {
            id,
            name: NAME_FIELDS.resolve(raw).unwrap_or_default(),
            category: resolve_category(raw, categories),
            area: AREA_FIELDS.resolve(raw),
            phone: PHONE_FIELDS.resolve(raw),
            email: EMAIL_FIELDS.resolve(raw),
            status: raw
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            subscription: raw.get("subscription").and_then(DoctorSubscription::from_raw),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

fn resolve_category(raw: &Value, categories: &[NamedItem]) -> Option<String> {
    if let Some(name) = CATEGORY_NAME_FIELDS.resolve(raw) {
        return Some(name);
    }
    let reference = CATEGORY_REF_FIELDS.resolve(raw)?;
    categories
        .iter()
        .find(|category| category.id == reference)
        .map(|category| category.name.clone())
        .or(Some(reference))
}

/// Subscription reference embedded in the doctor profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSubscription {
    pub plan_id: Option<String>,
    pub plan_name: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl DoctorSubscription {
    fn from_raw(raw: &Value) -> Option<Self> {
        if !raw.is_object() {
            return None;
        }
        let date = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| raw.get(*key).and_then(Value::as_str))
                .find_map(parse_datetime)
        };

        Some(Self {
            plan_id: ["plan_id", "subscription_plan_id"]
                .iter()
                .find_map(|key| raw.get(*key).and_then(value_to_id)),
            plan_name: FieldResolver::new(&["plan_name", "plan.name", "name"]).resolve(raw),
            status: raw.get("status").and_then(Value::as_str).map(str::to_string),
            start_date: date(&["start_date", "starts_at"][..]),
            end_date: date(&["end_date", "expires_at", "ends_at"][..]),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl UpdateDoctorRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.area.is_none()
            && self.category_id.is_none()
            && self.bio.is_none()
    }
}

// ==============================================================================
// WEEKLY SCHEDULE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[serde(alias = "Sunday")]
    Sunday,
    #[serde(alias = "Monday")]
    Monday,
    #[serde(alias = "Tuesday")]
    Tuesday,
    #[serde(alias = "Wednesday")]
    Wednesday,
    #[serde(alias = "Thursday")]
    Thursday,
    #[serde(alias = "Friday")]
    Friday,
    #[serde(alias = "Saturday")]
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "sunday",
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.as_str() == lowered)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown weekday: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyScheduleEntry {
    pub day_of_week: DayOfWeek,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub start_time: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub end_time: String,
    #[serde(default = "default_appointment_duration", deserialize_with = "duration_or_default")]
    pub appointment_duration: u32,
    #[serde(default, deserialize_with = "minutes_or_zero")]
    pub break_duration: u32,
    #[serde(default, deserialize_with = "bool_or_false")]
    pub is_active: bool,
}

impl WeeklyScheduleEntry {
    /// Placeholder for a weekday the backend has no record for.
    pub fn inactive(day_of_week: DayOfWeek) -> Self {
        Self {
            day_of_week,
            start_time: String::new(),
            end_time: String::new(),
            appointment_duration: DEFAULT_APPOINTMENT_DURATION,
            break_duration: 0,
            is_active: false,
        }
    }

    pub fn has_valid_times(&self) -> bool {
        is_valid_time(&self.start_time) && is_valid_time(&self.end_time)
    }

    /// `HH:MM` strings compare lexicographically in time order.
    pub fn has_ordered_range(&self) -> bool {
        self.has_valid_times() && self.start_time.trim() < self.end_time.trim()
    }
}

/// Seven entries, one per weekday, Sunday first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySchedule {
    days: BTreeMap<DayOfWeek, WeeklyScheduleEntry>,
}

impl WeeklySchedule {
    /// Later entries for the same weekday replace earlier ones; weekdays
    /// without an entry are filled in as inactive.
    pub fn from_entries(entries: impl IntoIterator<Item = WeeklyScheduleEntry>) -> Self {
        let mut days: BTreeMap<DayOfWeek, WeeklyScheduleEntry> = DayOfWeek::ALL
            .into_iter()
            .map(|day| (day, WeeklyScheduleEntry::inactive(day)))
            .collect();

        for entry in entries {
            days.insert(entry.day_of_week, entry);
        }

        Self { days }
    }

    pub fn get(&self, day: DayOfWeek) -> &WeeklyScheduleEntry {
        // Every weekday is inserted by from_entries.
        &self.days[&day]
    }

    pub fn entries(&self) -> impl Iterator<Item = &WeeklyScheduleEntry> {
        self.days.values()
    }

    pub fn active_days(&self) -> Vec<DayOfWeek> {
        self.days
            .values()
            .filter(|entry| entry.is_active)
            .map(|entry| entry.day_of_week)
            .collect()
    }

    pub fn into_entries(self) -> Vec<WeeklyScheduleEntry> {
        self.days.into_values().collect()
    }
}

fn default_appointment_duration() -> u32 {
    DEFAULT_APPOINTMENT_DURATION
}

fn lenient_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn duration_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_u32(&value)
        .filter(|minutes| *minutes > 0)
        .unwrap_or(DEFAULT_APPOINTMENT_DURATION))
}

fn minutes_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_u32(&value).unwrap_or(0))
}

// Some endpoints store the flag as 0/1.
fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

// ==============================================================================
// SLOTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

impl DaySlots {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_doctor_from_raw_cascading_fields() {
        let categories = vec![NamedItem { id: "4".into(), name: "Dentistry".into() }];
        let raw = json!({
            "id": 12,
            "full_name": "Dr. Sara",
            "category_id": 4,
            "location": "",
            "clinic": {"address": "Mansour street"},
            "user": {"phone": "+9647801112222"},
            "status": "Active",
            "subscription": {"plan_id": 1, "end_date": "2024-02-01"}
        });

        let doctor = Doctor::from_raw(&raw, &categories).unwrap();
        assert_eq!(doctor.id, "12");
        assert_eq!(doctor.name, "Dr. Sara");
        assert_eq!(doctor.category.as_deref(), Some("Dentistry"));
        assert_eq!(doctor.area.as_deref(), Some("Mansour street"));
        assert_eq!(doctor.phone.as_deref(), Some("+9647801112222"));
        assert!(doctor.is_active());

        let subscription = doctor.subscription.unwrap();
        assert_eq!(subscription.plan_id.as_deref(), Some("1"));
        assert!(subscription.end_date.is_some());
    }

    #[test]
    fn test_category_falls_back_to_raw_reference() {
        let doctor = Doctor::from_raw(&json!({"id": "a", "category": "Pediatrics"}), &[]).unwrap();
        assert_eq!(doctor.category.as_deref(), Some("Pediatrics"));
        assert_eq!(doctor.status, "unknown");
        assert!(!doctor.is_active());
    }

    #[test]
    fn test_doctor_without_id_is_rejected() {
        assert!(Doctor::from_raw(&json!({"name": "x"}), &[]).is_err());
    }

    #[test]
    fn test_schedule_entry_lenient_fields() {
        let entry: WeeklyScheduleEntry = serde_json::from_value(json!({
            "day_of_week": "Monday",
            "start_time": null,
            "appointment_duration": "20",
            "is_active": 1
        }))
        .unwrap();

        assert_eq!(entry.day_of_week, DayOfWeek::Monday);
        assert_eq!(entry.start_time, "");
        assert_eq!(entry.appointment_duration, 20);
        assert_eq!(entry.break_duration, 0);
        assert!(entry.is_active);
        assert!(!entry.has_valid_times());
    }

    #[test]
    fn test_weekly_schedule_always_has_seven_days() {
        let mut monday = WeeklyScheduleEntry::inactive(DayOfWeek::Monday);
        monday.start_time = "09:00".into();
        monday.end_time = "13:00".into();
        monday.is_active = true;

        let schedule = WeeklySchedule::from_entries(vec![monday]);
        assert_eq!(schedule.entries().count(), 7);
        assert_eq!(schedule.active_days(), vec![DayOfWeek::Monday]);
        assert!(!schedule.get(DayOfWeek::Friday).is_active);
        assert_eq!(schedule.entries().next().unwrap().day_of_week, DayOfWeek::Sunday);
    }

    #[test]
    fn test_day_of_week_from_date_and_str() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(DayOfWeek::from_date(date), DayOfWeek::Sunday);
        assert_eq!("Thursday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Thursday);
        assert!("someday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_ordered_range() {
        let mut entry = WeeklyScheduleEntry::inactive(DayOfWeek::Sunday);
        entry.start_time = "17:00".into();
        entry.end_time = "09:00".into();
        assert!(entry.has_valid_times());
        assert!(!entry.has_ordered_range());
    }
}
