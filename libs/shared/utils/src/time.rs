use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const AM_MARKER: &str = "ص";
pub const PM_MARKER: &str = "م";

fn time_regex() -> &'static Regex {
    static TIME_RE: OnceLock<Regex> = OnceLock::new();
    TIME_RE.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid time regex"))
}

/// Strict 24-hour `HH:MM` check.
pub fn is_valid_time(value: &str) -> bool {
    time_regex().is_match(value.trim())
}

/// A bookable time in both wire and display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub original: String,
    pub display: String,
}

impl TimeSlot {
    pub fn from_wire(time24: &str) -> Self {
        Self {
            original: time24.to_string(),
            display: to_12_hour(time24),
        }
    }
}

/// Drops a `:SS` suffix so schedule times compare as `HH:MM`.
pub fn normalize_wire_time(value: &str) -> String {
    let trimmed = value.trim();
    match split_24_hour(trimmed) {
        Some((hour, minute)) => format!("{:02}:{}", hour, minute),
        None => trimmed.to_string(),
    }
}

/// `"13:15"` -> `"1:15 م"`. Anything unparseable comes back unchanged.
pub fn to_12_hour(time24: &str) -> String {
    match split_24_hour(time24) {
        Some((hour, minute)) => {
            let marker = if hour < 12 { AM_MARKER } else { PM_MARKER };
            let hour12 = match hour % 12 {
                0 => 12,
                h => h,
            };
            format!("{}:{} {}", hour12, minute, marker)
        }
        None => time24.to_string(),
    }
}

/// `(1, "15", false)` -> `"13:15"`.
pub fn to_24_hour(hour12: u32, minute: &str, is_am: bool) -> String {
    let mut hour = hour12 % 12;
    if !is_am {
        hour += 12;
    }
    format!("{:02}:{:0>2}", hour, minute.trim())
}

/// Splits a display string produced by [`to_12_hour`] back into
/// `(hour12, minute, is_am)`.
pub fn parse_12_hour(display: &str) -> Option<(u32, String, bool)> {
    let (clock, marker) = display.trim().split_once(' ')?;
    let is_am = match marker.trim() {
        AM_MARKER => true,
        PM_MARKER => false,
        _ => return None,
    };
    let (hour, minute) = clock.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    if !(1..=12).contains(&hour) || minute.len() != 2 || !minute.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((hour, minute.to_string(), is_am))
}

// Accepts `HH:MM` and `HH:MM:SS`, the latter being what some schedule
// endpoints echo back.
fn split_24_hour(value: &str) -> Option<(u32, &str)> {
    let mut parts = value.trim().split(':');
    let hour = parts.next()?;
    let minute = parts.next()?;
    if let Some(seconds) = parts.next() {
        if seconds.len() != 2 || seconds.parse::<u32>().ok()? > 59 {
            return None;
        }
    }
    if parts.next().is_some() {
        return None;
    }
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return None;
    }
    let hour: u32 = hour.parse().ok()?;
    let minute_value: u32 = minute.parse().ok()?;
    if hour > 23 || minute_value > 59 {
        return None;
    }
    Some((hour, minute))
}
