pub mod availability;
pub mod doctor;
pub mod schedule;

pub use availability::{candidate_dates, AvailabilityService, BookingSelection, BOOKING_WINDOW_DAYS};
pub use doctor::DoctorService;
pub use schedule::ScheduleService;
