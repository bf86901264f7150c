pub mod appointments;
pub mod booking;
pub mod lifecycle;

pub use appointments::AppointmentService;
pub use booking::{compose_phone_number, AppointmentBookingService};
pub use lifecycle::AppointmentLifecycleService;
