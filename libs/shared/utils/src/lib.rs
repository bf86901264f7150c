pub mod de;
pub mod jwt;
pub mod normalize;
pub mod session;
pub mod test_utils;
pub mod time;

pub use normalize::{normalize_list, FieldResolver, NamedItem};
pub use session::Session;
pub use time::{to_12_hour, to_24_hour, TimeSlot};
