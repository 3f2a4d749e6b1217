pub mod attendance;
pub mod reports;

pub use attendance::{AttendanceService, Location};
