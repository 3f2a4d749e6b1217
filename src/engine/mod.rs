//! Pure attendance calculations. Nothing here touches storage or the clock.

pub mod aggregator;
pub mod geofence;
pub mod performance;
pub mod shift;
pub mod work_hours;
