use crate::error::{AttendanceError, AttendanceResult};
use crate::model::policy::GeoFence;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Rejects non-finite or out-of-range coordinates.
pub fn validate_coordinate(lat: f64, lng: f64) -> AttendanceResult<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AttendanceError::validation(format!(
            "latitude {lat} is outside [-90, 90]"
        )));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(AttendanceError::validation(format!(
            "longitude {lng} is outside [-180, 180]"
        )));
    }
    Ok(())
}

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> AttendanceResult<f64> {
    validate_coordinate(lat1, lng1)?;
    validate_coordinate(lat2, lng2)?;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // clamp guards against a > 1 from float error on antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    Ok(EARTH_RADIUS_METERS * c)
}

/// True iff the observed point lies within `radius_m` of the reference point.
pub fn is_within_geofence(
    ref_lat: f64,
    ref_lng: f64,
    radius_m: f64,
    obs_lat: f64,
    obs_lng: f64,
) -> AttendanceResult<bool> {
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(AttendanceError::validation(format!(
            "geofence radius {radius_m} must be a non-negative number of meters"
        )));
    }
    let distance = haversine_distance_m(ref_lat, ref_lng, obs_lat, obs_lng)?;
    Ok(distance <= radius_m)
}

impl GeoFence {
    pub fn contains(&self, lat: f64, lng: f64) -> AttendanceResult<bool> {
        is_within_geofence(self.latitude, self.longitude, self.radius_meters, lat, lng)
    }
}
