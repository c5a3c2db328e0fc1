//! Bounding-box derivation from a center point and radius.
//!
//! Converts a radius in kilometers into degree offsets around a center:
//! latitude uses a fixed 111.32 km/degree, longitude shrinks with
//! `cos(latitude)` since meridians converge toward the poles.

use crate::{BoundingBox, GpsPoint, Result, TripCleanError};

/// Kilometers per degree of latitude.
const KM_PER_DEGREE_LAT: f64 = 111.32;

/// Derive a rectangular geofence centered on `center` with the given radius.
///
/// The box is symmetric around the center in degree space. Pure and
/// deterministic, so callers may compute it once per configuration and
/// share it read-only.
///
/// # Errors
///
/// Returns [`TripCleanError::InvalidRadius`] unless `radius_km` is positive
/// and finite.
///
/// # Example
/// ```
/// use tripclean::{bounding_box_from_center, GpsPoint};
///
/// let center = GpsPoint::new(-8.61099, 41.14961); // Porto
/// let bbox = bounding_box_from_center(&center, 30.0).unwrap();
/// assert!(bbox.contains(&center));
/// ```
pub fn bounding_box_from_center(center: &GpsPoint, radius_km: f64) -> Result<BoundingBox> {
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(TripCleanError::InvalidRadius { radius_km });
    }

    let lat_range = radius_km / KM_PER_DEGREE_LAT;

    // Longitude degrees per km depends on the latitude of the center.
    let lon_range = radius_km / (KM_PER_DEGREE_LAT * center.latitude.to_radians().cos());

    BoundingBox::new(
        center.longitude - lon_range,
        center.longitude + lon_range,
        center.latitude - lat_range,
        center.latitude + lat_range,
    )
}
