//! Tests for lib.rs core types

use tripclean::{BoundingBox, CallType, CleanConfig, GpsPoint, TravelMode, TripCleanError};

#[test]
fn test_gps_point_finite() {
    assert!(GpsPoint::new(-8.61, 41.15).is_finite());
    assert!(!GpsPoint::new(f64::NAN, 41.15).is_finite());
    assert!(!GpsPoint::new(-8.61, f64::INFINITY).is_finite());
}

#[test]
fn test_bounding_box_contains_edges() {
    let bbox = BoundingBox::new(-8.7, -8.5, 41.0, 41.3).unwrap();
    assert!(bbox.contains(&GpsPoint::new(-8.7, 41.0)));
    assert!(bbox.contains(&GpsPoint::new(-8.5, 41.3)));
    assert!(bbox.contains(&GpsPoint::new(-8.6, 41.15)));
    assert!(!bbox.contains(&GpsPoint::new(-8.71, 41.15)));
    assert!(!bbox.contains(&GpsPoint::new(-8.6, 41.31)));
}

#[test]
fn test_bounding_box_rejects_inverted_axes() {
    assert!(matches!(
        BoundingBox::new(-8.5, -8.7, 41.0, 41.3),
        Err(TripCleanError::InvalidBounds { .. })
    ));
    assert!(matches!(
        BoundingBox::new(-8.7, -8.5, 41.3, 41.0),
        Err(TripCleanError::InvalidBounds { .. })
    ));
}

#[test]
fn test_call_type_travel_modes() {
    assert_eq!(CallType::Central.travel_mode(), TravelMode::TaxiCentral);
    assert_eq!(CallType::Stand.travel_mode(), TravelMode::TaxiStand);
    assert_eq!(CallType::Street.travel_mode(), TravelMode::TaxiStreet);
}

#[test]
fn test_default_config_is_valid() {
    let config = CleanConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.min_polyline_points, 8);
    assert_eq!(config.max_polyline_points, 480);
    assert_eq!(config.sampling_interval_secs, 15);
}

#[test]
fn test_validation_slice_mirrors_config() {
    let config = CleanConfig::default();
    let validation = config.validation();
    assert_eq!(validation.min_points, config.min_polyline_points);
    assert_eq!(validation.max_points, config.max_polyline_points);
    assert_eq!(validation.bounding_box, config.bounding_box);
}
