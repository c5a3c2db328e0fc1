//! Unified error handling for the cleaning pipeline.
//!
//! Per-record classification outcomes (`malformed`, `too_short`, ...) are
//! data, not errors; they live in [`crate::ValidationResult`]. The variants
//! here are the structural failures that abort a whole batch.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, TripCleanError>;

/// Structural failures that abort a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TripCleanError {
    /// Bounding-box radius must be a positive, finite number of kilometers.
    #[error("invalid radius {radius_km} km: radius must be positive and finite")]
    InvalidRadius { radius_km: f64 },

    /// Bounding box with min > max on an axis.
    #[error(
        "invalid bounds: lon [{min_lon}, {max_lon}], lat [{min_lat}, {max_lat}] \
         (min must not exceed max)"
    )]
    InvalidBounds {
        min_lon: f64,
        max_lon: f64,
        min_lat: f64,
        max_lat: f64,
    },

    /// min_polyline_points > max_polyline_points.
    #[error("invalid point range: min {min_points} exceeds max {max_points}")]
    InvalidPointRange {
        min_points: usize,
        max_points: usize,
    },

    /// Sampling interval must be a positive number of seconds.
    #[error("invalid sampling interval {interval_secs} s: must be positive")]
    InvalidSamplingInterval { interval_secs: i64 },

    /// A label interval with end before start.
    #[error("invalid label interval: start {start_time} after end {end_time}")]
    InvalidLabelInterval { start_time: i64, end_time: i64 },

    /// The collision offset cannot produce a unique id for this record.
    ///
    /// Either the rewritten id overflowed the id space, or it landed on an
    /// id already present in the batch.
    #[error(
        "identity space exhausted: trip id {trip_id} occurrence {occurrence} \
         cannot be rewritten with offset {offset}"
    )]
    IdentitySpaceExhausted {
        trip_id: u64,
        occurrence: u64,
        offset: u64,
    },
}
