//! # Trip Cleaner
//!
//! Cleaning, deduplication and temporal labeling for taxi-trip GPS
//! trajectories sampled at a fixed interval.
//!
//! This library provides:
//! - Priority-ordered polyline validation against length and geofence bounds
//! - Deterministic reconciliation of colliding trip identifiers
//! - Per-taxi trajectory assembly with derived sample timestamps
//! - Interval-join labeling of GPS samples against time-ranged activity labels
//! - Bounding-box derivation from a center point and radius
//!
//! ## Features
//!
//! - **`parallel`** - Enable sharded batch validation with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use tripclean::{CleanConfig, RawPolyline, RawTripRecord, CallType, run_pipeline};
//!
//! let records = vec![RawTripRecord {
//!     trip_id: 1372636858620000589,
//!     taxi_id: 20000589,
//!     call_type: CallType::Street,
//!     start_timestamp: 1372636858,
//!     missing_data: false,
//!     polyline: RawPolyline::Points(vec![
//!         (-8.618643, 41.141412),
//!         (-8.618499, 41.141376),
//!         (-8.618346, 41.141353),
//!         (-8.618300, 41.141340),
//!         (-8.618255, 41.141320),
//!         (-8.618211, 41.141300),
//!         (-8.618166, 41.141280),
//!         (-8.618122, 41.141260),
//!     ]),
//! }];
//!
//! let output = run_pipeline(&records, &CleanConfig::default()).unwrap();
//! assert_eq!(output.counts.valid, 1);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TripCleanError};

// Bounding-box derivation from center + radius
pub mod bounds;
pub use bounds::bounding_box_from_center;

// Priority-ordered polyline classification
pub mod validate;
pub use validate::{
    classify_polyline, ClassificationCounts, ValidationConfig, ValidationReason, ValidationResult,
};

// Trip identity reconciliation
pub mod dedup;
pub use dedup::deduplicate_trips;

// Per-taxi trajectory assembly
pub mod assemble;
pub use assemble::{assemble_trajectories, intervals_from_trips, TripTiming};

// Interval-join labeling
pub mod label;
pub use label::{assign_labels, LabelInterval};

// End-to-end batch pipeline
pub mod pipeline;
pub use pipeline::{run_pipeline, CleanOutput};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with longitude and latitude.
///
/// Stored in `(longitude, latitude)` order, matching the raw polyline
/// encoding of the source data.
///
/// # Example
/// ```
/// use tripclean::GpsPoint;
/// let point = GpsPoint::new(-8.61099, 41.14961); // Porto
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Check if both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

/// Rectangular geographic region used as a geofence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a bounding box, enforcing `min <= max` on both axes.
    pub fn new(min_lon: f64, max_lon: f64, min_lat: f64, max_lat: f64) -> Result<Self> {
        if !(min_lon <= max_lon && min_lat <= max_lat) {
            return Err(TripCleanError::InvalidBounds {
                min_lon,
                max_lon,
                min_lat,
                max_lat,
            });
        }
        Ok(Self {
            min_lon,
            max_lon,
            min_lat,
            max_lat,
        })
    }

    /// Whether a point lies inside the box (inclusive on all edges).
    pub fn contains(&self, point: &GpsPoint) -> bool {
        point.longitude >= self.min_lon
            && point.longitude <= self.max_lon
            && point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
    }

    /// Get the center point of the box.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

/// How a trip was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallType {
    /// Dispatched from the central (`A` in the source data).
    Central,
    /// Hailed at a taxi stand (`B`).
    Stand,
    /// Hailed on the street (`C`).
    Street,
}

impl CallType {
    /// The travel mode recorded for samples of a trip with this call type.
    pub fn travel_mode(&self) -> TravelMode {
        match self {
            CallType::Central => TravelMode::TaxiCentral,
            CallType::Stand => TravelMode::TaxiStand,
            CallType::Street => TravelMode::TaxiStreet,
        }
    }
}

/// Semantic activity label attached to a GPS sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TravelMode {
    TaxiCentral,
    TaxiStand,
    TaxiStreet,
    /// Sample fell outside every label interval.
    Unknown,
}

/// The polyline payload as handed over by the ingestion boundary.
///
/// The boundary may already have parsed the coordinate pairs, or it may pass
/// the raw JSON array text (`[[-8.6186,41.1414],...]`) straight through, in
/// which case parsing happens during classification and a parse failure is a
/// `Malformed` classification rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawPolyline {
    /// Already-parsed `(longitude, latitude)` pairs.
    Points(Vec<(f64, f64)>),
    /// Unparsed JSON array text from the source column.
    Text(String),
}

/// One raw input row from the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTripRecord {
    pub trip_id: u64,
    pub taxi_id: u32,
    pub call_type: CallType,
    /// Trip start, epoch seconds.
    pub start_timestamp: i64,
    pub missing_data: bool,
    pub polyline: RawPolyline,
}

/// A validated trip carried through deduplication and assembly.
///
/// `source_index` is the record's position in the original input batch. First
/// occurrence semantics and all stable orderings key off it, so correctness
/// never depends on container iteration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip_id: u64,
    pub taxi_id: u32,
    pub call_type: CallType,
    pub start_timestamp: i64,
    pub missing_data: bool,
    pub points: Vec<GpsPoint>,
    pub source_index: usize,
}

/// A GPS sample with its derived timestamp and assigned travel mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub point: GpsPoint,
    /// Epoch seconds, derived from the trip start and the sampling interval.
    pub timestamp: i64,
    pub mode: TravelMode,
}

/// Ordered sample stream for one taxi, non-decreasing by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub taxi_id: u32,
    pub points: Vec<LabeledPoint>,
}

/// Configuration for the cleaning pipeline.
///
/// All knobs are explicit parameters; nothing is read from globals. The
/// defaults describe the Porto dataset: 15-second sampling, trips between
/// 8 points (2 minutes) and 480 points (2 hours), and a geofence around the
/// metropolitan area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Minimum number of polyline points for a trip to be usable.
    pub min_polyline_points: usize,

    /// Maximum number of polyline points for a trip to be usable.
    pub max_polyline_points: usize,

    /// Geofence every sample must fall within.
    pub bounding_box: BoundingBox,

    /// Seconds between consecutive polyline samples.
    pub sampling_interval_secs: i64,

    /// Offset added (times the occurrence index) to rewrite colliding trip
    /// ids. Must exceed the spread of real ids in the dataset.
    pub id_collision_offset: u64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            min_polyline_points: 8,
            max_polyline_points: 480,
            // Porto metropolitan area
            bounding_box: BoundingBox {
                min_lon: -8.7,
                max_lon: -8.5,
                min_lat: 41.0,
                max_lat: 41.3,
            },
            sampling_interval_secs: 15,
            id_collision_offset: 1_000_000_000_000_000_000,
        }
    }
}

impl CleanConfig {
    /// Validate the configuration invariants.
    ///
    /// Checked once up front by the pipeline so a bad configuration fails the
    /// whole batch before any record is classified.
    pub fn validate(&self) -> Result<()> {
        if self.min_polyline_points > self.max_polyline_points {
            return Err(TripCleanError::InvalidPointRange {
                min_points: self.min_polyline_points,
                max_points: self.max_polyline_points,
            });
        }
        if self.sampling_interval_secs <= 0 {
            return Err(TripCleanError::InvalidSamplingInterval {
                interval_secs: self.sampling_interval_secs,
            });
        }
        Ok(())
    }

    /// The validation slice of the configuration.
    pub fn validation(&self) -> ValidationConfig {
        ValidationConfig {
            min_points: self.min_polyline_points,
            max_points: self.max_polyline_points,
            bounding_box: self.bounding_box,
        }
    }
}
