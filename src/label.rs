//! Interval-join labeling of GPS samples.
//!
//! Each sample is matched against a set of time-ranged labels for its taxi.
//! Label sets are not guaranteed disjoint, so overlaps need a tie-break: the
//! last containing interval in the labels' input order wins, the way a label
//! file read top to bottom lets each later line override earlier ones. Not
//! interchangeable with first-match or longest-interval policies.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{LabeledPoint, Result, Trajectory, TravelMode, TripCleanError};

/// A time range carrying a travel mode, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInterval {
    start_time: i64,
    end_time: i64,
    mode: TravelMode,
}

impl LabelInterval {
    /// Create an interval, enforcing `start_time <= end_time`.
    pub fn new(start_time: i64, end_time: i64, mode: TravelMode) -> Result<Self> {
        if start_time > end_time {
            return Err(TripCleanError::InvalidLabelInterval {
                start_time,
                end_time,
            });
        }
        Ok(Self {
            start_time,
            end_time,
            mode,
        })
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    /// Whether the timestamp falls within the interval. A sample exactly at
    /// the start or end is included.
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start_time && timestamp <= self.end_time
    }
}

/// The mode for one timestamp: the last containing interval wins.
fn mode_at(intervals: &[LabelInterval], timestamp: i64) -> TravelMode {
    intervals
        .iter()
        .rev()
        .find(|interval| interval.contains(timestamp))
        .map(|interval| interval.mode)
        .unwrap_or(TravelMode::Unknown)
}

/// Assign a travel mode to every sample of a trajectory.
///
/// `intervals` must be the label set for the same taxi, in original input
/// order; their load order is the tie-break for overlaps. Samples contained
/// by no interval are labeled [`TravelMode::Unknown`]; a taxi with zero
/// intervals gets an all-unknown trajectory.
///
/// # Example
/// ```
/// use tripclean::{assign_labels, GpsPoint, LabeledPoint, LabelInterval, Trajectory, TravelMode};
///
/// let trajectory = Trajectory {
///     taxi_id: 7,
///     points: vec![LabeledPoint {
///         point: GpsPoint::new(-8.61, 41.15),
///         timestamp: 7,
///         mode: TravelMode::Unknown,
///     }],
/// };
/// let intervals = vec![
///     LabelInterval::new(0, 10, TravelMode::TaxiCentral).unwrap(),
///     LabelInterval::new(5, 15, TravelMode::TaxiStand).unwrap(),
/// ];
///
/// let labeled = assign_labels(trajectory, &intervals);
/// assert_eq!(labeled.points[0].mode, TravelMode::TaxiStand); // last match wins
/// ```
pub fn assign_labels(trajectory: Trajectory, intervals: &[LabelInterval]) -> Trajectory {
    let points: Vec<LabeledPoint> = trajectory
        .points
        .into_iter()
        .map(|sample| LabeledPoint {
            mode: mode_at(intervals, sample.timestamp),
            ..sample
        })
        .collect();

    let unknown = points
        .iter()
        .filter(|p| p.mode == TravelMode::Unknown)
        .count();
    debug!(
        "taxi {}: labeled {} samples against {} intervals ({} unknown)",
        trajectory.taxi_id,
        points.len(),
        intervals.len(),
        unknown
    );

    Trajectory {
        taxi_id: trajectory.taxi_id,
        points,
    }
}
