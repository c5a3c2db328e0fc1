//! Per-taxi trajectory assembly.
//!
//! Turns validated, deduplicated trips into ordered per-taxi sample streams.
//! Sample `i` of a trip is stamped `start_timestamp + i * interval`; the
//! sampling interval is a pipeline-wide configuration value (15 seconds in
//! the source dataset). Trips of one taxi may interleave in time, so the
//! combined stream is stably re-sorted by timestamp with ingest order and
//! in-trip position as the tie-break.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    LabelInterval, LabeledPoint, Result, Trajectory, TravelMode, TripRecord,
};

/// Timing fields derived from a trip's point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripTiming {
    pub trip_id: u64,
    pub point_count: usize,
    /// Trip start, epoch seconds.
    pub start_time: i64,
    /// `start_time + point_count * interval`, epoch seconds.
    pub end_time: i64,
    /// `point_count * interval`, seconds.
    pub duration_secs: i64,
}

impl TripTiming {
    /// Derive timing for one trip at the given sampling interval.
    pub fn from_record(record: &TripRecord, interval_secs: i64) -> Self {
        let duration_secs = record.points.len() as i64 * interval_secs;
        Self {
            trip_id: record.trip_id,
            point_count: record.points.len(),
            start_time: record.start_timestamp,
            end_time: record.start_timestamp + duration_secs,
            duration_secs,
        }
    }

    /// Duration in fractional minutes.
    pub fn duration_mins(&self) -> f64 {
        self.duration_secs as f64 / 60.0
    }

    /// Duration in fractional hours.
    pub fn duration_hours(&self) -> f64 {
        self.duration_secs as f64 / 3600.0
    }
}

/// Build label intervals from the trips themselves.
///
/// Each trip with at least one point contributes one interval spanning its
/// derived `[start_time, end_time]`, labeled by its call type. This mirrors
/// the per-taxi label files of the trip-log output format, where a taxi's
/// own trips are the source of its activity labels. Intervals come back in
/// the trips' ingest order, which downstream labeling relies on for its
/// last-match-wins tie-break.
pub fn intervals_from_trips(
    records: &[TripRecord],
    interval_secs: i64,
) -> Result<Vec<LabelInterval>> {
    let mut intervals = Vec::with_capacity(records.len());
    for record in records {
        if record.points.is_empty() {
            continue;
        }
        let timing = TripTiming::from_record(record, interval_secs);
        intervals.push(LabelInterval::new(
            timing.start_time,
            timing.end_time,
            record.call_type.travel_mode(),
        )?);
    }
    Ok(intervals)
}

// Sample plus its sort key: timestamp, ingest order, in-trip index.
type KeyedSample = (i64, usize, usize, LabeledPoint);

/// Assemble per-taxi trajectories from validated, deduplicated trips.
///
/// Records are grouped by taxi id, each trip's polyline is flattened into
/// timestamped samples, and the combined stream per taxi is stably sorted by
/// timestamp (ties keep ingest order, then in-trip order). Samples start out
/// labeled [`TravelMode::Unknown`]; labeling happens downstream. Trips with
/// zero points are skipped without failing the batch.
///
/// Trajectories come back ordered by taxi id, and every trajectory is
/// non-decreasing in timestamp.
pub fn assemble_trajectories(records: &[TripRecord], interval_secs: i64) -> Vec<Trajectory> {
    // BTreeMap gives a deterministic taxi order in the output.
    let mut taxis: BTreeMap<u32, Vec<KeyedSample>> = BTreeMap::new();

    let mut skipped = 0usize;
    for record in records {
        if record.points.is_empty() {
            skipped += 1;
            continue;
        }

        let samples = taxis.entry(record.taxi_id).or_default();
        for (i, point) in record.points.iter().enumerate() {
            let timestamp = record.start_timestamp + i as i64 * interval_secs;
            samples.push((
                timestamp,
                record.source_index,
                i,
                LabeledPoint {
                    point: *point,
                    timestamp,
                    mode: TravelMode::Unknown,
                },
            ));
        }
    }

    if skipped > 0 {
        debug!("skipped {skipped} zero-point trips during assembly");
    }

    taxis
        .into_iter()
        .map(|(taxi_id, mut samples)| {
            samples.sort_by_key(|&(timestamp, source_index, in_trip, _)| {
                (timestamp, source_index, in_trip)
            });
            Trajectory {
                taxi_id,
                points: samples.into_iter().map(|(_, _, _, sample)| sample).collect(),
            }
        })
        .collect()
}
