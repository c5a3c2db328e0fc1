//! End-to-end batch pipeline.
//!
//! Composes the stages over an in-memory batch handed in by the ingestion
//! boundary: classify polylines, reconcile identities, assemble per-taxi
//! trajectories, and attach labels. Per-record failures are counted and
//! dropped; only configuration violations and identity-space exhaustion
//! abort the batch, and the classification summary is produced either way.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    assemble::{assemble_trajectories, intervals_from_trips},
    dedup::deduplicate_trips,
    label::{assign_labels, LabelInterval},
    validate::{classify_points, parse_polyline, ClassificationCounts},
    CleanConfig, RawTripRecord, Result, Trajectory, TripRecord,
};

/// Everything the pipeline hands back to the persistence/reporting boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanOutput {
    /// Valid, reconciled trip records in ingest order.
    pub records: Vec<TripRecord>,
    /// Labeled per-taxi trajectories, ordered by taxi id.
    pub trajectories: Vec<Trajectory>,
    /// Per-reason classification summary over the whole input batch.
    pub counts: ClassificationCounts,
}

/// Run the full cleaning pipeline over one batch.
///
/// Stages, in order: polyline classification (invalid records counted and
/// dropped), exact-duplicate removal and id reconciliation, per-taxi
/// trajectory assembly, and interval-join labeling using label intervals
/// derived from each taxi's own trips.
///
/// # Errors
///
/// Configuration invariant violations and
/// [`crate::TripCleanError::IdentitySpaceExhausted`] abort the batch. A batch
/// where every record is classified invalid is not an error; it yields empty
/// outputs and a complete summary.
pub fn run_pipeline(records: &[RawTripRecord], config: &CleanConfig) -> Result<CleanOutput> {
    config.validate()?;
    let validation = config.validation();

    let mut counts = ClassificationCounts::default();
    let mut valid_records = Vec::new();

    for (source_index, raw) in records.iter().enumerate() {
        let points = parse_polyline(&raw.polyline);
        let result = classify_points(points.as_deref(), &validation);
        counts.record(result.reason);

        if result.valid {
            if let Some(points) = points {
                valid_records.push(TripRecord {
                    trip_id: raw.trip_id,
                    taxi_id: raw.taxi_id,
                    call_type: raw.call_type,
                    start_timestamp: raw.start_timestamp,
                    missing_data: raw.missing_data,
                    points,
                    source_index,
                });
            }
        }
    }

    debug!(
        "batch of {}: {} valid after classification",
        records.len(),
        valid_records.len()
    );

    let reconciled = deduplicate_trips(valid_records, config.id_collision_offset)?;
    let trajectories = label_trajectories(&reconciled, config)?;

    Ok(CleanOutput {
        records: reconciled,
        trajectories,
        counts,
    })
}

/// Assemble and label trajectories for the reconciled record set.
fn label_trajectories(records: &[TripRecord], config: &CleanConfig) -> Result<Vec<Trajectory>> {
    let intervals = intervals_by_taxi(records, config.sampling_interval_secs)?;

    Ok(assemble_trajectories(records, config.sampling_interval_secs)
        .into_iter()
        .map(|trajectory| {
            let taxi_intervals = intervals
                .get(&trajectory.taxi_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            assign_labels(trajectory, taxi_intervals)
        })
        .collect())
}

/// Build each taxi's label intervals from its own trips, in ingest order.
fn intervals_by_taxi(
    records: &[TripRecord],
    interval_secs: i64,
) -> Result<HashMap<u32, Vec<LabelInterval>>> {
    let mut by_taxi: HashMap<u32, Vec<TripRecord>> = HashMap::new();
    for record in records {
        by_taxi
            .entry(record.taxi_id)
            .or_default()
            .push(record.clone());
    }

    let mut intervals = HashMap::with_capacity(by_taxi.len());
    for (taxi_id, trips) in by_taxi {
        intervals.insert(taxi_id, intervals_from_trips(&trips, interval_secs)?);
    }
    Ok(intervals)
}

/// Run the pipeline with sharded classification and labeling.
///
/// Classification is fanned out across rayon workers with per-shard count
/// accumulators merged by summation; results are re-joined in ingest order,
/// so the output (records, trajectories, ids, counts) is identical to
/// [`run_pipeline`]. The deduplicator stays sequential: its first-occurrence
/// semantics observe the single global ingest order.
#[cfg(feature = "parallel")]
pub fn run_pipeline_parallel(
    records: &[RawTripRecord],
    config: &CleanConfig,
) -> Result<CleanOutput> {
    use rayon::prelude::*;

    config.validate()?;
    let validation = config.validation();

    // Classify in parallel, keeping the ingest index with every outcome.
    let classified: Vec<_> = records
        .par_iter()
        .enumerate()
        .map(|(source_index, raw)| {
            let points = parse_polyline(&raw.polyline);
            let result = classify_points(points.as_deref(), &validation);
            (source_index, raw, points, result)
        })
        .collect();

    let counts = classified
        .par_iter()
        .fold(
            ClassificationCounts::default,
            |mut counts, (_, _, _, result)| {
                counts.record(result.reason);
                counts
            },
        )
        .reduce(ClassificationCounts::default, |mut a, b| {
            a.merge(&b);
            a
        });

    // par_iter preserves index order on collect, so this is ingest order.
    let valid_records: Vec<TripRecord> = classified
        .into_iter()
        .filter(|(_, _, _, result)| result.valid)
        .filter_map(|(source_index, raw, points, _)| {
            points.map(|points| TripRecord {
                trip_id: raw.trip_id,
                taxi_id: raw.taxi_id,
                call_type: raw.call_type,
                start_timestamp: raw.start_timestamp,
                missing_data: raw.missing_data,
                points,
                source_index,
            })
        })
        .collect();

    let reconciled = deduplicate_trips(valid_records, config.id_collision_offset)?;
    let intervals = intervals_by_taxi(&reconciled, config.sampling_interval_secs)?;

    let trajectories: Vec<Trajectory> =
        assemble_trajectories(&reconciled, config.sampling_interval_secs)
            .into_par_iter()
            .map(|trajectory| {
                let taxi_intervals = intervals
                    .get(&trajectory.taxi_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                assign_labels(trajectory, taxi_intervals)
            })
            .collect();

    Ok(CleanOutput {
        records: reconciled,
        trajectories,
        counts,
    })
}
