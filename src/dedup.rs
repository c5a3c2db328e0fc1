//! Trip identity reconciliation.
//!
//! The source data has two distinct duplication problems: true duplicate
//! rows (same trip exported twice), and unrelated trips that happen to share
//! a trip id. The first kind is dropped; the second kind keeps both trips
//! and rewrites the later ids deterministically, so repeated runs on the
//! same input always produce the same identifiers.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::{CallType, Result, TripCleanError, TripRecord};

/// Remove exact duplicates and reconcile colliding trip ids.
///
/// Both passes are stable with respect to `source_index` (the ingest order
/// attached to every record), which defines "first occurrence":
///
/// 1. Records identical in content (same taxi, call type, start, missing
///    flag and polyline, whatever their trip ids) are one trip exported
///    more than once; only the first occurrence survives.
/// 2. Among survivors sharing a trip id, the first keeps it; occurrence `k`
///    is rewritten to `trip_id + k * offset`. The rewrite is a pure function
///    of the original id and the occurrence index. Same id with different
///    content is two real trips, so both are retained.
///
/// Idempotent: running the output through again changes nothing.
///
/// # Errors
///
/// [`TripCleanError::IdentitySpaceExhausted`] if a rewritten id overflows
/// `u64` or lands on an id already present in the batch (original or
/// rewritten). Nothing is silently re-collided.
pub fn deduplicate_trips(records: Vec<TripRecord>, offset: u64) -> Result<Vec<TripRecord>> {
    let survivors = drop_exact_duplicates(records);
    reconcile_collisions(survivors, offset)
}

/// Content identity for the exact-duplicate pass: every field except the
/// trip id. Coordinates are keyed by bit pattern, so only byte-identical
/// polylines collapse.
type ContentKey = (u32, CallType, i64, bool, Vec<(u64, u64)>);

fn content_key(record: &TripRecord) -> ContentKey {
    (
        record.taxi_id,
        record.call_type,
        record.start_timestamp,
        record.missing_data,
        record
            .points
            .iter()
            .map(|p| (p.longitude.to_bits(), p.latitude.to_bits()))
            .collect(),
    )
}

/// Keep the first of each set of records with identical content.
fn drop_exact_duplicates(records: Vec<TripRecord>) -> Vec<TripRecord> {
    let mut seen: HashSet<ContentKey> = HashSet::new();
    let before = records.len();

    let survivors: Vec<TripRecord> = records
        .into_iter()
        .filter(|record| seen.insert(content_key(record)))
        .collect();

    let dropped = before - survivors.len();
    if dropped > 0 {
        debug!("dropped {dropped} exact duplicate trips out of {before}");
    }

    survivors
}

/// Rewrite the ids of later occurrences within each colliding id group.
fn reconcile_collisions(records: Vec<TripRecord>, offset: u64) -> Result<Vec<TripRecord>> {
    // Every id present before rewriting; rewritten ids must avoid all of
    // them as well as each other.
    let mut taken: HashSet<u64> = records.iter().map(|r| r.trip_id).collect();
    let mut occurrences: HashMap<u64, u64> = HashMap::new();

    let mut reconciled = Vec::with_capacity(records.len());
    for mut record in records {
        let original_id = record.trip_id;
        let occurrence = occurrences.entry(original_id).or_insert(0);

        if *occurrence > 0 {
            let new_id = offset
                .checked_mul(*occurrence)
                .and_then(|shift| original_id.checked_add(shift))
                .ok_or(TripCleanError::IdentitySpaceExhausted {
                    trip_id: original_id,
                    occurrence: *occurrence,
                    offset,
                })?;

            if !taken.insert(new_id) {
                return Err(TripCleanError::IdentitySpaceExhausted {
                    trip_id: original_id,
                    occurrence: *occurrence,
                    offset,
                });
            }

            warn!(
                "trip id {original_id} collides (occurrence {occurrence}), \
                 rewritten to {new_id}"
            );
            record.trip_id = new_id;
        }

        *occurrence += 1;
        reconciled.push(record);
    }

    Ok(reconciled)
}
