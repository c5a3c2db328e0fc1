//! End-to-end tests for the cleaning pipeline

use tripclean::{
    run_pipeline, CallType, CleanConfig, RawPolyline, RawTripRecord, TravelMode, TripCleanError,
};

fn raw(trip_id: u64, taxi_id: u32, start: i64, polyline: RawPolyline) -> RawTripRecord {
    RawTripRecord {
        trip_id,
        taxi_id,
        call_type: CallType::Stand,
        start_timestamp: start,
        missing_data: false,
        polyline,
    }
}

fn inside(n: usize) -> RawPolyline {
    RawPolyline::Points((0..n).map(|i| (-8.61 + i as f64 * 1e-5, 41.15)).collect())
}

#[test]
fn test_end_to_end() {
    let records = vec![
        raw(1, 10, 1000, inside(10)),
        raw(2, 10, 2000, inside(5)), // too_short, dropped
        raw(3, 20, 3000, RawPolyline::Text("[[-8.61,41.15]".to_string())), // malformed
        raw(4, 20, 4000, inside(12)),
    ];

    let output = run_pipeline(&records, &CleanConfig::default()).unwrap();

    assert_eq!(output.counts.valid, 2);
    assert_eq!(output.counts.too_short, 1);
    assert_eq!(output.counts.malformed, 1);

    assert_eq!(output.records.len(), 2);
    assert_eq!(output.records[0].trip_id, 1);
    assert_eq!(output.records[1].trip_id, 4);

    assert_eq!(output.trajectories.len(), 2);
    assert_eq!(output.trajectories[0].taxi_id, 10);
    assert_eq!(output.trajectories[0].points.len(), 10);
    assert_eq!(output.trajectories[1].taxi_id, 20);
    assert_eq!(output.trajectories[1].points.len(), 12);
}

#[test]
fn test_samples_labeled_from_own_trips() {
    let mut record = raw(1, 10, 1000, inside(10));
    record.call_type = CallType::Central;

    let output = run_pipeline(&[record], &CleanConfig::default()).unwrap();
    assert!(output.trajectories[0]
        .points
        .iter()
        .all(|p| p.mode == TravelMode::TaxiCentral));
}

#[test]
fn test_colliding_ids_reconciled_and_both_retained() {
    // Identical except for the polylines, colliding on id 100
    let config = CleanConfig::default();
    let records = vec![
        raw(100, 10, 1000, inside(10)),
        raw(100, 10, 1000, inside(12)),
    ];

    let output = run_pipeline(&records, &config).unwrap();
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.records[0].trip_id, 100);
    assert_eq!(output.records[1].trip_id, 100 + config.id_collision_offset);
}

#[test]
fn test_text_and_parsed_polylines_equivalent() {
    let pairs: Vec<(f64, f64)> = (0..10).map(|i| (-8.61 + i as f64 * 1e-5, 41.15)).collect();
    let text = format!(
        "[{}]",
        pairs
            .iter()
            .map(|(lon, lat)| format!("[{lon},{lat}]"))
            .collect::<Vec<_>>()
            .join(",")
    );

    let from_points = run_pipeline(
        &[raw(1, 10, 1000, RawPolyline::Points(pairs))],
        &CleanConfig::default(),
    )
    .unwrap();
    let from_text = run_pipeline(
        &[raw(1, 10, 1000, RawPolyline::Text(text))],
        &CleanConfig::default(),
    )
    .unwrap();

    assert_eq!(from_points.records, from_text.records);
    assert_eq!(from_points.trajectories, from_text.trajectories);
}

#[test]
fn test_counts_produced_when_everything_drops() {
    let records = vec![
        raw(1, 10, 1000, inside(2)),
        raw(2, 10, 2000, RawPolyline::Points(vec![])),
    ];
    let output = run_pipeline(&records, &CleanConfig::default()).unwrap();

    assert!(output.records.is_empty());
    assert!(output.trajectories.is_empty());
    assert_eq!(output.counts.total(), 2);
    assert_eq!(output.counts.too_short, 1);
    assert_eq!(output.counts.empty, 1);
}

#[test]
fn test_empty_batch() {
    let output = run_pipeline(&[], &CleanConfig::default()).unwrap();
    assert!(output.records.is_empty());
    assert!(output.trajectories.is_empty());
    assert_eq!(output.counts.total(), 0);
}

#[test]
fn test_bad_config_fails_before_classification() {
    let config = CleanConfig {
        min_polyline_points: 100,
        max_polyline_points: 8,
        ..CleanConfig::default()
    };
    let result = run_pipeline(&[raw(1, 10, 1000, inside(10))], &config);
    assert!(matches!(
        result,
        Err(TripCleanError::InvalidPointRange { .. })
    ));
}

#[test]
fn test_bad_sampling_interval_rejected() {
    let config = CleanConfig {
        sampling_interval_secs: 0,
        ..CleanConfig::default()
    };
    let result = run_pipeline(&[], &config);
    assert!(matches!(
        result,
        Err(TripCleanError::InvalidSamplingInterval { .. })
    ));
}

#[test]
fn test_deterministic_across_runs() {
    let records: Vec<RawTripRecord> = (0..50u64)
        .map(|i| raw(100 + (i % 7), 10 + (i % 3) as u32, 1000 * i as i64, inside(10)))
        .collect();

    let config = CleanConfig::default();
    let a = run_pipeline(&records, &config).unwrap();
    let b = run_pipeline(&records, &config).unwrap();
    assert_eq!(a, b);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_pipeline_matches_sequential() {
    use tripclean::pipeline::run_pipeline_parallel;

    let records: Vec<RawTripRecord> = (0..200usize)
        .map(|i| {
            let polyline = match i % 4 {
                0 => inside(10 + (i % 20)),
                1 => inside(3),
                2 => RawPolyline::Text("oops".to_string()),
                _ => inside(15),
            };
            raw(100 + (i % 11) as u64, 10 + (i % 5) as u32, 1000 * i as i64, polyline)
        })
        .collect();

    let config = CleanConfig {
        id_collision_offset: 1_000_000_000_000,
        ..CleanConfig::default()
    };
    let sequential = run_pipeline(&records, &config).unwrap();
    let parallel = run_pipeline_parallel(&records, &config).unwrap();
    assert_eq!(sequential, parallel);
}
