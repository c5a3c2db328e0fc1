//! Priority-ordered polyline classification.
//!
//! A polyline can violate several constraints at once; classification
//! statistics only stay comparable across runs if every caller resolves the
//! tie the same way. The order is therefore a first-class artifact: an
//! explicit rule list evaluated front to back, first match wins.
//!
//! Classification outcomes are data, not errors. Invalid records are counted
//! in a [`ClassificationCounts`] accumulator and dropped; the batch never
//! aborts over a bad polyline.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{BoundingBox, GpsPoint, RawPolyline};

/// Why a polyline was accepted or rejected.
///
/// Reasons are mutually exclusive; a record satisfying several invalidity
/// conditions gets the highest-priority one (see [`ValidationReason::PRIORITY`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    Valid,
    /// The polyline text failed to parse, or a coordinate was non-finite.
    Malformed,
    /// Parsed fine but contains zero points.
    Empty,
    /// Fewer points than the configured minimum.
    TooShort,
    /// More points than the configured maximum.
    TooLong,
    /// At least one point outside the geofence.
    OutOfBounds,
}

impl ValidationReason {
    /// Evaluation order for the invalidity reasons, highest priority first.
    /// `Valid` is what remains when none of these fire.
    pub const PRIORITY: [ValidationReason; 5] = [
        ValidationReason::Malformed,
        ValidationReason::Empty,
        ValidationReason::TooShort,
        ValidationReason::TooLong,
        ValidationReason::OutOfBounds,
    ];

    /// Stable snake_case name, matching the summary keys reported upstream.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::Valid => "valid",
            ValidationReason::Malformed => "malformed",
            ValidationReason::Empty => "empty",
            ValidationReason::TooShort => "too_short",
            ValidationReason::TooLong => "too_long",
            ValidationReason::OutOfBounds => "out_of_bounds",
        }
    }
}

/// Outcome of classifying one polyline.
///
/// Invariant: `valid == (reason == ValidationReason::Valid)`.
/// `point_count` is `None` only when the polyline never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: ValidationReason,
    pub point_count: Option<usize>,
}

impl ValidationResult {
    fn new(reason: ValidationReason, point_count: Option<usize>) -> Self {
        Self {
            valid: reason == ValidationReason::Valid,
            reason,
            point_count,
        }
    }
}

/// The slice of pipeline configuration the validator needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub min_points: usize,
    pub max_points: usize,
    pub bounding_box: BoundingBox,
}

/// Predicate for one invalidity rule, evaluated against parsed points.
pub type RulePredicate = fn(&[GpsPoint], &ValidationConfig) -> bool;

/// The ordered rule list applied to a successfully parsed polyline.
///
/// Evaluated front to back; the first predicate that fires decides the
/// reason. Parse failure is handled before this list (it has no points to
/// evaluate against) and holds the highest priority overall.
pub const CLASSIFICATION_RULES: [(ValidationReason, RulePredicate); 4] = [
    (ValidationReason::Empty, rule_empty),
    (ValidationReason::TooShort, rule_too_short),
    (ValidationReason::TooLong, rule_too_long),
    (ValidationReason::OutOfBounds, rule_out_of_bounds),
];

fn rule_empty(points: &[GpsPoint], _config: &ValidationConfig) -> bool {
    points.is_empty()
}

fn rule_too_short(points: &[GpsPoint], config: &ValidationConfig) -> bool {
    points.len() < config.min_points
}

fn rule_too_long(points: &[GpsPoint], config: &ValidationConfig) -> bool {
    points.len() > config.max_points
}

fn rule_out_of_bounds(points: &[GpsPoint], config: &ValidationConfig) -> bool {
    out_of_bounds_count(points, &config.bounding_box) > 0
}

/// Count the points falling outside the geofence.
///
/// Examines every point rather than stopping at the first violation, so the
/// caller always sees an accurate count alongside the classification.
pub fn out_of_bounds_count(points: &[GpsPoint], bbox: &BoundingBox) -> usize {
    points.iter().filter(|p| !bbox.contains(p)).count()
}

/// Parse a raw polyline payload into GPS points.
///
/// Returns `None` when the record is malformed: the JSON text fails to
/// parse, or any coordinate in an otherwise well-formed list is non-finite.
/// There is no partial acceptance; one bad token poisons the whole record.
pub fn parse_polyline(raw: &RawPolyline) -> Option<Vec<GpsPoint>> {
    let pairs: Vec<(f64, f64)> = match raw {
        RawPolyline::Points(pairs) => pairs.clone(),
        RawPolyline::Text(text) => {
            let parsed: Vec<[f64; 2]> = serde_json::from_str(text).ok()?;
            parsed.iter().map(|[lon, lat]| (*lon, *lat)).collect()
        }
    };

    let points: Vec<GpsPoint> = pairs
        .iter()
        .map(|&(lon, lat)| GpsPoint::new(lon, lat))
        .collect();

    if points.iter().any(|p| !p.is_finite()) {
        return None;
    }

    Some(points)
}

/// Classify already-parsed points (or a parse failure) against the config.
pub fn classify_points(points: Option<&[GpsPoint]>, config: &ValidationConfig) -> ValidationResult {
    let points = match points {
        Some(points) => points,
        None => return ValidationResult::new(ValidationReason::Malformed, None),
    };

    for (reason, predicate) in &CLASSIFICATION_RULES {
        if predicate(points, config) {
            return ValidationResult::new(*reason, Some(points.len()));
        }
    }

    ValidationResult::new(ValidationReason::Valid, Some(points.len()))
}

/// Classify one raw polyline against length and geofence constraints.
///
/// # Example
/// ```
/// use tripclean::{classify_polyline, CleanConfig, RawPolyline, ValidationReason};
///
/// let config = CleanConfig::default().validation();
/// let five_points = RawPolyline::Points(vec![(-8.61, 41.15); 5]);
///
/// let result = classify_polyline(&five_points, &config);
/// assert_eq!(result.reason, ValidationReason::TooShort);
/// assert_eq!(result.point_count, Some(5));
/// ```
pub fn classify_polyline(raw: &RawPolyline, config: &ValidationConfig) -> ValidationResult {
    classify_points(parse_polyline(raw).as_deref(), config)
}

/// Per-reason classification counters for one batch (or one shard).
///
/// Shards accumulate independently and are combined by plain summation at
/// merge time; there is no process-wide state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationCounts {
    pub valid: u64,
    pub malformed: u64,
    pub empty: u64,
    pub too_short: u64,
    pub too_long: u64,
    pub out_of_bounds: u64,
}

impl ClassificationCounts {
    /// Record one classification outcome.
    pub fn record(&mut self, reason: ValidationReason) {
        match reason {
            ValidationReason::Valid => self.valid += 1,
            ValidationReason::Malformed => self.malformed += 1,
            ValidationReason::Empty => self.empty += 1,
            ValidationReason::TooShort => self.too_short += 1,
            ValidationReason::TooLong => self.too_long += 1,
            ValidationReason::OutOfBounds => self.out_of_bounds += 1,
        }
    }

    /// Read the counter for one reason.
    pub fn get(&self, reason: ValidationReason) -> u64 {
        match reason {
            ValidationReason::Valid => self.valid,
            ValidationReason::Malformed => self.malformed,
            ValidationReason::Empty => self.empty,
            ValidationReason::TooShort => self.too_short,
            ValidationReason::TooLong => self.too_long,
            ValidationReason::OutOfBounds => self.out_of_bounds,
        }
    }

    /// Fold another shard's counters into this one.
    pub fn merge(&mut self, other: &ClassificationCounts) {
        self.valid += other.valid;
        self.malformed += other.malformed;
        self.empty += other.empty;
        self.too_short += other.too_short;
        self.too_long += other.too_long;
        self.out_of_bounds += other.out_of_bounds;
    }

    /// Total records classified.
    pub fn total(&self) -> u64 {
        self.valid + self.malformed + self.empty + self.too_short + self.too_long
            + self.out_of_bounds
    }

    /// Records that were classified as anything other than valid.
    pub fn dropped(&self) -> u64 {
        self.total() - self.valid
    }
}

/// Classify a batch of raw polylines, accumulating counts.
///
/// Returns one result per input, in input order, alongside the summary.
pub fn classify_batch(
    polylines: &[RawPolyline],
    config: &ValidationConfig,
) -> (Vec<ValidationResult>, ClassificationCounts) {
    let mut counts = ClassificationCounts::default();
    let results: Vec<ValidationResult> = polylines
        .iter()
        .map(|raw| {
            let result = classify_polyline(raw, config);
            counts.record(result.reason);
            result
        })
        .collect();

    debug!(
        "classified {} polylines: {} valid, {} dropped",
        counts.total(),
        counts.valid,
        counts.dropped()
    );

    (results, counts)
}

/// Classify a batch of raw polylines across rayon worker threads.
///
/// Each shard accumulates its own counts; shards are merged by summation and
/// results come back in input order, so output is identical to the
/// sequential [`classify_batch`].
#[cfg(feature = "parallel")]
pub fn classify_batch_parallel(
    polylines: &[RawPolyline],
    config: &ValidationConfig,
) -> (Vec<ValidationResult>, ClassificationCounts) {
    use rayon::prelude::*;

    let results: Vec<ValidationResult> = polylines
        .par_iter()
        .map(|raw| classify_polyline(raw, config))
        .collect();

    let counts = results
        .par_iter()
        .fold(ClassificationCounts::default, |mut counts, result| {
            counts.record(result.reason);
            counts
        })
        .reduce(ClassificationCounts::default, |mut a, b| {
            a.merge(&b);
            a
        });

    debug!(
        "classified {} polylines in parallel: {} valid, {} dropped",
        counts.total(),
        counts.valid,
        counts.dropped()
    );

    (results, counts)
}
