//! Synthetic fixture generation.
//!
//! A fixture is a [`DataPointSet`]: points in generation order plus the
//! half-open `[start, end)` span that covers all of them. Generation is a pure
//! function of the [`FixtureConfig`] and the state of the [`OracleRng`] it
//! draws from.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::debug;

use crate::backend::WritePayload;
use crate::datapoint::DataPoint;
use crate::rng::OracleRng;
use crate::{OracleError, SuiteConfig, WriteFormat};

/// Below this spacing tag values are pinned instead of drawn, so random tag
/// collisions cannot merge series inside one downsample bucket.
const PINNED_TAG_INTERVAL_MS: u64 = 200;

/// Upper bound of the extra cursor advance after each emitted point.
const POINT_JITTER_MS: i64 = 1000;

/// Parameters for [`DataPointSet::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    /// Namespace for metric names (`<prefix>_metric_<k>`).
    pub prefix: String,

    /// Initial cursor position in milliseconds.
    pub start: i64,

    /// Maximum cursor step per time step.
    pub interval_ms: u64,

    /// Number of time steps.
    pub metric_count: usize,

    /// Metrics emitted per time step; metric `k` carries `k` tags.
    pub metric_cardinality: usize,

    /// Distinct values per tag (`val1..val<n>`).
    pub tag_cardinality: usize,

    /// Allow the cursor to step backwards.
    pub out_of_order: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            prefix: "t".to_string(),
            start: 0,
            interval_ms: 5000,
            metric_count: 2,
            metric_cardinality: 2,
            tag_cardinality: 2,
            out_of_order: false,
        }
    }
}

impl FixtureConfig {
    pub fn new(prefix: impl Into<String>, start: i64) -> Self {
        Self {
            prefix: prefix.into(),
            start,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<i64, OracleError> {
        let interval = i64::try_from(self.interval_ms).map_err(|_| {
            OracleError::Generation(format!("interval_ms {} is too large", self.interval_ms))
        })?;

        let emits = self.metric_count > 0 && self.metric_cardinality > 0;
        if emits && !self.out_of_order && interval == 0 {
            return Err(OracleError::Generation(
                "interval_ms must be positive for in-order fixtures".to_string(),
            ));
        }
        if emits && self.tag_cardinality == 0 && self.interval_ms >= PINNED_TAG_INTERVAL_MS {
            return Err(OracleError::Generation(
                "tag_cardinality must be positive when tag values are drawn".to_string(),
            ));
        }
        Ok(interval)
    }
}

/// Default shape starting at the configured `[suite] start_ms`.
impl From<&SuiteConfig> for FixtureConfig {
    fn from(suite: &SuiteConfig) -> Self {
        Self {
            start: suite.start_ms,
            ..Default::default()
        }
    }
}

/// Metric name for index `k` (1-based) under `prefix`.
pub fn metric_name(prefix: &str, k: usize) -> String {
    format!("{prefix}_metric_{k}")
}

/// An ordered collection of points with tracked `[start, end)` bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPointSet {
    prefix: String,
    start: i64,
    end: i64,
    points: Vec<DataPoint>,
}

impl DataPointSet {
    /// An empty set with `start == end`.
    pub fn empty(prefix: impl Into<String>, start: i64) -> Self {
        Self {
            prefix: prefix.into(),
            start,
            end: start,
            points: Vec::new(),
        }
    }

    /// Generates a fixture.
    ///
    /// Each of the `metric_count` steps moves the cursor by a draw from
    /// `[1, interval]` (or `[-interval, interval]` when out of order), then
    /// emits metrics `1..=metric_cardinality` at the cursor, advancing it by a
    /// draw from `[0, 1000]` after every point.
    ///
    /// Draw order per step: cursor offset; then per metric its tag values,
    /// its value and its jitter. Changing this order changes every fixture.
    pub fn generate(config: &FixtureConfig, rng: &mut OracleRng) -> Result<Self, OracleError> {
        let interval = config.validate()?;
        let mut set = Self::empty(config.prefix.clone(), config.start);
        if config.metric_count == 0 || config.metric_cardinality == 0 {
            return Ok(set);
        }

        let overflow = || OracleError::Generation("timestamp overflow".to_string());
        let pinned = config.interval_ms < PINNED_TAG_INTERVAL_MS;
        let tag_cardinality = i64::try_from(config.tag_cardinality).map_err(|_| {
            OracleError::Generation(format!(
                "tag_cardinality {} is too large",
                config.tag_cardinality
            ))
        })?;

        let mut cursor = config.start;
        let mut min_ts = i64::MAX;
        let mut max_ts = i64::MIN;

        for _ in 0..config.metric_count {
            let offset = if config.out_of_order {
                rng.range_inclusive(-interval, interval)
            } else {
                rng.range_inclusive(1, interval)
            };
            cursor = cursor.checked_add(offset).ok_or_else(overflow)?;

            for k in 1..=config.metric_cardinality {
                let mut tags = BTreeMap::new();
                for t in 1..=k {
                    let value = if pinned {
                        format!("val{t}")
                    } else {
                        format!("val{}", rng.range_inclusive(1, tag_cardinality))
                    };
                    tags.insert(format!("tag{t}"), value);
                }
                let value = rng.uniform(0.0, 100.0);
                set.points.push(
                    DataPoint::new(metric_name(&config.prefix, k), cursor, value).with_tags(tags),
                );
                min_ts = min_ts.min(cursor);
                max_ts = max_ts.max(cursor);

                let jitter = rng.range_inclusive(0, POINT_JITTER_MS);
                cursor = cursor.checked_add(jitter).ok_or_else(overflow)?;
            }
        }

        set.start = set.start.min(min_ts);
        set.end = cursor.max(max_ts).checked_add(1).ok_or_else(overflow)?;

        debug!(
            prefix = %set.prefix,
            points = set.points.len(),
            start = set.start,
            end = set.end,
            out_of_order = config.out_of_order,
            "generated fixture"
        );
        Ok(set)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Mutable access for late-write scenarios. Bounds are not re-derived;
    /// timestamps should stay inside `[start, end)` or be re-added with [`Self::add`].
    pub fn points_mut(&mut self) -> &mut [DataPoint] {
        &mut self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends `point`, widening the bounds so that `start <= ts < end`.
    ///
    /// A point at `i64::MAX` has no exclusive end and is rejected.
    pub fn add(&mut self, point: DataPoint) -> Result<(), OracleError> {
        let ts = point.timestamp();
        let after = ts.checked_add(1).ok_or_else(|| {
            OracleError::Generation(format!("timestamp {ts} leaves no room for an exclusive end"))
        })?;
        self.start = self.start.min(ts);
        self.end = self.end.max(after);
        self.points.push(point);
        Ok(())
    }

    /// Adds a uniform integer in `[1, 10]` to every value.
    pub fn update_values(&mut self, rng: &mut OracleRng) {
        for point in &mut self.points {
            let bump = rng.range_inclusive(1, 10) as f64;
            point.set_value(point.value() + bump);
        }
    }

    /// Distinct metric names, in first-seen order.
    pub fn metrics(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for point in &self.points {
            if !seen.contains(&point.metric()) {
                seen.push(point.metric());
            }
        }
        seen
    }

    /// Concatenated `put` lines.
    pub fn to_plain(&self) -> String {
        self.points.iter().map(DataPoint::to_put_line).collect()
    }

    /// `{"metrics": [...]}` envelope.
    pub fn to_json(&self) -> serde_json::Value {
        json!({ "metrics": self.to_json_array() })
    }

    /// Bare array of point objects, as reference backends expect.
    pub fn to_json_array(&self) -> serde_json::Value {
        serde_json::Value::Array(self.points.iter().map(DataPoint::to_json).collect())
    }

    /// Payload for the system under test.
    pub fn encode(&self, format: WriteFormat) -> WritePayload {
        match format {
            WriteFormat::Plain => WritePayload::LineProtocol(self.to_plain()),
            WriteFormat::Json => WritePayload::Json(self.to_json()),
        }
    }

    /// Payload for the reference backend.
    pub fn reference_payload(&self) -> WritePayload {
        WritePayload::Json(self.to_json_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::DEFAULT_SEED;

    fn generate(config: &FixtureConfig) -> DataPointSet {
        DataPointSet::generate(config, &mut OracleRng::new(DEFAULT_SEED)).unwrap()
    }

    #[test]
    fn test_generate_default_shape() {
        let config = FixtureConfig {
            start: 1000,
            ..Default::default()
        };
        let set = generate(&config);

        assert_eq!(set.len(), 4);
        assert_eq!(set.start(), 1000);
        assert_eq!(set.metrics(), vec!["t_metric_1", "t_metric_2"]);
        for point in set.points() {
            assert!(point.timestamp() > 1000);
            assert!(point.timestamp() < set.end());
        }
    }

    #[test]
    fn test_in_order_points_are_strictly_increasing() {
        let config = FixtureConfig {
            metric_count: 50,
            metric_cardinality: 3,
            ..Default::default()
        };
        let set = generate(&config);
        let timestamps: Vec<i64> = set.points().iter().map(DataPoint::timestamp).collect();
        // Within a step the jitter may be 0, across steps the offset is >= 1.
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_pinned_tags_below_200ms() {
        let config = FixtureConfig {
            interval_ms: 100,
            metric_cardinality: 3,
            tag_cardinality: 5,
            metric_count: 10,
            ..Default::default()
        };
        let set = generate(&config);
        for point in set.points() {
            for (k, v) in point.tags() {
                assert_eq!(k.replace("tag", ""), v.replace("val", ""));
            }
        }
    }

    #[test]
    fn test_empty_set_for_zero_metric_count() {
        let config = FixtureConfig {
            metric_count: 0,
            start: 500,
            ..Default::default()
        };
        let set = generate(&config);
        assert!(set.is_empty());
        assert_eq!(set.start(), 500);
        assert_eq!(set.end(), 500);
    }

    #[test]
    fn test_out_of_order_bounds_are_widened() {
        let config = FixtureConfig {
            start: 0,
            interval_ms: 50_000,
            metric_count: 200,
            out_of_order: true,
            ..Default::default()
        };
        let set = generate(&config);
        assert!(set.start() <= 0);
        for point in set.points() {
            assert!(set.start() <= point.timestamp());
            assert!(point.timestamp() < set.end());
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let mut rng = OracleRng::new(1);

        let zero_interval = FixtureConfig {
            interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            DataPointSet::generate(&zero_interval, &mut rng),
            Err(OracleError::Generation(_))
        ));

        let no_tag_values = FixtureConfig {
            tag_cardinality: 0,
            ..Default::default()
        };
        assert!(matches!(
            DataPointSet::generate(&no_tag_values, &mut rng),
            Err(OracleError::Generation(_))
        ));

        let overflow = FixtureConfig {
            start: i64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            DataPointSet::generate(&overflow, &mut rng),
            Err(OracleError::Generation(_))
        ));
    }

    #[test]
    fn test_zero_interval_allowed_out_of_order() {
        let config = FixtureConfig {
            interval_ms: 0,
            out_of_order: true,
            ..Default::default()
        };
        assert_eq!(generate(&config).len(), 4);
    }

    #[test]
    fn test_add_widens_bounds() {
        let mut set = DataPointSet::empty("x", 1000);
        set.add(DataPoint::new("x_metric_1", 1500, 1.0)).unwrap();
        assert_eq!((set.start(), set.end()), (1000, 1501));

        set.add(DataPoint::new("x_metric_1", 900, 1.0)).unwrap();
        assert_eq!((set.start(), set.end()), (900, 1501));

        set.add(DataPoint::new("x_metric_1", 1200, 1.0)).unwrap();
        assert_eq!((set.start(), set.end()), (900, 1501));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_add_rejects_point_without_exclusive_end() {
        let mut set = DataPointSet::empty("x", 0);
        set.add(DataPoint::new("x_metric_1", i64::MAX - 1, 1.0)).unwrap();
        assert_eq!(set.end(), i64::MAX);

        let err = set.add(DataPoint::new("x_metric_1", i64::MAX, 1.0));
        assert!(matches!(err, Err(OracleError::Generation(_))));
        assert_eq!(set.len(), 1);
        assert_eq!((set.start(), set.end()), (0, i64::MAX));
    }

    #[test]
    fn test_update_values_bumps_by_integer() {
        let mut set = generate(&FixtureConfig::default());
        let before: Vec<f64> = set.points().iter().map(DataPoint::value).collect();
        set.update_values(&mut OracleRng::new(5));
        for (old, point) in before.iter().zip(set.points()) {
            let bump = point.value() - old;
            assert!((1.0..=10.0).contains(&bump.round()));
            assert!((bump - bump.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_encodings() {
        let mut set = DataPointSet::empty("e", 0);
        set.add(DataPoint::new("e_metric_1", 10, 1.0).with_tag("tag1", "val1")).unwrap();
        set.add(DataPoint::new("e_metric_1", 20, 2.0).with_tag("tag1", "val2")).unwrap();

        assert_eq!(
            set.to_plain(),
            "put e_metric_1 10 1.000000000000 tag1=val1\nput e_metric_1 20 2.000000000000 tag1=val2\n"
        );
        assert_eq!(set.to_json()["metrics"].as_array().map(Vec::len), Some(2));
        assert_eq!(set.to_json_array()[1]["timestamp"], 20);

        assert_eq!(set.encode(WriteFormat::Plain).format(), WriteFormat::Plain);
        assert_eq!(
            set.encode(WriteFormat::Json),
            WritePayload::Json(set.to_json())
        );
        assert_eq!(
            set.reference_payload(),
            WritePayload::Json(set.to_json_array())
        );
    }
}
