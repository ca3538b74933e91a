//! A single time-series sample.

use std::collections::BTreeMap;

use serde_json::json;

/// One `(metric, timestamp, value, tags)` sample.
///
/// Metric and tags are fixed at construction. Timestamp and value can be
/// rewritten to simulate late duplicate writes and counter drift.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    metric: String,
    timestamp: i64,
    value: f64,
    tags: BTreeMap<String, String>,
}

impl DataPoint {
    pub fn new(metric: impl Into<String>, timestamp: i64, value: f64) -> Self {
        Self {
            metric: metric.into(),
            timestamp,
            value,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// `<metric> <timestamp> <value> k=v...`, value with 12 fractional digits.
    pub fn to_plain(&self) -> String {
        let tags: String = self
            .tags
            .iter()
            .map(|(k, v)| format!(" {k}={v}"))
            .collect();
        format!("{} {} {:.12}{tags}", self.metric, self.timestamp, self.value)
    }

    /// One newline-terminated line-protocol record.
    pub fn to_put_line(&self) -> String {
        format!("put {}\n", self.to_plain())
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "metric": self.metric,
            "timestamp": self.timestamp,
            "value": self.value,
            "tags": self.tags,
        })
    }

    pub fn to_tuple(&self) -> (i64, f64) {
        (self.timestamp, self.value)
    }
}
