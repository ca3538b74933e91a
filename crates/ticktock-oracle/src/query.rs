//! The abstract time-series query and its two wire renderings.
//!
//! - [`Query::to_structured`]: body for a structured (POST) query
//! - [`Query::to_url_params`]: flat parameters using the compact
//!   `<agg>[:rate{..}][:<downsampler>]:<metric>[{k=v,...}]` grammar

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::OracleError;
use crate::tree::ResponseTree;

// ============================================================================
// Aggregators and Downsamplers
// ============================================================================

/// Cross-series aggregation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregator {
    /// No cross-series aggregation; the token the backends require when none is wanted.
    #[default]
    None,
    Avg,
    Count,
    Dev,
    Max,
    Min,
    P50,
    P75,
    P90,
    P95,
    P99,
    P999,
    Sum,
    /// Raw points; omitted from the structured body.
    Raw,
}

impl Aggregator {
    /// Every aggregator the suite compares, `none` first.
    pub const ALL: [Aggregator; 13] = [
        Self::None,
        Self::Avg,
        Self::Count,
        Self::Dev,
        Self::Max,
        Self::Min,
        Self::P50,
        Self::P75,
        Self::P90,
        Self::P95,
        Self::P99,
        Self::P999,
        Self::Sum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Dev => "dev",
            Self::Max => "max",
            Self::Min => "min",
            Self::P50 => "p50",
            Self::P75 => "p75",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
            Self::P999 => "p999",
            Self::Sum => "sum",
            Self::Raw => "raw",
        }
    }

    /// Whether this aggregator merges series.
    pub fn merges_series(self) -> bool {
        !matches!(self, Self::None | Self::Raw)
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregator {
    type Err = OracleError;

    /// The empty string normalizes to `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .chain([Self::Raw])
            .find(|agg| agg.as_str() == s)
            .ok_or_else(|| OracleError::InvalidQuery(format!("unknown aggregator '{s}'")))
    }
}

/// Per-bucket reducer of a downsampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownsampleFunction {
    Avg,
    Count,
    Dev,
    First,
    Last,
    Max,
    Min,
    P50,
    P75,
    P90,
    P95,
    P99,
    P999,
    Sum,
}

impl DownsampleFunction {
    pub const ALL: [DownsampleFunction; 14] = [
        Self::Avg,
        Self::Count,
        Self::Dev,
        Self::First,
        Self::Last,
        Self::Max,
        Self::Min,
        Self::P50,
        Self::P75,
        Self::P90,
        Self::P95,
        Self::P99,
        Self::P999,
        Self::Sum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Dev => "dev",
            Self::First => "first",
            Self::Last => "last",
            Self::Max => "max",
            Self::Min => "min",
            Self::P50 => "p50",
            Self::P75 => "p75",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
            Self::P999 => "p999",
            Self::Sum => "sum",
        }
    }
}

impl fmt::Display for DownsampleFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownsampleFunction {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|func| func.as_str() == s)
            .ok_or_else(|| OracleError::InvalidQuery(format!("unknown downsample function '{s}'")))
    }
}

/// What to emit for buckets without samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillPolicy {
    Zero,
    Nan,
    Null,
}

impl FillPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::Nan => "nan",
            Self::Null => "null",
        }
    }
}

impl FromStr for FillPolicy {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(Self::Zero),
            "nan" => Ok(Self::Nan),
            "null" => Ok(Self::Null),
            other => Err(OracleError::InvalidQuery(format!(
                "unknown fill policy '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    const ALL: [TimeUnit; 6] = [
        Self::Millis,
        Self::Seconds,
        Self::Minutes,
        Self::Hours,
        Self::Days,
        Self::Weeks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Millis => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
            Self::Weeks => "w",
        }
    }

    pub fn millis(self) -> u64 {
        match self {
            Self::Millis => 1,
            Self::Seconds => 1_000,
            Self::Minutes => 60_000,
            Self::Hours => 3_600_000,
            Self::Days => 86_400_000,
            Self::Weeks => 604_800_000,
        }
    }
}

/// Bucket width of a downsampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownsampleInterval {
    /// One bucket spanning the whole query range (`0all`).
    All,
    Every { count: u64, unit: TimeUnit },
}

impl DownsampleInterval {
    pub fn every(count: u64, unit: TimeUnit) -> Self {
        Self::Every { count, unit }
    }

    /// Bucket width in milliseconds; `None` for [`DownsampleInterval::All`].
    pub fn millis(self) -> Option<u64> {
        match self {
            Self::All => None,
            Self::Every { count, unit } => count.checked_mul(unit.millis()),
        }
    }
}

impl fmt::Display for DownsampleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("0all"),
            Self::Every { count, unit } => write!(f, "{count}{}", unit.as_str()),
        }
    }
}

impl FromStr for DownsampleInterval {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "0all" {
            return Ok(Self::All);
        }
        let invalid = || OracleError::InvalidQuery(format!("invalid downsample interval '{s}'"));

        let split = s.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        let (digits, suffix) = s.split_at(split);
        let count: u64 = digits.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        let unit = TimeUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == suffix)
            .ok_or_else(invalid)?;
        Ok(Self::Every { count, unit })
    }
}

/// `<interval>-<function>[-<fill>]`, e.g. `10s-avg-zero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Downsampler {
    pub interval: DownsampleInterval,
    pub function: DownsampleFunction,
    pub fill: Option<FillPolicy>,
}

impl Downsampler {
    pub fn new(interval: DownsampleInterval, function: DownsampleFunction) -> Self {
        Self {
            interval,
            function,
            fill: None,
        }
    }

    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn is_zero_fill(&self) -> bool {
        self.fill == Some(FillPolicy::Zero)
    }
}

impl fmt::Display for Downsampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.interval, self.function)?;
        if let Some(fill) = self.fill {
            write!(f, "-{}", fill.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for Downsampler {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        let (Some(interval), Some(function)) = (parts.next(), parts.next()) else {
            return Err(OracleError::InvalidQuery(format!(
                "downsampler '{s}' is not <interval>-<function>[-<fill>]"
            )));
        };
        let fill = parts.next().map(str::parse::<FillPolicy>).transpose()?;
        if parts.next().is_some() {
            return Err(OracleError::InvalidQuery(format!(
                "downsampler '{s}' has trailing components"
            )));
        }
        Ok(Self {
            interval: interval.parse()?,
            function: function.parse()?,
            fill,
        })
    }
}

// ============================================================================
// Rate Options
// ============================================================================

/// Rate-conversion flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RateOptions {
    pub counter: bool,
    pub drop_resets: bool,
    pub counter_max: Option<u64>,
    pub reset_value: Option<u64>,
}

impl RateOptions {
    /// Plain rate of change, no counter semantics.
    pub fn gauge() -> Self {
        Self::default()
    }

    /// Monotonic counter; wraparounds are handled.
    pub fn counter() -> Self {
        Self {
            counter: true,
            ..Self::default()
        }
    }

    pub fn with_drop_resets(mut self) -> Self {
        self.drop_resets = true;
        self
    }

    pub fn with_counter_max(mut self, max: u64) -> Self {
        self.counter_max = Some(max);
        self
    }

    pub fn with_reset_value(mut self, value: u64) -> Self {
        self.reset_value = Some(value);
        self
    }

    /// `rateOptions` object. Flags are the strings `"true"`/`"false"`.
    pub fn to_structured(&self) -> ResponseTree {
        let mut options = BTreeMap::new();
        options.insert("counter".to_string(), flag(self.counter));
        if self.drop_resets {
            options.insert("dropResets".to_string(), flag(true));
        }
        if let Some(max) = self.counter_max {
            options.insert("counterMax".to_string(), int(max));
        }
        if let Some(value) = self.reset_value {
            options.insert("resetValue".to_string(), int(value));
        }
        ResponseTree::Map(options)
    }

    /// `rate`, `rate{counter[,max[,reset]]}` or `rate{dropcounter,...}`.
    fn to_url_token(&self) -> String {
        if !self.counter {
            return "rate".to_string();
        }
        let mut token = String::from(if self.drop_resets {
            "rate{dropcounter"
        } else {
            "rate{counter"
        });
        if self.counter_max.is_some() || self.reset_value.is_some() {
            token.push(',');
            if let Some(max) = self.counter_max {
                token.push_str(&max.to_string());
            }
        }
        if let Some(value) = self.reset_value {
            token.push(',');
            token.push_str(&value.to_string());
        }
        token.push('}');
        token
    }
}

fn flag(value: bool) -> ResponseTree {
    ResponseTree::Str(if value { "true" } else { "false" }.to_string())
}

fn int(value: u64) -> ResponseTree {
    i64::try_from(value).map_or(ResponseTree::Float(value as f64), ResponseTree::Int)
}

// ============================================================================
// Query
// ============================================================================

/// Characters with syntactic meaning in the compact URL grammar.
const URL_RESERVED: &[char] = &['{', '}', '=', ',', ':'];

/// One time-series query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    metric: String,
    start: i64,
    end: i64,
    tags: BTreeMap<String, String>,
    aggregator: Aggregator,
    downsampler: Option<Downsampler>,
    rate: Option<RateOptions>,
}

impl Query {
    /// A raw query over `[start, now]` with aggregator `none`.
    pub fn new(metric: impl Into<String>, start: i64) -> Self {
        Self {
            metric: metric.into(),
            start,
            end: chrono::Utc::now().timestamp_millis(),
            tags: BTreeMap::new(),
            aggregator: Aggregator::None,
            downsampler: None,
            rate: None,
        }
    }

    pub fn with_end(mut self, end: i64) -> Self {
        self.end = end;
        self
    }

    /// Adds a tag filter. Values may be literal, `*`, `prefix*` or `a|b`.
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

    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_downsampler(mut self, downsampler: Downsampler) -> Self {
        self.downsampler = Some(downsampler);
        self
    }

    pub fn with_rate(mut self, options: RateOptions) -> Self {
        self.rate = Some(options);
        self
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn aggregator(&self) -> Aggregator {
        self.aggregator
    }

    pub fn downsampler(&self) -> Option<&Downsampler> {
        self.downsampler.as_ref()
    }

    pub fn rate(&self) -> Option<&RateOptions> {
        self.rate.as_ref()
    }

    /// Rate conversion combined with cross-series aggregation.
    ///
    /// Backends disagree on whether rate or aggregation runs first, so these
    /// responses are not comparable.
    pub fn is_rate_aggregated(&self) -> bool {
        self.rate.is_some() && self.aggregator.merges_series()
    }

    /// Structured body: `{start, end, msResolution, globalAnnotations, queries: [..]}`.
    ///
    /// Capability flags are the string `"true"`; the reference backend rejects
    /// a JSON boolean there.
    pub fn to_structured(&self) -> ResponseTree {
        let mut sub = BTreeMap::new();
        sub.insert("metric".to_string(), ResponseTree::from(self.metric.as_str()));
        if !self.tags.is_empty() {
            let tags = self
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), ResponseTree::from(v.as_str())))
                .collect();
            sub.insert("tags".to_string(), ResponseTree::Map(tags));
        }
        if self.aggregator != Aggregator::Raw {
            sub.insert(
                "aggregator".to_string(),
                ResponseTree::from(self.aggregator.as_str()),
            );
        }
        if let Some(downsampler) = &self.downsampler {
            sub.insert(
                "downsample".to_string(),
                ResponseTree::Str(downsampler.to_string()),
            );
        }
        if let Some(rate) = &self.rate {
            sub.insert("rate".to_string(), flag(true));
            sub.insert("rateOptions".to_string(), rate.to_structured());
        }

        let mut body = BTreeMap::new();
        body.insert("start".to_string(), ResponseTree::Int(self.start));
        body.insert("end".to_string(), ResponseTree::Int(self.end));
        body.insert("msResolution".to_string(), flag(true));
        body.insert("globalAnnotations".to_string(), flag(true));
        body.insert(
            "queries".to_string(),
            ResponseTree::Seq(vec![ResponseTree::Map(sub)]),
        );
        ResponseTree::Map(body)
    }

    /// Query-string parameters: `start`, `end`, `msResolution` and the
    /// composite `m` token.
    ///
    /// Fails when the metric or a tag contains a character the compact
    /// grammar reserves, or whitespace.
    pub fn to_url_params(&self) -> Result<BTreeMap<String, String>, OracleError> {
        check_url_token("metric", &self.metric)?;
        for (k, v) in &self.tags {
            check_url_token("tag key", k)?;
            check_url_token("tag value", v)?;
        }

        let mut m = self.aggregator.as_str().to_string();
        if let Some(rate) = &self.rate {
            m.push(':');
            m.push_str(&rate.to_url_token());
        }
        if let Some(downsampler) = &self.downsampler {
            m.push(':');
            m.push_str(&downsampler.to_string());
        }
        m.push(':');
        m.push_str(&self.metric);
        if !self.tags.is_empty() {
            let filters: Vec<String> = self.tags.iter().map(|(k, v)| format!("{k}={v}")).collect();
            m.push('{');
            m.push_str(&filters.join(","));
            m.push('}');
        }

        let mut params = BTreeMap::new();
        params.insert("start".to_string(), self.start.to_string());
        params.insert("end".to_string(), self.end.to_string());
        params.insert("msResolution".to_string(), "true".to_string());
        params.insert("m".to_string(), m);
        Ok(params)
    }
}

fn check_url_token(what: &str, token: &str) -> Result<(), OracleError> {
    if token.is_empty() {
        return Err(OracleError::InvalidQuery(format!("{what} is empty")));
    }
    if let Some(c) = token
        .chars()
        .find(|c| URL_RESERVED.contains(c) || c.is_whitespace())
    {
        return Err(OracleError::InvalidQuery(format!(
            "{what} '{token}' contains reserved character {c:?}"
        )));
    }
    Ok(())
}

/// Compact JSON of the structured body.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_structured(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn tree(value: serde_json::Value) -> ResponseTree {
        ResponseTree::from(value)
    }

    #[test]
    fn test_defaults() {
        let before = chrono::Utc::now().timestamp_millis();
        let query = Query::new("m", 0);
        let after = chrono::Utc::now().timestamp_millis();

        assert!((before..=after).contains(&query.end()));
        assert_eq!(query.aggregator(), Aggregator::None);
        assert!(query.downsampler().is_none());
        assert!(query.rate().is_none());
    }

    #[test]
    fn test_structured_minimal() {
        let query = Query::new("t_metric_1", 1000).with_end(2000);
        assert_eq!(
            query.to_structured(),
            tree(json!({
                "start": 1000,
                "end": 2000,
                "msResolution": "true",
                "globalAnnotations": "true",
                "queries": [{"metric": "t_metric_1", "aggregator": "none"}]
            }))
        );
    }

    #[test]
    fn test_structured_full() {
        let query = Query::new("t_metric_2", 1000)
            .with_end(2000)
            .with_tag("tag1", "val*")
            .with_aggregator(Aggregator::Sum)
            .with_downsampler("10s-avg-zero".parse().unwrap())
            .with_rate(
                RateOptions::counter()
                    .with_drop_resets()
                    .with_counter_max(200)
                    .with_reset_value(100),
            );
        let body = query.to_structured();
        let sub = &body.get("queries").and_then(ResponseTree::as_seq).unwrap()[0];
        assert_eq!(
            sub,
            &tree(json!({
                "metric": "t_metric_2",
                "tags": {"tag1": "val*"},
                "aggregator": "sum",
                "downsample": "10s-avg-zero",
                "rate": "true",
                "rateOptions": {
                    "counter": "true",
                    "dropResets": "true",
                    "counterMax": 200,
                    "resetValue": 100
                }
            }))
        );
    }

    #[test]
    fn test_raw_aggregator_is_omitted() {
        let query = Query::new("m", 0)
            .with_end(1)
            .with_aggregator(Aggregator::Raw);
        let body = query.to_structured();
        let sub = &body.get("queries").unwrap().as_seq().unwrap()[0];
        assert!(sub.get("aggregator").is_none());
        assert_eq!(query.to_url_params().unwrap()["m"], "raw:m");
    }

    #[test]
    fn test_url_params() {
        let query = Query::new("t_metric_2", 1000)
            .with_end(2000)
            .with_tag("tag2", "val1|val2")
            .with_tag("tag1", "*")
            .with_aggregator(Aggregator::Avg)
            .with_downsampler("1m-max".parse().unwrap());
        let params = query.to_url_params().unwrap();

        assert_eq!(params["start"], "1000");
        assert_eq!(params["end"], "2000");
        assert_eq!(params["msResolution"], "true");
        assert_eq!(params["m"], "avg:1m-max:t_metric_2{tag1=*,tag2=val1|val2}");
    }

    #[test_case(RateOptions::gauge(), "none:rate:m" ; "gauge")]
    #[test_case(RateOptions::counter(), "none:rate{counter}:m" ; "counter")]
    #[test_case(RateOptions::counter().with_counter_max(200), "none:rate{counter,200}:m" ; "counter max")]
    #[test_case(RateOptions::counter().with_reset_value(5), "none:rate{counter,,5}:m" ; "reset only")]
    #[test_case(
        RateOptions::counter().with_drop_resets().with_counter_max(200).with_reset_value(100),
        "none:rate{dropcounter,200,100}:m" ;
        "drop resets"
    )]
    fn test_url_rate_token(options: RateOptions, expected: &str) {
        let query = Query::new("m", 0).with_end(1).with_rate(options);
        assert_eq!(query.to_url_params().unwrap()["m"], expected);
    }

    #[test]
    fn test_url_rate_precedes_downsampler() {
        let query = Query::new("m", 0)
            .with_end(1)
            .with_rate(RateOptions::gauge())
            .with_downsampler("10s-sum-zero".parse().unwrap());
        assert_eq!(query.to_url_params().unwrap()["m"], "none:rate:10s-sum-zero:m");
    }

    #[test_case("bad metric", &[] ; "whitespace in metric")]
    #[test_case("a:b", &[] ; "colon in metric")]
    #[test_case("m", &[("tag{1", "v")] ; "brace in tag key")]
    #[test_case("m", &[("tag1", "a,b")] ; "comma in tag value")]
    #[test_case("m", &[("tag1", "a=b")] ; "equals in tag value")]
    #[test_case("", &[] ; "empty metric")]
    fn test_url_rejects_unsafe_tokens(metric: &str, tags: &[(&str, &str)]) {
        let query = Query::new(metric, 0)
            .with_end(1)
            .with_tags(tags.iter().copied());
        assert!(matches!(
            query.to_url_params(),
            Err(OracleError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_tag_value_lookup() {
        let query = Query::new("m", 0).with_tag("tag1", "val1");
        assert_eq!(query.tag_value("tag1"), Some("val1"));
        assert_eq!(query.tag_value("tag2"), None);
    }

    #[test]
    fn test_rate_aggregated() {
        let base = Query::new("m", 0).with_rate(RateOptions::counter());
        assert!(!base.is_rate_aggregated());
        assert!(!base.clone().with_aggregator(Aggregator::Raw).is_rate_aggregated());
        assert!(base.with_aggregator(Aggregator::Sum).is_rate_aggregated());
        assert!(
            !Query::new("m", 0)
                .with_aggregator(Aggregator::Sum)
                .is_rate_aggregated()
        );
    }

    #[test_case("10000ms-avg" ; "millis")]
    #[test_case("10s-p999-zero" ; "zero fill")]
    #[test_case("0all-count-zero" ; "all")]
    #[test_case("1h-avg" ; "hours")]
    #[test_case("2w-last-nan" ; "weeks nan fill")]
    #[test_case("1d-first-null" ; "days null fill")]
    fn test_downsampler_parse_display(text: &str) {
        let ds: Downsampler = text.parse().unwrap();
        assert_eq!(ds.to_string(), text);
    }

    #[test_case("10s" ; "missing function")]
    #[test_case("10x-avg" ; "unknown unit")]
    #[test_case("0s-avg" ; "zero interval")]
    #[test_case("s-avg" ; "missing count")]
    #[test_case("10s-median" ; "unknown function")]
    #[test_case("10s-avg-linear" ; "unknown fill")]
    #[test_case("10s-avg-zero-extra" ; "trailing component")]
    fn test_downsampler_rejects(text: &str) {
        assert!(matches!(
            text.parse::<Downsampler>(),
            Err(OracleError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_downsample_interval_millis() {
        assert_eq!("10s".parse::<DownsampleInterval>().unwrap().millis(), Some(10_000));
        assert_eq!("2h".parse::<DownsampleInterval>().unwrap().millis(), Some(7_200_000));
        assert_eq!(DownsampleInterval::All.millis(), None);
    }

    #[test]
    fn test_aggregator_parse() {
        assert_eq!("".parse::<Aggregator>().unwrap(), Aggregator::None);
        assert_eq!("p999".parse::<Aggregator>().unwrap(), Aggregator::P999);
        assert_eq!("raw".parse::<Aggregator>().unwrap(), Aggregator::Raw);
        assert!("median".parse::<Aggregator>().is_err());
        for agg in Aggregator::ALL {
            assert_eq!(agg.to_string().parse::<Aggregator>().unwrap(), agg);
        }
    }
}
