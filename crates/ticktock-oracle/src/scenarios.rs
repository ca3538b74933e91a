//! Query families issued against a fixture.
//!
//! Each method of [`QueryPlan`] returns the queries one kind of scenario
//! sends; the runner decides what to do with them.

use std::ops::RangeInclusive;

use crate::OracleError;
use crate::datapoint::DataPoint;
use crate::fixture::{DataPointSet, metric_name};
use crate::query::{
    Aggregator, DownsampleFunction, DownsampleInterval, Downsampler, FillPolicy, Query,
    RateOptions, TimeUnit,
};
use crate::rng::OracleRng;

/// Aggregators compared by the suite, `none` first.
pub const AGGREGATORS: [Aggregator; 13] = Aggregator::ALL;

/// Downsample functions compared by the suite.
pub const DOWNSAMPLE_FUNCTIONS: [DownsampleFunction; 14] = DownsampleFunction::ALL;

/// Downsample functions compared after rollups.
pub const ROLLUP_FUNCTIONS: [DownsampleFunction; 5] = [
    DownsampleFunction::Avg,
    DownsampleFunction::Count,
    DownsampleFunction::Max,
    DownsampleFunction::Min,
    DownsampleFunction::Sum,
];

/// Range widening for zero-fill queries, so leading and trailing empty
/// buckets are part of the answer.
const ZERO_FILL_MARGIN_MS: i64 = 99_999;

/// Series of the pattern-filter fixture, as `(tag2, tag3)`; `tag1` is always `val1`.
const PATTERN_SERIES: [(&str, &str); 3] = [("val2", "val3"), ("val3", "val2"), ("val2", "val24")];

/// Metric written by [`pattern_fixture`].
pub fn pattern_metric(prefix: &str) -> String {
    format!("{prefix}_metric_agg")
}

/// Three points at `start` on one metric whose `tag3` values share the
/// `val2` prefix, for alternation and prefix filters.
pub fn pattern_fixture(
    prefix: &str,
    start: i64,
    rng: &mut OracleRng,
) -> Result<DataPointSet, OracleError> {
    let mut set = DataPointSet::empty(prefix, start);
    for (tag2, tag3) in PATTERN_SERIES {
        set.add(
            DataPoint::new(pattern_metric(prefix), start, rng.uniform(0.0, 100.0)).with_tags([
                ("tag1", "val1"),
                ("tag2", tag2),
                ("tag3", tag3),
            ]),
        )?;
    }
    Ok(set)
}

/// Builds the queries for a fixture generated with the given cardinalities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    prefix: String,
    start: i64,
    end: i64,
    metric_cardinality: usize,
    tag_cardinality: usize,
}

impl QueryPlan {
    pub fn new(fixture: &DataPointSet, metric_cardinality: usize, tag_cardinality: usize) -> Self {
        Self {
            prefix: fixture.prefix().to_string(),
            start: fixture.start(),
            end: fixture.end(),
            metric_cardinality,
            tag_cardinality,
        }
    }

    fn metric(&self, k: usize) -> String {
        metric_name(&self.prefix, k)
    }

    fn query(&self, k: usize) -> Query {
        Query::new(self.metric(k), self.start).with_end(self.end)
    }

    fn metrics(&self) -> RangeInclusive<usize> {
        1..=self.metric_cardinality
    }

    /// `[start - margin, end + margin]`, clamped to the timestamp domain.
    fn widened(&self, k: usize) -> Query {
        Query::new(self.metric(k), self.start.saturating_sub(ZERO_FILL_MARGIN_MS))
            .with_end(self.end.saturating_add(ZERO_FILL_MARGIN_MS))
    }

    /// `[start + margin, end + margin]`, clamped to the timestamp domain.
    fn shifted(&self, k: usize) -> Query {
        Query::new(self.metric(k), self.start.saturating_add(ZERO_FILL_MARGIN_MS))
            .with_end(self.end.saturating_add(ZERO_FILL_MARGIN_MS))
    }

    /// A metric that was never written, then every metric without filters.
    pub fn raw(&self) -> Vec<Query> {
        std::iter::once(self.query(0))
            .chain(self.metrics().map(|k| self.query(k)))
            .collect()
    }

    /// Literal tag filters, `*` wildcards and `val*` prefix filters.
    pub fn tag_filtered(&self) -> Vec<Query> {
        let tc = self.tag_cardinality;
        let mut queries = Vec::new();
        for k in self.metrics() {
            for t in 1..=tc {
                for v in 1..=tc {
                    queries.push(self.query(k).with_tag(format!("tag{t}"), format!("val{v}")));
                }
            }
            for t in 1..=tc {
                queries.push(self.query(k).with_tag(format!("tag{t}"), "*"));
            }
            for t in 3..=tc {
                queries.push(
                    self.query(k)
                        .with_tag("tag1", "val1")
                        .with_tag(format!("tag{t}"), "val*"),
                );
            }
        }
        queries
    }

    /// Every downsample function on every metric.
    ///
    /// With `zero_fill` the range is widened on both sides.
    pub fn downsampled(&self, interval: DownsampleInterval, zero_fill: bool) -> Vec<Query> {
        let mut queries = Vec::new();
        for k in self.metrics() {
            for function in DOWNSAMPLE_FUNCTIONS {
                let mut downsampler = Downsampler::new(interval, function);
                let mut query = self.query(k);
                if zero_fill {
                    downsampler = downsampler.with_fill(FillPolicy::Zero);
                    query = self.widened(k);
                }
                queries.push(query.with_downsampler(downsampler));
            }
        }
        queries
    }

    /// Every aggregator over a `tag<k>=*` filter on metric `k`.
    pub fn aggregated(&self) -> Vec<Query> {
        let mut queries = Vec::new();
        for k in self.metrics() {
            for aggregator in AGGREGATORS {
                queries.push(
                    self.query(k)
                        .with_tag(format!("tag{k}"), "*")
                        .with_aggregator(aggregator),
                );
            }
        }
        queries
    }

    /// The aggregator × downsample-function grid.
    ///
    /// Without fill, queries keep the `tag<k>=*` filter. With zero fill the
    /// range is shifted forward so trailing buckets are empty.
    pub fn aggregated_downsampled(
        &self,
        interval: DownsampleInterval,
        zero_fill: bool,
    ) -> Vec<Query> {
        let mut queries = Vec::new();
        for k in self.metrics() {
            for function in DOWNSAMPLE_FUNCTIONS {
                for aggregator in AGGREGATORS {
                    let query = if zero_fill {
                        self.shifted(k)
                            .with_downsampler(
                                Downsampler::new(interval, function).with_fill(FillPolicy::Zero),
                            )
                    } else {
                        self.query(k)
                            .with_tag(format!("tag{k}"), "*")
                            .with_downsampler(Downsampler::new(interval, function))
                    };
                    queries.push(query.with_aggregator(aggregator));
                }
            }
        }
        queries
    }

    /// Rate conversions: gauge and counter variants, with and without downsampling.
    pub fn rated(&self) -> Vec<Query> {
        let ten_seconds = DownsampleInterval::every(10, TimeUnit::Seconds);
        let zero_filled = |function: DownsampleFunction| {
            Downsampler::new(ten_seconds, function).with_fill(FillPolicy::Zero)
        };
        let full_counter = RateOptions::counter()
            .with_drop_resets()
            .with_counter_max(200)
            .with_reset_value(100);

        let mut queries = Vec::new();
        for k in self.metrics() {
            for function in DOWNSAMPLE_FUNCTIONS {
                queries.push(
                    self.query(k)
                        .with_rate(RateOptions::gauge())
                        .with_downsampler(zero_filled(function)),
                );
            }
        }
        for k in self.metrics() {
            let filtered = self.query(k).with_tag(format!("tag{k}"), "*");
            queries.push(filtered.clone().with_rate(RateOptions::gauge().with_drop_resets()));
            queries.push(filtered.clone().with_rate(RateOptions::counter().with_drop_resets()));
            queries.push(
                filtered.with_rate(RateOptions::counter().with_drop_resets().with_counter_max(200)),
            );
        }
        for k in self.metrics() {
            for function in DOWNSAMPLE_FUNCTIONS {
                queries.push(
                    self.query(k)
                        .with_tag(format!("tag{k}"), "*")
                        .with_rate(full_counter)
                        .with_downsampler(zero_filled(function)),
                );
            }
        }
        queries
    }

    /// `sum` with `1h-avg` over [`pattern_fixture`]: a `*` wildcard, an
    /// `a|b` alternation and a `val2*` prefix filter on `tag3`.
    pub fn pattern_aggregated(&self) -> Vec<Query> {
        let hourly_avg = Downsampler::new(
            DownsampleInterval::every(1, TimeUnit::Hours),
            DownsampleFunction::Avg,
        );
        [("tag2", "*"), ("tag3", "val2|val24"), ("tag3", "val2*")]
            .into_iter()
            .map(|(key, filter)| {
                Query::new(pattern_metric(&self.prefix), self.start)
                    .with_end(self.end.saturating_add(ZERO_FILL_MARGIN_MS))
                    .with_tag("tag1", "val1")
                    .with_tag(key, filter)
                    .with_aggregator(Aggregator::Sum)
                    .with_downsampler(hourly_avg)
            })
            .collect()
    }

    /// Queries served from hourly and daily rollups: `2h` and `1d` buckets
    /// with the rollup functions, alone over the widened range and under
    /// every aggregator over the shifted range.
    pub fn rollup(&self) -> Vec<Query> {
        let two_hours = DownsampleInterval::every(2, TimeUnit::Hours);
        let one_day = DownsampleInterval::every(1, TimeUnit::Days);

        let mut queries = Vec::new();
        for (interval, plain_fill, grid_fill) in
            [(two_hours, None, Some(FillPolicy::Zero)), (one_day, Some(FillPolicy::Zero), None)]
        {
            let downsampler = |function, fill: Option<FillPolicy>| Downsampler {
                interval,
                function,
                fill,
            };
            for k in self.metrics() {
                for function in ROLLUP_FUNCTIONS {
                    queries.push(
                        self.widened(k)
                            .with_downsampler(downsampler(function, plain_fill)),
                    );
                }
            }
            for k in self.metrics() {
                for function in ROLLUP_FUNCTIONS {
                    for aggregator in AGGREGATORS {
                        queries.push(
                            self.shifted(k)
                                .with_aggregator(aggregator)
                                .with_downsampler(downsampler(function, grid_fill)),
                        );
                    }
                }
            }
        }
        queries
    }

    /// After duplicate writes: every metric raw, then the aggregator ×
    /// function grid with `60s` zero-filled buckets over the unshifted range.
    pub fn duplicates(&self) -> Vec<Query> {
        let minute = DownsampleInterval::every(60, TimeUnit::Seconds);
        let mut queries = Vec::new();
        for k in self.metrics() {
            queries.push(self.query(k));
            for function in DOWNSAMPLE_FUNCTIONS {
                for aggregator in AGGREGATORS {
                    queries.push(
                        self.query(k)
                            .with_aggregator(aggregator)
                            .with_downsampler(
                                Downsampler::new(minute, function).with_fill(FillPolicy::Zero),
                            ),
                    );
                }
            }
        }
        queries
    }

    /// Counter rates under every series-merging aggregator. Backends order
    /// rate and aggregation differently, so the runner skips these by default.
    pub fn rated_aggregated(&self) -> Vec<Query> {
        let mut queries = Vec::new();
        for k in self.metrics() {
            for aggregator in AGGREGATORS.into_iter().filter(|a| a.merges_series()) {
                queries.push(
                    self.query(k)
                        .with_tag(format!("tag{k}"), "*")
                        .with_rate(RateOptions::counter())
                        .with_aggregator(aggregator),
                );
            }
        }
        queries
    }
}
