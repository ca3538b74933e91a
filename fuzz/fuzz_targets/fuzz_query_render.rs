#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ticktock_oracle::{Aggregator, Downsampler, Query, RateOptions, ResponseTree};

#[derive(Debug, Arbitrary)]
struct QueryInput {
    metric: String,
    start: i64,
    end: i64,
    tags: Vec<(String, String)>,
    aggregator: u8,
    downsample: Option<String>,
    rate: Option<(bool, bool, Option<u64>, Option<u64>)>,
}

fuzz_target!(|input: QueryInput| {
    let mut query = Query::new(input.metric.clone(), input.start)
        .with_end(input.end)
        .with_tags(input.tags)
        .with_aggregator(Aggregator::ALL[usize::from(input.aggregator) % Aggregator::ALL.len()]);

    // Parsing must reject garbage with an error, never a panic
    if let Some(token) = input.downsample {
        if let Ok(downsampler) = token.parse::<Downsampler>() {
            // Accepted tokens render back to something that parses again
            let rendered = downsampler.to_string();
            assert_eq!(rendered.parse::<Downsampler>().ok(), Some(downsampler));
            query = query.with_downsampler(downsampler);
        }
    }

    if let Some((counter, drop_resets, max, reset)) = input.rate {
        let mut options = if counter {
            RateOptions::counter()
        } else {
            RateOptions::gauge()
        };
        if drop_resets {
            options = options.with_drop_resets();
        }
        if let Some(max) = max {
            options = options.with_counter_max(max);
        }
        if let Some(reset) = reset {
            options = options.with_reset_value(reset);
        }
        query = query.with_rate(options);
    }

    let body = query.to_structured();
    assert!(matches!(body.get("queries"), Some(ResponseTree::Seq(q)) if q.len() == 1));
    let _ = body.to_string();

    if let Ok(params) = query.to_url_params() {
        assert!(params["m"].contains(input.metric.as_str()));
    }
});
