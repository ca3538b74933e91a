//! Fixture generation against the documented suite scenario.

use crate::OracleConfig;
use crate::fixture::{DataPointSet, FixtureConfig};
use crate::rng::{DEFAULT_SEED, OracleRng, SharedRng};
use crate::scenarios::QueryPlan;

fn scenario_config() -> FixtureConfig {
    FixtureConfig {
        prefix: "t".to_string(),
        start: 1000,
        interval_ms: 5000,
        metric_count: 2,
        metric_cardinality: 2,
        tag_cardinality: 2,
        out_of_order: false,
    }
}

/// Replays the generator's draws to recover the final cursor.
fn final_cursor(config: &FixtureConfig, seed: u64) -> i64 {
    let mut rng = OracleRng::new(seed);
    let mut cursor = config.start;
    for _ in 0..config.metric_count {
        cursor += rng.range_inclusive(1, config.interval_ms as i64);
        for k in 1..=config.metric_cardinality {
            for _ in 1..=k {
                rng.range_inclusive(1, config.tag_cardinality as i64);
            }
            rng.uniform(0.0, 100.0);
            cursor += rng.range_inclusive(0, 1000);
        }
    }
    cursor
}

#[test]
fn suite_scenario_shape() {
    let config = scenario_config();
    let set = DataPointSet::generate(&config, &mut OracleRng::new(DEFAULT_SEED)).unwrap();

    assert_eq!(set.len(), 4);
    assert_eq!(set.start(), 1000);
    assert_eq!(set.end(), final_cursor(&config, DEFAULT_SEED) + 1);

    let first = &set.points()[0];
    let line = first.to_put_line();
    assert!(line.starts_with("put t_metric_1 "));
    assert!(line.ends_with('\n'));

    let fields: Vec<&str> = line.trim_end().split(' ').collect();
    assert_eq!(fields.len(), 5);
    assert_eq!(fields[2], first.timestamp().to_string());
    assert_eq!(fields[3], format!("{:.12}", first.value()));
    assert!(fields[4] == "tag1=val1" || fields[4] == "tag1=val2");
}

#[test]
fn suite_scenario_is_reproducible() {
    let config = scenario_config();
    let a = DataPointSet::generate(&config, &mut OracleRng::new(DEFAULT_SEED)).unwrap();
    let b = DataPointSet::generate(&config, &mut OracleRng::new(DEFAULT_SEED)).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.to_plain(), b.to_plain());
}

#[test]
fn consecutive_fixtures_share_one_stream() {
    let config = scenario_config();
    let mut rng = OracleRng::new(DEFAULT_SEED);
    let first = DataPointSet::generate(&config, &mut rng).unwrap();
    let second = DataPointSet::generate(&config, &mut rng).unwrap();
    assert_ne!(first.to_plain(), second.to_plain());

    // A whole run replays identically from the same seed.
    let mut replay = OracleRng::new(DEFAULT_SEED);
    assert_eq!(DataPointSet::generate(&config, &mut replay).unwrap(), first);
    assert_eq!(DataPointSet::generate(&config, &mut replay).unwrap(), second);
}

#[test]
fn shared_stream_matches_exclusive_stream() {
    let config = scenario_config();
    let shared = SharedRng::new(DEFAULT_SEED);
    let via_shared = shared
        .with(|rng| DataPointSet::generate(&config, rng))
        .unwrap();
    let direct = DataPointSet::generate(&config, &mut OracleRng::new(DEFAULT_SEED)).unwrap();
    assert_eq!(via_shared, direct);
}

#[test]
fn forked_streams_run_in_parallel_deterministically() {
    let base = OracleRng::new(DEFAULT_SEED);
    let run = |stream: u64| {
        let mut rng = base.fork(stream);
        let config = FixtureConfig {
            prefix: format!("s{stream}"),
            ..scenario_config()
        };
        DataPointSet::generate(&config, &mut rng).unwrap().to_plain()
    };

    let parallel: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|s| scope.spawn(move || run(s))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let sequential: Vec<String> = (0..4).map(run).collect();
    assert_eq!(parallel, sequential);
}

#[test]
fn configured_seed_and_start_drive_generation() {
    let run = |toml: &str| {
        let config = OracleConfig::from_toml_str(toml).unwrap();
        let fixture = FixtureConfig {
            metric_count: 16,
            ..FixtureConfig::from(&config.suite)
        };
        DataPointSet::generate(&fixture, &mut OracleRng::from_config(&config)).unwrap()
    };

    let a = run("[suite]\nseed = 1\nstart_ms = 5000\n");
    let b = run("[suite]\nseed = 2\nstart_ms = 5000\n");
    assert_ne!(a.to_plain(), b.to_plain());
    assert_eq!(a, run("[suite]\nseed = 1\nstart_ms = 5000\n"));
    assert_eq!(a.start(), 5000);
    assert!(a.points().iter().all(|p| p.timestamp() > 5000));

    // Without a [suite] section the documented defaults apply.
    let defaults = run("");
    assert_eq!(defaults.start(), 1_569_859_200_000);
    let expected = DataPointSet::generate(
        &FixtureConfig {
            start: 1_569_859_200_000,
            metric_count: 16,
            ..FixtureConfig::default()
        },
        &mut OracleRng::new(DEFAULT_SEED),
    )
    .unwrap();
    assert_eq!(defaults, expected);
}

#[test]
fn query_plan_targets_fixture_range() {
    let config = scenario_config();
    let set = DataPointSet::generate(&config, &mut OracleRng::new(DEFAULT_SEED)).unwrap();
    let plan = QueryPlan::new(&set, config.metric_cardinality, config.tag_cardinality);

    for query in plan.raw().iter().chain(plan.tag_filtered().iter()) {
        assert_eq!(query.start(), set.start());
        assert_eq!(query.end(), set.end());
        assert!(query.to_url_params().is_ok());
    }
}
