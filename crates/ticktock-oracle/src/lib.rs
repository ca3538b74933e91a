//! # TickTock Differential Oracle
//!
//! This crate decides whether the TickTock time-series database answers
//! queries the same way a trusted reference TSDB does.
//!
//! ## Architecture
//!
//! - **[`DataPointSet`]**: reproducible synthetic fixtures (in-order,
//!   out-of-order, sparse) drawn from an explicit [`OracleRng`] stream
//! - **[`Query`]**: one abstract time-series query, rendered either as a
//!   structured body or as the compact URL grammar
//! - **[`Comparator`]**: structural equivalence of two [`ResponseTree`]s
//!   with unordered sequence matching and absolute float tolerance
//! - **[`DifferentialRunner`]**: submits fixtures and queries to both
//!   [`Backend`]s and tallies verdicts
//!
//! Transports, process lifecycle and CLI parsing live outside this crate;
//! they plug in by implementing [`Backend`] and [`CheckpointBackend`].
//!
//! ## Usage
//!
//! ```rust
//! use ticktock_oracle::{DataPointSet, FixtureConfig, OracleRng, Query};
//!
//! let mut rng = OracleRng::new(ticktock_oracle::DEFAULT_SEED);
//! let config = FixtureConfig { prefix: "t".to_string(), start: 1000, ..Default::default() };
//! let fixture = DataPointSet::generate(&config, &mut rng)?;
//!
//! let query = Query::new("t_metric_1", fixture.start()).with_end(fixture.end());
//! let body = query.to_structured();
//! assert!(body.get("queries").is_some());
//! # Ok::<(), ticktock_oracle::OracleError>(())
//! ```
//!
//! ## Comparison Semantics
//!
//! 1. **Sequences** are unordered multisets, matched in both directions
//! 2. **Mappings** must have identical key sets
//! 3. **Floats** match within `0.00000000012` absolute
//! 4. **Integers and strings** match exactly, with no cross-type coercion
//! 5. **Empty series** (`{"dps":{}}`) count as absent

pub mod backend;
pub mod checkpoint;
pub mod compare;
pub mod datapoint;
pub mod fixture;
pub mod query;
pub mod rng;
pub mod runner;
pub mod scenarios;
pub mod telemetry;
pub mod tree;


pub use backend::{Backend, CheckpointBackend, QueryRequest, WritePayload};
pub use checkpoint::{Checkpoint, CheckpointLedger};
pub use compare::{
    Comparator, Divergence, DivergenceKind, FLOAT_TOLERANCE, PathSegment, Side, equivalent,
    normalize,
};
pub use datapoint::DataPoint;
pub use fixture::{DataPointSet, FixtureConfig};
pub use query::{
    Aggregator, DownsampleFunction, DownsampleInterval, Downsampler, FillPolicy, Query,
    RateOptions, TimeUnit,
};
pub use rng::{DEFAULT_SEED, OracleRng, SharedRng};
pub use runner::{
    DifferentialRunner, Failure, FailureReason, RunnerOptions, SkipReason, Tally,
    Verdict,
};
pub use scenarios::{
    AGGREGATORS, DOWNSAMPLE_FUNCTIONS, QueryPlan, ROLLUP_FUNCTIONS, pattern_fixture, pattern_metric,
};
pub use tree::ResponseTree;

pub use ticktock_oracle_config::{OracleConfig, QueryMethod, SuiteConfig, WriteFormat};

// ============================================================================
// Oracle Error Types
// ============================================================================

/// Errors raised by the oracle core and by backend implementations.
///
/// Comparison divergences are not errors; see [`Divergence`].
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Fixture parameters outside the generator's domain.
    #[error("Invalid fixture parameters: {0}")]
    Generation(String),

    /// Query cannot be rendered (bad downsampler, unsafe URL characters).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Connection-level failure reported by a backend.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with an error status.
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Backend answered with a body that is not a response tree.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend cannot execute this kind of request.
    #[error("Unsupported request: {0}")]
    Unsupported(String),
}
