//! Differential runner: one reference, one system under test.
//!
//! For every query the runner asks the reference first, then the system
//! under test, and compares the two responses. Mismatches are data: they are
//! tallied and logged, never raised.

use std::fmt;

use tracing::{debug, info, warn};

use crate::backend::{Backend, CheckpointBackend, QueryRequest};
use crate::checkpoint::{Checkpoint, CheckpointLedger};
use crate::compare::{Comparator, Divergence, normalize};
use crate::fixture::DataPointSet;
use crate::query::Query;
use crate::tree::ResponseTree;
use crate::{OracleConfig, OracleError, QueryMethod, WriteFormat};

/// How the runner talks to the system under test and judges responses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerOptions {
    /// Encoding for fixture submission to the system under test.
    pub write_format: WriteFormat,

    /// Encoding for queries to the system under test.
    pub query_method: QueryMethod,

    pub comparator: Comparator,

    /// Strip empty series from reference responses before comparing.
    pub normalize_empty_series: bool,

    /// Skip rate conversions combined with cross-series aggregation.
    pub skip_rate_with_aggregation: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self::from(&OracleConfig::default())
    }
}

impl From<&OracleConfig> for RunnerOptions {
    fn from(config: &OracleConfig) -> Self {
        Self {
            write_format: config.submit.format,
            query_method: config.query.method,
            comparator: Comparator::new(config.compare.float_tolerance),
            normalize_empty_series: config.compare.normalize_empty_series,
            skip_rate_with_aggregation: config.compare.skip_rate_with_aggregation,
        }
    }
}

// ============================================================================
// Verdicts
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Both backends answered and the answers differ.
    Divergence(Divergence),
    /// A backend could not be asked or did not answer.
    Backend {
        backend: &'static str,
        message: String,
    },
    /// The query could not be rendered for the system under test.
    Render(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Divergence(divergence) => write!(f, "{divergence}"),
            Self::Backend { backend, message } => write!(f, "{backend} failed: {message}"),
            Self::Render(message) => write!(f, "cannot render query: {message}"),
        }
    }
}

/// One failed check, with enough context to replay it.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Compact JSON of the query, or a description of the checkpoint check.
    pub subject: String,
    pub reason: FailureReason,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FAIL] {}: {}", self.subject, self.reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Rate-then-aggregate order differs between backends.
    RateWithAggregation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    Fail(Failure),
    Skipped(SkipReason),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Pass/fail/skip counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.passed + self.failed + self.skipped
    }

    pub fn merge(&mut self, other: &Tally) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    fn record(&mut self, verdict: &Verdict) {
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail(_) => self.failed += 1,
            Verdict::Skipped(_) => self.skipped += 1,
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PASSED: {}; FAILED: {}; SKIPPED: {}; TOTAL: {}",
            self.passed,
            self.failed,
            self.skipped,
            self.total()
        )
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Runs queries against a reference and a system under test.
pub struct DifferentialRunner<R: Backend, S: Backend> {
    /// Reference backend (ground truth)
    reference: R,

    /// System under test
    sut: S,

    options: RunnerOptions,

    tally: Tally,

    /// Last failure (for triage)
    last_failure: Option<Failure>,

    /// Checkpoints sent through this runner
    ledger: CheckpointLedger,
}

impl<R: Backend, S: Backend> DifferentialRunner<R, S> {
    pub fn new(reference: R, sut: S) -> Self {
        Self::with_options(reference, sut, RunnerOptions::default())
    }

    pub fn with_options(reference: R, sut: S, options: RunnerOptions) -> Self {
        Self {
            reference,
            sut,
            options,
            tally: Tally::default(),
            last_failure: None,
            ledger: CheckpointLedger::new(),
        }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    pub fn reference(&self) -> &R {
        &self.reference
    }

    pub fn sut(&self) -> &S {
        &self.sut
    }

    /// Submits a fixture to the reference (JSON array) and then to the
    /// system under test (configured format).
    pub fn submit(&mut self, fixture: &DataPointSet) -> Result<(), OracleError> {
        debug!(
            prefix = fixture.prefix(),
            points = fixture.len(),
            reference = self.reference.name(),
            sut = self.sut.name(),
            "submitting fixture"
        );
        self.reference.submit(&fixture.reference_payload())?;
        self.sut.submit(&fixture.encode(self.options.write_format))
    }

    /// Asks both backends and compares their answers.
    ///
    /// A reference that rejects the query is treated as answering `[]`.
    pub fn query_and_verify(&mut self, query: &Query) -> Verdict {
        let verdict = self.evaluate(query);
        self.conclude(query.to_string(), verdict)
    }

    /// Verifies every query; returns the tally for this batch only.
    pub fn verify_all<'a>(&mut self, queries: impl IntoIterator<Item = &'a Query>) -> Tally {
        let mut batch = Tally::default();
        for query in queries {
            let verdict = self.query_and_verify(query);
            batch.record(&verdict);
        }
        batch
    }

    fn evaluate(&mut self, query: &Query) -> Verdict {
        if self.options.skip_rate_with_aggregation && query.is_rate_aggregated() {
            return Verdict::Skipped(SkipReason::RateWithAggregation);
        }

        let reference_request = QueryRequest::Structured(query.to_structured());
        let expected = match self.reference.query(&reference_request) {
            Ok(tree) => tree,
            Err(OracleError::Rejected { status, message }) => {
                debug!(status, %message, "reference rejected query, expecting no data");
                ResponseTree::empty_seq()
            }
            Err(e) => return backend_failure(query, self.reference.name(), &e),
        };

        let sut_request = match self.options.query_method {
            QueryMethod::Post => reference_request,
            QueryMethod::Get => match query.to_url_params() {
                Ok(params) => QueryRequest::UrlParams(params),
                Err(e) => {
                    return Verdict::Fail(Failure {
                        subject: query.to_string(),
                        reason: FailureReason::Render(e.to_string()),
                    });
                }
            },
        };
        let actual = match self.sut.query(&sut_request) {
            Ok(tree) => tree,
            Err(e) => return backend_failure(query, self.sut.name(), &e),
        };

        self.judge(&expected, &actual, query.to_string())
    }

    fn judge(&self, expected: &ResponseTree, actual: &ResponseTree, subject: String) -> Verdict {
        let normalized;
        let expected = if self.options.normalize_empty_series {
            normalized = normalize(expected);
            &normalized
        } else {
            expected
        };

        match self.options.comparator.compare(expected, actual) {
            Ok(()) => Verdict::Pass,
            Err(divergence) => {
                warn!(
                    path = %divergence.path_string(),
                    near_miss = divergence.is_near_miss(),
                    %expected,
                    %actual,
                    "responses diverge"
                );
                Verdict::Fail(Failure {
                    subject,
                    reason: FailureReason::Divergence(divergence),
                })
            }
        }
    }

    fn conclude(&mut self, subject: String, verdict: Verdict) -> Verdict {
        self.tally.record(&verdict);
        match &verdict {
            Verdict::Pass => debug!(%subject, "pass"),
            Verdict::Skipped(reason) => info!(%subject, ?reason, "skipped"),
            Verdict::Fail(failure) => {
                warn!(%failure, "check failed");
                self.last_failure = Some(failure.clone());
            }
        }
        verdict
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn last_failure(&self) -> Option<&Failure> {
        self.last_failure.as_ref()
    }

    pub fn ledger(&self) -> &CheckpointLedger {
        &self.ledger
    }

    /// Clears counters, the last failure and the checkpoint ledger.
    pub fn reset(&mut self) {
        self.tally = Tally::default();
        self.last_failure = None;
        self.ledger = CheckpointLedger::new();
    }
}

impl<R: Backend, S: Backend + CheckpointBackend> DifferentialRunner<R, S> {
    /// Sends a checkpoint to the system under test and records it.
    pub fn send_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), OracleError> {
        self.sut.send_checkpoint(checkpoint)?;
        self.ledger.record(checkpoint);
        Ok(())
    }

    /// Compares the system's checkpoint view with what was sent.
    pub fn verify_checkpoint(&mut self, leader: Option<&str>) -> Verdict {
        let subject = format!("checkpoint leader={}", leader.unwrap_or("*"));
        let expected = self.ledger.expected(leader);
        let verdict = match self.sut.get_checkpoint(leader) {
            Ok(actual) => self.judge(&expected, &actual, subject.clone()),
            Err(e) => Verdict::Fail(Failure {
                subject: subject.clone(),
                reason: FailureReason::Backend {
                    backend: self.sut.name(),
                    message: e.to_string(),
                },
            }),
        };
        self.conclude(subject, verdict)
    }
}

fn backend_failure(query: &Query, backend: &'static str, error: &OracleError) -> Verdict {
    Verdict::Fail(Failure {
        subject: query.to_string(),
        reason: FailureReason::Backend {
            backend,
            message: error.to_string(),
        },
    })
}
