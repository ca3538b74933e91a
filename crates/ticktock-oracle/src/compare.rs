//! Structural comparison of response trees.
//!
//! # Comparison Rules
//!
//! - **Sequences**: equal length, then unordered multiset matching in both
//!   directions. The first equivalent element wins; no backtracking.
//! - **Empty sequences**: if either side is empty, the other side must be
//!   empty once empty series are discounted. `[{"dps":{}}]` matches `[]`.
//! - **Mappings**: equal key counts, every key present on both sides, values
//!   equivalent.
//! - **Floats**: `|expected - actual| <= tolerance` (absolute). NaN matches NaN.
//! - **Integers / strings**: exact.
//! - **Booleans / nulls**: never equivalent, reported as uncomparable.
//! - **Type mismatch**: never equivalent; ints and floats are not coerced.
//!
//! Every rule is symmetric, so `equivalent(a, b) == equivalent(b, a)`.

use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::tree::ResponseTree;

/// Absolute tolerance for float leaves.
pub const FLOAT_TOLERANCE: f64 = 0.000_000_000_12;

/// Float divergences smaller than this are flagged as near misses.
const NEAR_MISS: f64 = 0.001;

// ============================================================================
// Divergence
// ============================================================================

/// One step from the root of a response tree to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

/// Which operand a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Expected,
    Actual,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Side::Expected => Side::Actual,
            Side::Actual => Side::Expected,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Expected => write!(f, "expected"),
            Side::Actual => write!(f, "actual"),
        }
    }
}

/// What went wrong at the divergent node.
#[derive(Debug, Clone, PartialEq)]
pub enum DivergenceKind {
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    LengthMismatch {
        expected: usize,
        actual: usize,
    },
    KeyCountMismatch {
        expected: usize,
        actual: usize,
    },
    /// `key` is present on `side.other()` but missing from `side`.
    MissingKey {
        key: String,
        side: Side,
    },
    /// Element `index` of `side` has no equivalent on the other side.
    UnmatchedElement {
        side: Side,
        index: usize,
        /// Positional diff against the element at the same index, if any.
        closest: Option<Box<Divergence>>,
    },
    FloatMismatch {
        expected: f64,
        actual: f64,
        near_miss: bool,
    },
    IntMismatch {
        expected: i64,
        actual: i64,
    },
    StrMismatch {
        expected: String,
        actual: String,
    },
    /// Node type outside {sequence, mapping, float, integer, string}.
    Uncomparable {
        side: Side,
        type_name: &'static str,
    },
}

/// First point where two response trees stop being equivalent.
#[derive(Debug, Clone, PartialEq)]
pub struct Divergence {
    pub path: Vec<PathSegment>,
    pub kind: DivergenceKind,
}

impl Divergence {
    fn new(path: &[PathSegment], kind: DivergenceKind) -> Self {
        Self {
            path: path.to_vec(),
            kind,
        }
    }

    /// Renders the node path as `$[0]["dps"]["1000"]`.
    pub fn path_string(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            match segment {
                PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
                PathSegment::Key(k) => out.push_str(&format!("[{k:?}]")),
            }
        }
        out
    }

    /// Whether the divergence, or its closest positional diff, is a float near miss.
    pub fn is_near_miss(&self) -> bool {
        match &self.kind {
            DivergenceKind::FloatMismatch { near_miss, .. } => *near_miss,
            DivergenceKind::UnmatchedElement {
                closest: Some(inner),
                ..
            } => inner.is_near_miss(),
            _ => false,
        }
    }
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {expected}, actual {actual}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "length mismatch: expected {expected}, actual {actual}")
            }
            Self::KeyCountMismatch { expected, actual } => {
                write!(f, "key count mismatch: expected {expected}, actual {actual}")
            }
            Self::MissingKey { key, side } => {
                write!(f, "key {key:?} missing from {side}")
            }
            Self::UnmatchedElement {
                side,
                index,
                closest,
            } => {
                write!(
                    f,
                    "{side} element [{index}] has no equivalent in {}",
                    side.other()
                )?;
                if let Some(inner) = closest {
                    write!(f, " (same index differs at {inner})")?;
                }
                Ok(())
            }
            Self::FloatMismatch {
                expected,
                actual,
                near_miss,
            } => {
                write!(f, "float mismatch: expected {expected}, actual {actual}")?;
                if *near_miss {
                    write!(f, " [near miss, diff {}]", (expected - actual).abs())?;
                }
                Ok(())
            }
            Self::IntMismatch { expected, actual } => {
                write!(f, "integer mismatch: expected {expected}, actual {actual}")
            }
            Self::StrMismatch { expected, actual } => {
                write!(f, "string mismatch: expected {expected:?}, actual {actual:?}")
            }
            Self::Uncomparable { side, type_name } => {
                write!(f, "{side} holds uncomparable {type_name}")
            }
        }
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path_string(), self.kind)
    }
}

impl std::error::Error for Divergence {}

// ============================================================================
// Comparator
// ============================================================================

/// Structural comparator with a fixed float tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparator {
    tolerance: f64,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(FLOAT_TOLERANCE)
    }
}

impl Comparator {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Compares two trees, returning the first divergence found.
    pub fn compare(
        &self,
        expected: &ResponseTree,
        actual: &ResponseTree,
    ) -> Result<(), Divergence> {
        let mut path = Vec::new();
        self.compare_at(expected, actual, &mut path)
    }

    pub fn equivalent(&self, expected: &ResponseTree, actual: &ResponseTree) -> bool {
        self.compare(expected, actual).is_ok()
    }

    fn compare_at(
        &self,
        expected: &ResponseTree,
        actual: &ResponseTree,
        path: &mut Vec<PathSegment>,
    ) -> Result<(), Divergence> {
        use ResponseTree as T;

        match (expected, actual) {
            (T::Bool(_) | T::Null, _) => Err(Divergence::new(
                path,
                DivergenceKind::Uncomparable {
                    side: Side::Expected,
                    type_name: expected.type_name(),
                },
            )),
            (_, T::Bool(_) | T::Null) => Err(Divergence::new(
                path,
                DivergenceKind::Uncomparable {
                    side: Side::Actual,
                    type_name: actual.type_name(),
                },
            )),
            (T::Seq(e), T::Seq(a)) => self.compare_seqs(e, a, path),
            (T::Map(e), T::Map(a)) => self.compare_maps(e, a, path),
            (T::Float(e), T::Float(a)) => {
                if self.floats_match(*e, *a) {
                    Ok(())
                } else {
                    Err(Divergence::new(
                        path,
                        DivergenceKind::FloatMismatch {
                            expected: *e,
                            actual: *a,
                            near_miss: (e - a).abs() < NEAR_MISS,
                        },
                    ))
                }
            }
            (T::Int(e), T::Int(a)) if e == a => Ok(()),
            (T::Int(e), T::Int(a)) => Err(Divergence::new(
                path,
                DivergenceKind::IntMismatch {
                    expected: *e,
                    actual: *a,
                },
            )),
            (T::Str(e), T::Str(a)) if e == a => Ok(()),
            (T::Str(e), T::Str(a)) => Err(Divergence::new(
                path,
                DivergenceKind::StrMismatch {
                    expected: e.clone(),
                    actual: a.clone(),
                },
            )),
            _ => Err(Divergence::new(
                path,
                DivergenceKind::TypeMismatch {
                    expected: expected.type_name(),
                    actual: actual.type_name(),
                },
            )),
        }
    }

    fn floats_match(&self, expected: f64, actual: f64) -> bool {
        #[allow(clippy::float_cmp)]
        let identical = expected == actual;
        identical
            || (expected.is_nan() && actual.is_nan())
            || (expected - actual).abs() <= self.tolerance
    }

    fn compare_seqs(
        &self,
        expected: &[ResponseTree],
        actual: &[ResponseTree],
        path: &mut Vec<PathSegment>,
    ) -> Result<(), Divergence> {
        if expected.is_empty() || actual.is_empty() {
            let expected_len = non_empty_series_count(expected);
            let actual_len = non_empty_series_count(actual);
            if expected_len == 0 && actual_len == 0 {
                return Ok(());
            }
            return Err(Divergence::new(
                path,
                DivergenceKind::LengthMismatch {
                    expected: expected.len(),
                    actual: actual.len(),
                },
            ));
        }

        if expected.len() != actual.len() {
            return Err(Divergence::new(
                path,
                DivergenceKind::LengthMismatch {
                    expected: expected.len(),
                    actual: actual.len(),
                },
            ));
        }

        self.match_each(expected, actual, Side::Expected, path)?;
        self.match_each(actual, expected, Side::Actual, path)
    }

    /// Every element of `from` must have an equivalent somewhere in `into`.
    fn match_each(
        &self,
        from: &[ResponseTree],
        into: &[ResponseTree],
        side: Side,
        path: &mut Vec<PathSegment>,
    ) -> Result<(), Divergence> {
        for (index, item) in from.iter().enumerate() {
            let found = into.iter().any(|candidate| match side {
                Side::Expected => self.equivalent(item, candidate),
                Side::Actual => self.equivalent(candidate, item),
            });
            if found {
                continue;
            }

            path.push(PathSegment::Index(index));
            let closest = into.get(index).and_then(|positional| {
                let diff = match side {
                    Side::Expected => self.compare_at(item, positional, path),
                    Side::Actual => self.compare_at(positional, item, path),
                };
                diff.err().map(Box::new)
            });
            let divergence = Divergence::new(
                path,
                DivergenceKind::UnmatchedElement {
                    side,
                    index,
                    closest,
                },
            );
            path.pop();
            trace!(%divergence, "unmatched sequence element");
            return Err(divergence);
        }
        Ok(())
    }

    fn compare_maps(
        &self,
        expected: &BTreeMap<String, ResponseTree>,
        actual: &BTreeMap<String, ResponseTree>,
        path: &mut Vec<PathSegment>,
    ) -> Result<(), Divergence> {
        if expected.len() != actual.len() {
            return Err(Divergence::new(
                path,
                DivergenceKind::KeyCountMismatch {
                    expected: expected.len(),
                    actual: actual.len(),
                },
            ));
        }

        for (key, expected_value) in expected {
            let Some(actual_value) = actual.get(key) else {
                return Err(Divergence::new(
                    path,
                    DivergenceKind::MissingKey {
                        key: key.clone(),
                        side: Side::Actual,
                    },
                ));
            };
            path.push(PathSegment::Key(key.clone()));
            let result = self.compare_at(expected_value, actual_value, path);
            path.pop();
            result?;
        }

        if let Some(key) = actual.keys().find(|key| !expected.contains_key(*key)) {
            return Err(Divergence::new(
                path,
                DivergenceKind::MissingKey {
                    key: key.clone(),
                    side: Side::Expected,
                },
            ));
        }

        Ok(())
    }
}

fn non_empty_series_count(items: &[ResponseTree]) -> usize {
    items.iter().filter(|item| !item.is_empty_series()).count()
}

/// `true` iff `expected` and `actual` are equivalent under `tolerance`.
pub fn equivalent(expected: &ResponseTree, actual: &ResponseTree, tolerance: f64) -> bool {
    Comparator::new(tolerance).equivalent(expected, actual)
}

/// Strips series with no data points from a top-level sequence.
///
/// Some reference backends return `{"metric":..,"dps":{}}` for a sub-query
/// that matched nothing, where the system under test omits the series.
/// Non-sequence trees are returned unchanged.
pub fn normalize(expected: &ResponseTree) -> ResponseTree {
    match expected {
        ResponseTree::Seq(items) => ResponseTree::Seq(
            items
                .iter()
                .filter(|item| !item.is_empty_series())
                .cloned()
                .collect(),
        ),
        other => other.clone(),
    }
}
