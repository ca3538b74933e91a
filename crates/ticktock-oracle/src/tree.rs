//! Response trees: the JSON-shaped values both backends answer with.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::OracleError;

/// A recursively-typed response value.
///
/// Integers and floats are kept apart: `2` parses as [`ResponseTree::Int`],
/// `2.0` as [`ResponseTree::Float`], and the comparator never coerces one into
/// the other.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseTree {
    Seq(Vec<ResponseTree>),
    Map(BTreeMap<String, ResponseTree>),
    Float(f64),
    Int(i64),
    Str(String),
    Bool(bool),
    Null,
}

impl ResponseTree {
    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, OracleError> {
        serde_json::from_str::<serde_json::Value>(text)
            .map(Self::from)
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }

    pub fn empty_seq() -> Self {
        Self::Seq(Vec::new())
    }

    /// Short name of this node's variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
            Self::Float(_) => "float",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Null => "null",
        }
    }

    pub fn as_seq(&self) -> Option<&[ResponseTree]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ResponseTree>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up `key` when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&ResponseTree> {
        self.as_map().and_then(|entries| entries.get(key))
    }

    /// True for a series object that carries no data points:
    /// a mapping whose `dps` entry is an empty mapping or empty sequence.
    pub fn is_empty_series(&self) -> bool {
        match self.get("dps") {
            Some(Self::Map(dps)) => dps.is_empty(),
            Some(Self::Seq(dps)) => dps.is_empty(),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for ResponseTree {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                // u64 beyond i64::MAX and every non-integral number
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Str(s),
            Value::Array(items) => Self::Seq(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for ResponseTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<f64> for ResponseTree {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ResponseTree {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ResponseTree {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ResponseTree {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<ResponseTree>> for ResponseTree {
    fn from(items: Vec<ResponseTree>) -> Self {
        Self::Seq(items)
    }
}

impl From<BTreeMap<String, ResponseTree>> for ResponseTree {
    fn from(entries: BTreeMap<String, ResponseTree>) -> Self {
        Self::Map(entries)
    }
}

/// Compact JSON. Non-finite floats render as `null`.
impl fmt::Display for ResponseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
