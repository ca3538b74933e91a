//! Interfaces the transport layer implements for each backend.

use std::collections::BTreeMap;

use crate::checkpoint::Checkpoint;
use crate::tree::ResponseTree;
use crate::{OracleError, WriteFormat};

/// An encoded fixture ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub enum WritePayload {
    /// Concatenated `put ...\n` lines.
    LineProtocol(String),
    /// Structured JSON body.
    Json(serde_json::Value),
}

impl WritePayload {
    pub fn format(&self) -> WriteFormat {
        match self {
            Self::LineProtocol(_) => WriteFormat::Plain,
            Self::Json(_) => WriteFormat::Json,
        }
    }

    /// Bytes to put on the wire.
    pub fn body(&self) -> String {
        match self {
            Self::LineProtocol(text) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }
}

/// A rendered query, in one of the two request encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    /// Body for a structured (POST) query.
    Structured(ResponseTree),
    /// Flat parameters for a query-string (GET) query.
    UrlParams(BTreeMap<String, String>),
}

/// A time-series backend: either the system under test or the reference.
pub trait Backend {
    /// Returns the name of this backend (for logging).
    fn name(&self) -> &'static str;

    /// Submits an encoded fixture.
    fn submit(&mut self, payload: &WritePayload) -> Result<(), OracleError>;

    /// Executes one query and returns the parsed response.
    ///
    /// Implementations report HTTP error statuses as [`OracleError::Rejected`]
    /// and connection problems as [`OracleError::Transport`].
    fn query(&mut self, request: &QueryRequest) -> Result<ResponseTree, OracleError>;
}

/// Checkpoint administration, supported by the system under test only.
pub trait CheckpointBackend {
    /// Checkpoints for one leader, or for every leader when `leader` is `None`.
    fn get_checkpoint(&mut self, leader: Option<&str>) -> Result<ResponseTree, OracleError>;

    fn send_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), OracleError>;
}
