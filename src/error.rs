// src/error.rs
//! Error kinds surfaced by the report pipeline.
//!
//! Every oracle-side failure collapses into one "analysis failed" signal for the
//! operator; `ErrorKind` keeps the distinction for logs, metrics and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures between issuing a query and holding a canonical report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Network or backend failure while calling the generative-search function.
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),
    /// The call succeeded but carried no text.
    #[error("oracle returned an empty response")]
    OracleEmptyResponse,
    /// Text was present but did not contain a parseable report object.
    #[error("malformed oracle response: {0}")]
    MalformedOracleResponse(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::OracleUnavailable(_) => ErrorKind::OracleUnavailable,
            PipelineError::OracleEmptyResponse => ErrorKind::OracleEmptyResponse,
            PipelineError::MalformedOracleResponse(_) => ErrorKind::MalformedOracleResponse,
        }
    }
}

/// Discrete error tag exposed to consumers (`failed(errorKind)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    OracleUnavailable,
    OracleEmptyResponse,
    MalformedOracleResponse,
}

impl ErrorKind {
    /// Stable label for metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OracleUnavailable => "oracle_unavailable",
            ErrorKind::OracleEmptyResponse => "oracle_empty_response",
            ErrorKind::MalformedOracleResponse => "malformed_oracle_response",
        }
    }
}

/// Rejected report request; raised before anything is sent to the oracle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid report date `{0}` (expected YYYY-MM-DD)")]
    InvalidDate(String),
}
