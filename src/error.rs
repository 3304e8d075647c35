//! Fatal harness errors.
//!
//! Everything here means the orchestrator and the harness have fallen out of
//! step (or the output channel is gone). These propagate to `main`, which
//! prints them and exits non-zero. Failures that belong to the data under test
//! (bad schemas, engine errors) never become a `HarnessError`; they are
//! reported inside a response instead.

use serde_json::Number;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// A line was not valid JSON.
    #[error("line {line}: malformed JSON request: {source}")]
    MalformedJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    /// The request parsed but was not an object with a string `cmd`.
    #[error("line {line}: request has no string 'cmd' field")]
    MissingCommand { line: usize },
    #[error("line {line}: unknown command '{cmd}'")]
    UnknownCommand { line: usize, cmd: String },
    /// Required fields were absent or had the wrong shape.
    #[error("line {line}: invalid '{cmd}' request: {source}")]
    InvalidRequest {
        line: usize,
        cmd: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported protocol version {0}; only version 1 is understood")]
    UnsupportedVersion(Number),
    #[error("'{cmd}' received before 'start'")]
    NotStarted { cmd: &'static str },
    #[error("'start' received twice")]
    AlreadyStarted,
    #[error("failed to read request: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write response: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize response: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}
