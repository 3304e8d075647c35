//! Wire types for the harness protocol.
//!
//! Requests arrive as one JSON object per line and decode into the closed
//! `Request` enum; every payload is a typed struct, so a missing or malformed
//! field fails once, in `Request::decode`, instead of deep inside a handler.
//! Responses serialize to the exact envelopes the orchestrator reads.

use crate::engine::{EngineError, Failure};
use crate::error::HarnessError;
use crate::identity::Implementation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// The only protocol version this harness speaks.
pub const PROTOCOL_VERSION: u64 = 1;

/// URI → schema document map shipped with a test case.
pub type Registry = Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    Start(StartRequest),
    Dialect(DialectRequest),
    Run(RunRequest),
    Stop,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StartRequest {
    /// Kept as a raw number so `1.0` can be told apart from `1`.
    pub version: Number,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DialectRequest {
    pub dialect: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunRequest {
    /// Opaque; echoed back untouched.
    pub seq: Value,
    pub case: TestCase,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub schema: Value,
    #[serde(default)]
    pub registry: Option<Registry>,
    pub tests: Vec<TestInstance>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TestInstance {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    pub instance: Value,
    /// Expected verdict, when the orchestrator sends one. Never consulted.
    #[serde(default)]
    pub valid: Option<bool>,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Start(_) => "start",
            Request::Dialect(_) => "dialect",
            Request::Run(_) => "run",
            Request::Stop => "stop",
        }
    }

    /// Decode one input line. `line` is 1-based and only used for diagnostics.
    pub fn decode(line: usize, text: &str) -> Result<Self, HarnessError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|source| HarnessError::MalformedJson { line, source })?;
        let cmd = value
            .get("cmd")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(HarnessError::MissingCommand { line })?;

        match cmd.as_str() {
            "start" => payload(line, "start", value).map(Request::Start),
            "dialect" => payload(line, "dialect", value).map(Request::Dialect),
            "run" => payload(line, "run", value).map(Request::Run),
            "stop" => Ok(Request::Stop),
            _ => Err(HarnessError::UnknownCommand { line, cmd }),
        }
    }
}

fn payload<T: DeserializeOwned>(
    line: usize,
    cmd: &'static str,
    value: Value,
) -> Result<T, HarnessError> {
    serde_json::from_value(value).map_err(|source| HarnessError::InvalidRequest {
        line,
        cmd,
        source,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Started(StartedResponse),
    Dialect(DialectResponse),
    Run(RunResponse),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StartedResponse {
    pub ready: bool,
    pub version: u64,
    pub implementation: Implementation,
}

impl StartedResponse {
    pub fn new(implementation: Implementation) -> Self {
        Self {
            ready: true,
            version: PROTOCOL_VERSION,
            implementation,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DialectResponse {
    pub ok: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl From<String> for ErrorContext {
    fn from(message: String) -> Self {
        Self {
            message,
            traceback: None,
        }
    }
}

impl From<&str> for ErrorContext {
    fn from(message: &str) -> Self {
        Self::from(message.to_string())
    }
}

impl From<Failure> for ErrorContext {
    fn from(failure: Failure) -> Self {
        Self {
            message: failure.message,
            traceback: failure.traceback,
        }
    }
}

impl From<&EngineError> for ErrorContext {
    fn from(error: &EngineError) -> Self {
        Self {
            message: error.to_string(),
            traceback: error.traceback().map(str::to_owned),
        }
    }
}

/// Why a case or test was not run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SkipReason {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunResponse {
    Completed {
        seq: Value,
        results: Vec<TestResult>,
    },
    Errored {
        seq: Value,
        errored: bool,
        context: ErrorContext,
    },
    Skipped {
        seq: Value,
        skipped: bool,
        #[serde(flatten)]
        reason: SkipReason,
    },
}

impl RunResponse {
    pub fn errored(seq: Value, context: impl Into<ErrorContext>) -> Self {
        RunResponse::Errored {
            seq,
            errored: true,
            context: context.into(),
        }
    }

    pub fn skipped(seq: Value, reason: SkipReason) -> Self {
        RunResponse::Skipped {
            seq,
            skipped: true,
            reason,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TestResult {
    Executed {
        valid: bool,
    },
    Errored {
        errored: bool,
        context: ErrorContext,
    },
    Skipped {
        skipped: bool,
        #[serde(flatten)]
        reason: SkipReason,
    },
}

impl TestResult {
    pub fn executed(valid: bool) -> Self {
        TestResult::Executed { valid }
    }

    pub fn errored(context: impl Into<ErrorContext>) -> Self {
        TestResult::Errored {
            errored: true,
            context: context.into(),
        }
    }

    pub fn skipped(reason: SkipReason) -> Self {
        TestResult::Skipped {
            skipped: true,
            reason,
        }
    }
}
