//! Validation engine capability.
//!
//! The protocol core only needs two things from a validator library: compile a
//! schema (with the case registry and an optional dialect) and validate one
//! instance against the result. Each library plugs in as an `Engine` adapter;
//! the session, runner and transport are shared by all of them.

pub mod jsonschema_rs;
pub mod registry;

use crate::dialect::Dialect;
use crate::identity::EngineInfo;
use crate::protocol::Registry;
use serde_json::Value;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use thiserror::Error;

pub use jsonschema_rs::JsonSchemaEngine;
pub use registry::{ROOT_SCHEMA_URI, RegistryIndex};

/// What went wrong inside an engine, with optional diagnostic detail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    /// Panic backtrace or the engine's debug rendering of the error.
    pub traceback: Option<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(mut self, traceback: Option<String>) -> Self {
        self.traceback = traceback;
        self
    }
}

/// Verdict for one instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    Invalid,
    /// The engine failed for a reason other than the instance being invalid.
    Errored(Failure),
}

/// Compile-time failure; reported back as a run-level `errored` response.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid schema: {}", .0.message)]
    InvalidSchema(Failure),
    #[error("cannot resolve reference to '{uri}': it is not in the test case registry")]
    UnresolvedReference { uri: String },
    #[error("validator panicked: {}", .0.message)]
    Panicked(Failure),
}

impl EngineError {
    pub fn traceback(&self) -> Option<&str> {
        match self {
            EngineError::InvalidSchema(failure) | EngineError::Panicked(failure) => {
                failure.traceback.as_deref()
            }
            EngineError::UnresolvedReference { .. } => None,
        }
    }
}

pub trait Engine {
    type Compiled;

    fn info(&self) -> EngineInfo;

    /// Dialects this engine can compile, newest first.
    fn dialects(&self) -> &[Dialect];

    fn supports(&self, dialect: Dialect) -> bool {
        self.dialects().contains(&dialect)
    }

    /// Compile `schema`. With `dialect` unset the engine picks one itself
    /// (usually from `$schema`).
    fn compile(
        &self,
        schema: &Value,
        registry: &Registry,
        dialect: Option<Dialect>,
    ) -> Result<Self::Compiled, EngineError>;

    fn validate(&self, compiled: &Self::Compiled, instance: &Value) -> Outcome;
}

thread_local! {
    static PANIC_SITE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Remember where the current thread panicked so `guard` can report it.
/// Called from the process panic hook.
pub(crate) fn record_panic_site(info: &PanicHookInfo<'_>) {
    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "unknown location".to_string());
    let site = format!("panicked at {location}\n{}", Backtrace::force_capture());
    PANIC_SITE.with(|slot| *slot.borrow_mut() = Some(site));
}

/// Runs `f`, turning a panic into a `Failure`. The traceback is only known
/// when the panic hook recorded one.
pub(crate) fn guard<T>(f: impl FnOnce() -> T) -> Result<T, Failure> {
    PANIC_SITE.with(|slot| slot.borrow_mut().take());
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let traceback = PANIC_SITE.with(|slot| slot.borrow_mut().take());
        Failure::new(panic_message(payload.as_ref())).with_traceback(traceback)
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_passes_values_through() {
        assert_eq!(guard(|| 7), Ok(7));
    }

    #[test]
    fn guard_captures_panic_messages() {
        let static_message = guard(|| -> u8 { panic!("static message") }).unwrap_err();
        assert_eq!(static_message.message, "static message");

        let owned = guard(|| -> u8 { panic!("formatted {}", 42) }).unwrap_err();
        assert_eq!(owned.message, "formatted 42");
    }

    #[test]
    fn errors_expose_their_traceback() {
        let failure = Failure::new("bad keyword").with_traceback(Some("detail".to_string()));
        let error = EngineError::InvalidSchema(failure);
        assert_eq!(error.to_string(), "invalid schema: bad keyword");
        assert_eq!(error.traceback(), Some("detail"));

        let unresolved = EngineError::UnresolvedReference {
            uri: "urn:x".to_string(),
        };
        assert_eq!(unresolved.traceback(), None);
    }
}
