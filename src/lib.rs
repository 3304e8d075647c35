//! Bowtie harness adapter for the `jsonschema` crate.
//!
//! The orchestrator drives this process over stdin/stdout with one JSON
//! command per line (`start`, `dialect`, `run`, `stop`). The protocol core
//! (decoding, session state, case runner, transport) is generic over the
//! `Engine` trait; `JsonSchemaEngine` is the adapter that plugs the
//! `jsonschema` crate in.

pub mod dialect;
pub mod engine;
pub mod error;
pub mod identity;
pub mod logging;
pub mod protocol;
pub mod runner;
pub mod session;
pub mod skip_list;
pub mod transport;

pub use dialect::Dialect;
pub use engine::{Engine, EngineError, Failure, JsonSchemaEngine, Outcome};
pub use error::HarnessError;
pub use identity::{EngineInfo, HostInfo, Implementation};
pub use protocol::{Request, Response, RunResponse, TestCase, TestResult};
pub use session::{Reply, Session, State};
pub use skip_list::SkipList;
pub use transport::{Exit, serve};
