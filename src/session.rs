//! Session state machine.
//!
//! One `Session` exists per process. It gates each command on the protocol
//! state (`start` exactly once, everything else only afterwards), owns the
//! active dialect, and hands `run` requests to the runner. Sequencing
//! violations are fatal and come back as `HarnessError`; data problems are
//! folded into the response.

use crate::dialect::Dialect;
use crate::engine::Engine;
use crate::error::HarnessError;
use crate::identity::{HostInfo, Implementation};
use crate::protocol::{
    DialectRequest, DialectResponse, PROTOCOL_VERSION, Request, Response, RunRequest,
    StartRequest, StartedResponse,
};
use crate::runner::run_case;
use crate::skip_list::SkipList;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    NotStarted,
    Started,
    Stopped,
}

/// What the transport should do after a request.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Respond(Response),
    Stop,
}

pub struct Session<E: Engine> {
    engine: E,
    host: HostInfo,
    skips: SkipList,
    state: State,
    dialect: Option<Dialect>,
}

impl<E: Engine> Session<E> {
    pub fn new(engine: E, host: HostInfo, skips: SkipList) -> Self {
        Self {
            engine,
            host,
            skips,
            state: State::NotStarted,
            dialect: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The dialect selected by the last accepted `dialect` command.
    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn handle(&mut self, request: Request) -> Result<Reply, HarnessError> {
        if !matches!(request, Request::Start(_)) {
            self.require_started(request.name())?;
        }
        match request {
            Request::Start(start) => self.start(start),
            Request::Dialect(dialect) => Ok(self.select_dialect(dialect)),
            Request::Run(run) => Ok(self.run(run)),
            Request::Stop => {
                info!("stop received");
                self.state = State::Stopped;
                Ok(Reply::Stop)
            }
        }
    }

    fn require_started(&self, cmd: &'static str) -> Result<(), HarnessError> {
        match self.state {
            State::Started => Ok(()),
            State::NotStarted | State::Stopped => Err(HarnessError::NotStarted { cmd }),
        }
    }

    fn start(&mut self, start: StartRequest) -> Result<Reply, HarnessError> {
        if self.state != State::NotStarted {
            return Err(HarnessError::AlreadyStarted);
        }
        if start.version.as_u64() != Some(PROTOCOL_VERSION) {
            return Err(HarnessError::UnsupportedVersion(start.version));
        }
        self.state = State::Started;

        let implementation =
            Implementation::new(&self.engine.info(), self.engine.dialects(), &self.host);
        info!(
            engine = %implementation.name,
            version = %implementation.version,
            skip_rules = self.skips.len(),
            "session started"
        );
        Ok(Reply::Respond(Response::Started(StartedResponse::new(
            implementation,
        ))))
    }

    fn select_dialect(&mut self, request: DialectRequest) -> Reply {
        let ok = match Dialect::from_uri(&request.dialect) {
            Some(dialect) if self.engine.supports(dialect) => {
                debug!(dialect = dialect.short_name(), "dialect selected");
                self.dialect = Some(dialect);
                true
            }
            Some(dialect) => {
                warn!(dialect = dialect.short_name(), "dialect not supported by engine");
                false
            }
            None => {
                warn!(uri = %request.dialect, "unknown dialect");
                false
            }
        };
        Reply::Respond(Response::Dialect(DialectResponse { ok }))
    }

    fn run(&self, request: RunRequest) -> Reply {
        let response = run_case(
            &self.engine,
            self.dialect,
            &self.skips,
            request.seq,
            &request.case,
        );
        Reply::Respond(Response::Run(response))
    }
}
