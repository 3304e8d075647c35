//! Line transport: read a request line, dispatch it, write the response line.
//!
//! Strictly lock-step. Every response is serialized onto a single line and
//! flushed before the next request is read, so the orchestrator never waits on
//! buffered output.

use crate::engine::Engine;
use crate::error::HarnessError;
use crate::protocol::{Request, Response};
use crate::session::{Reply, Session};
use std::io::{BufRead, Write};
use tracing::{debug, trace};

/// How the serve loop ended without a fatal error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// A `stop` command was processed.
    Stopped,
    /// The input stream closed.
    EndOfInput,
}

pub fn serve<E: Engine>(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    session: &mut Session<E>,
) -> Result<Exit, HarnessError> {
    let mut buf = String::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_line(&mut buf)
            .map_err(|source| HarnessError::Read { source })?;
        if read == 0 {
            debug!(lines = line_no, "input closed");
            return Ok(Exit::EndOfInput);
        }
        line_no += 1;

        let line = buf.trim();
        if line.is_empty() {
            continue;
        }

        let request = Request::decode(line_no, line)?;
        trace!(line = line_no, cmd = request.name(), "request");
        match session.handle(request)? {
            Reply::Respond(response) => write_response(writer, &response)?,
            Reply::Stop => return Ok(Exit::Stopped),
        }
    }
}

pub fn write_response(writer: &mut impl Write, response: &Response) -> Result<(), HarnessError> {
    let payload =
        serde_json::to_string(response).map_err(|source| HarnessError::Serialize { source })?;
    writer
        .write_all(payload.as_bytes())
        .map_err(|source| HarnessError::Write { source })?;
    writer
        .write_all(b"\n")
        .map_err(|source| HarnessError::Write { source })?;
    writer
        .flush()
        .map_err(|source| HarnessError::Write { source })
}
