//! Diagnostics go to stderr; stdout carries nothing but protocol responses.

use crate::engine::{panic_message, record_panic_site};
use anyhow::{Context, Result, anyhow};
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Filter used when neither `--log-filter` nor `BOWTIE_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Install the global `tracing` subscriber.
///
/// # Errors
/// Returns an error if `filter` does not parse or a subscriber is already set.
pub fn init(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter '{filter}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing subscriber: {e}"))
}

/// Route panics through `tracing` so engine panics caught by the runner are
/// logged as structured events instead of raw stderr text. The panic site is
/// also kept for the `traceback` of the errored response.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        record_panic_site(info);
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(%location, "panic: {}", panic_message(info.payload()));
    }));
}
