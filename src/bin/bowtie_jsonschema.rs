//! Harness entrypoint.
//!
//! Usage:
//!   bowtie-jsonschema [--skip-list known-issues.json] [--log-filter debug]
//!
//! Speaks the line-delimited JSON protocol on stdin/stdout until `stop` or end
//! of input (exit 0). Any protocol violation is printed to stderr and exits 1.

use anyhow::{Context, Result};
use bowtie_jsonschema::logging::{self, DEFAULT_LOG_FILTER};
use bowtie_jsonschema::{Exit, HostInfo, JsonSchemaEngine, Session, SkipList, serve};
use clap::Parser;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bowtie-jsonschema")]
#[command(about = "Bowtie harness for the jsonschema crate (line-delimited JSON on stdin/stdout)")]
struct Cli {
    /// JSON skip list naming known-bad cases or tests to report as skipped.
    #[arg(long, env = "BOWTIE_SKIP_LIST")]
    skip_list: Option<PathBuf>,
    /// tracing filter directive for stderr diagnostics.
    #[arg(long, env = "BOWTIE_LOG", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_filter)?;
    logging::install_panic_hook();

    let skips = match &cli.skip_list {
        Some(path) => SkipList::load(path)?,
        None => SkipList::default(),
    };

    let mut session = Session::new(JsonSchemaEngine::new(), HostInfo::detect(), skips);
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    let exit = serve(&mut reader, &mut writer, &mut session).context("harness protocol error")?;
    match exit {
        Exit::Stopped => info!("stopped by orchestrator"),
        Exit::EndOfInput => info!("input closed"),
    }
    Ok(())
}
