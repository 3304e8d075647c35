#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

pub fn harness_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_bowtie-jsonschema"))
}

/// Output of one harness process fed a fixed stdin transcript.
pub struct Transcript {
    pub output: Output,
    pub responses: Vec<Value>,
}

impl Transcript {
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.output.status.code()
    }
}

/// Feed `lines` to a fresh harness process and collect its responses.
pub fn run_harness(lines: &[Value], args: &[&str]) -> Result<Transcript> {
    let input = lines
        .iter()
        .map(|line| line.to_string() + "\n")
        .collect::<String>();
    run_harness_raw(&input, args)
}

pub fn run_harness_raw(input: &str, args: &[&str]) -> Result<Transcript> {
    let mut child = Command::new(harness_binary())
        .args(args)
        .env_remove("BOWTIE_SKIP_LIST")
        .env_remove("BOWTIE_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to spawn harness")?;

    let mut stdin = child.stdin.take().context("harness stdin unavailable")?;
    // The harness may exit before reading everything (stop, fatal errors).
    let _ = stdin.write_all(input.as_bytes());
    drop(stdin);

    let output = child
        .wait_with_output()
        .context("failed to wait for harness")?;
    let stdout = String::from_utf8(output.stdout.clone()).context("stdout is not UTF-8")?;
    let mut responses = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("response line {} is not JSON: {line}", idx + 1))?;
        if !value.is_object() {
            bail!("response line {} is not an object: {line}", idx + 1);
        }
        responses.push(value);
    }
    Ok(Transcript { output, responses })
}
