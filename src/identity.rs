//! Implementation metadata reported in the `start` acknowledgement.
//!
//! The orchestrator only stores this for its reports; nothing here affects
//! later protocol behaviour. Engine facts come from the `Engine` adapter, host
//! facts are collected once at startup.

use crate::dialect::Dialect;
use serde::Serialize;
use std::env;
use std::process::Command;

const IMPLEMENTATION_LANGUAGE: &str = "rust";
const UNKNOWN: &str = "unknown";

/// Static description of a validator library, supplied by its adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub homepage: &'static str,
    pub documentation: &'static str,
    pub issues: &'static str,
    pub source: &'static str,
}

/// Host facts included with every start acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostInfo {
    pub os: String,
    pub os_version: String,
    pub language_version: String,
}

impl HostInfo {
    pub fn detect() -> Self {
        Self {
            os: detect_uname("-s").unwrap_or_else(|| env::consts::OS.to_string()),
            os_version: detect_uname("-r").unwrap_or_else(|| UNKNOWN.to_string()),
            language_version: option_env!("BOWTIE_RUSTC_VERSION")
                .unwrap_or(UNKNOWN)
                .to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Implementation {
    pub language: String,
    pub name: String,
    pub version: String,
    pub homepage: String,
    pub documentation: String,
    pub issues: String,
    pub source: String,
    pub dialects: Vec<String>,
    pub os: String,
    pub os_version: String,
    pub language_version: String,
}

impl Implementation {
    pub fn new(engine: &EngineInfo, dialects: &[Dialect], host: &HostInfo) -> Self {
        Self {
            language: IMPLEMENTATION_LANGUAGE.to_string(),
            name: engine.name.to_string(),
            version: engine.version.to_string(),
            homepage: engine.homepage.to_string(),
            documentation: engine.documentation.to_string(),
            issues: engine.issues.to_string(),
            source: engine.source.to_string(),
            dialects: dialects.iter().map(|d| d.uri().to_string()).collect(),
            os: host.os.clone(),
            os_version: host.os_version.clone(),
            language_version: host.language_version.clone(),
        }
    }
}

fn detect_uname(flag: &str) -> Option<String> {
    let output = Command::new("uname").arg(flag).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() { None } else { Some(stdout) }
}
