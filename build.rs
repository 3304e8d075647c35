use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

const ENGINE_CRATE: &str = "jsonschema";

#[derive(Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

fn main() {
    println!("cargo:rerun-if-changed=Cargo.lock");
    println!("cargo:rerun-if-env-changed=RUSTC");

    if let Some(version) = locked_engine_version() {
        println!("cargo:rustc-env=BOWTIE_JSONSCHEMA_VERSION={version}");
    }

    if let Some(version) = rustc_version() {
        println!("cargo:rustc-env=BOWTIE_RUSTC_VERSION={version}");
    }
}

fn locked_engine_version() -> Option<String> {
    let manifest_dir = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
    let raw = fs::read_to_string(manifest_dir.join("Cargo.lock")).ok()?;
    let lockfile: Lockfile = toml::from_str(&raw).ok()?;
    lockfile
        .package
        .into_iter()
        .find(|package| package.name == ENGINE_CRATE)
        .map(|package| package.version)
}

// `rustc 1.85.0 (4d91de4e4 2025-02-17)` -> `1.85.0`
fn rustc_version() -> Option<String> {
    let rustc = env::var_os("RUSTC").unwrap_or_else(|| "rustc".into());
    let output = Command::new(rustc).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
        .filter(|version| !version.is_empty())
}
