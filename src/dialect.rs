//! Dialect registry.
//!
//! Maps the dialect URIs the orchestrator sends (the meta-schema URIs of each
//! JSON Schema release) to a closed `Dialect` enum. Engine adapters translate
//! the enum into their own draft identifiers, so the protocol core never
//! handles engine types directly. Lookup is an exact string match: a URI that
//! differs by a trailing `#` or slash is a different, unknown dialect.

use anyhow::{Result, bail};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dialect {
    Draft4,
    Draft6,
    Draft7,
    Draft201909,
    Draft202012,
}

impl Dialect {
    pub fn uri(&self) -> &'static str {
        match self {
            Dialect::Draft4 => "http://json-schema.org/draft-04/schema#",
            Dialect::Draft6 => "http://json-schema.org/draft-06/schema#",
            Dialect::Draft7 => "http://json-schema.org/draft-07/schema#",
            Dialect::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Dialect::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Dialect::Draft4 => "draft4",
            Dialect::Draft6 => "draft6",
            Dialect::Draft7 => "draft7",
            Dialect::Draft201909 => "draft2019-09",
            Dialect::Draft202012 => "draft2020-12",
        }
    }

    /// Registry lookup. `None` is a recoverable miss, reported as `{ok: false}`.
    pub fn from_uri(uri: &str) -> Option<Self> {
        DIALECTS.iter().copied().find(|dialect| dialect.uri() == uri)
    }
}

impl TryFrom<&str> for Dialect {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self> {
        match Dialect::from_uri(value) {
            Some(dialect) => Ok(dialect),
            None => bail!("Unknown dialect: {value}"),
        }
    }
}

/// Every registered dialect, newest first; the start ack lists them in this
/// order.
pub const DIALECTS: &[Dialect] = &[
    Dialect::Draft202012,
    Dialect::Draft201909,
    Dialect::Draft7,
    Dialect::Draft6,
    Dialect::Draft4,
];
