//! Known-issue skip list.
//!
//! Operators can hand the harness a JSON file naming test cases (by
//! description) or individual tests (by case and test description) that should
//! be reported as skipped instead of run, optionally only under some dialects.
//! The file carries a version marker and is validated strictly on load so a
//! typo in a dialect URI or a duplicated entry fails at startup rather than
//! silently running a case that was meant to be skipped.

use crate::dialect::Dialect;
use crate::protocol::SkipReason;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Version marker expected in skip list files.
pub const SKIP_LIST_VERSION: &str = "bowtie_skip_list_v1";

const DEFAULT_SKIP_MESSAGE: &str = "skipped";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SkipListFile {
    schema_version: String,
    #[serde(default)]
    cases: Vec<CaseSkip>,
    #[serde(default)]
    tests: Vec<TestSkip>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseSkip {
    description: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    issue_url: Option<String>,
    #[serde(default)]
    dialects: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestSkip {
    case: String,
    test: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    issue_url: Option<String>,
    #[serde(default)]
    dialects: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct SkipRule {
    reason: SkipReason,
    /// `None` applies under every dialect, including auto-detection.
    dialects: Option<BTreeSet<Dialect>>,
}

impl SkipRule {
    fn new(
        message: Option<String>,
        issue_url: Option<String>,
        dialects: Option<Vec<String>>,
    ) -> Result<Self> {
        let dialects = match dialects {
            None => None,
            Some(uris) if uris.is_empty() => bail!("'dialects' must not be empty when present"),
            Some(uris) => Some(
                uris.iter()
                    .map(|uri| Dialect::try_from(uri.as_str()))
                    .collect::<Result<BTreeSet<_>>>()?,
            ),
        };
        let message = match (&message, &issue_url) {
            (None, None) => Some(DEFAULT_SKIP_MESSAGE.to_string()),
            _ => message,
        };
        Ok(Self {
            reason: SkipReason { message, issue_url },
            dialects,
        })
    }

    fn applies(&self, dialect: Option<Dialect>) -> bool {
        match (&self.dialects, dialect) {
            (None, _) => true,
            (Some(allowed), Some(active)) => allowed.contains(&active),
            (Some(_), None) => false,
        }
    }
}

/// Indexed skip list. The default value skips nothing.
#[derive(Clone, Debug, Default)]
pub struct SkipList {
    cases: BTreeMap<String, Vec<SkipRule>>,
    tests: BTreeMap<(String, String), Vec<SkipRule>>,
}

impl SkipList {
    /// Read and validate a skip list file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading skip list {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("parsing skip list {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let file: SkipListFile = serde_json::from_str(data).context("invalid skip list JSON")?;
        if file.schema_version != SKIP_LIST_VERSION {
            bail!(
                "unsupported skip list version '{}', expected {}",
                file.schema_version,
                SKIP_LIST_VERSION
            );
        }

        let mut list = SkipList::default();
        for (idx, entry) in file.cases.into_iter().enumerate() {
            let rule = SkipRule::new(entry.message, entry.issue_url, entry.dialects)
                .with_context(|| format!("case skip #{} ('{}')", idx + 1, entry.description))?;
            insert_unique(&mut list.cases, entry.description.clone(), rule)
                .with_context(|| format!("case skip '{}'", entry.description))?;
        }
        for (idx, entry) in file.tests.into_iter().enumerate() {
            let rule = SkipRule::new(entry.message, entry.issue_url, entry.dialects)
                .with_context(|| {
                    format!("test skip #{} ('{}' / '{}')", idx + 1, entry.case, entry.test)
                })?;
            let key = (entry.case, entry.test);
            let label = format!("test skip '{}' / '{}'", key.0, key.1);
            insert_unique(&mut list.tests, key, rule).context(label)?;
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.cases.values().map(Vec::len).sum::<usize>()
            + self.tests.values().map(Vec::len).sum::<usize>()
    }

    /// Reason to skip a whole case, if any rule matches.
    pub fn case(&self, description: Option<&str>, dialect: Option<Dialect>) -> Option<SkipReason> {
        let rules = self.cases.get(description?)?;
        first_applicable(rules, dialect)
    }

    /// Reason to skip one test inside a case, if any rule matches.
    pub fn test(
        &self,
        case: Option<&str>,
        test: Option<&str>,
        dialect: Option<Dialect>,
    ) -> Option<SkipReason> {
        if self.tests.is_empty() {
            return None;
        }
        let key = (case?.to_string(), test?.to_string());
        let rules = self.tests.get(&key)?;
        first_applicable(rules, dialect)
    }
}

fn insert_unique<K: Ord>(
    index: &mut BTreeMap<K, Vec<SkipRule>>,
    key: K,
    rule: SkipRule,
) -> Result<()> {
    let rules = index.entry(key).or_default();
    if rules.iter().any(|existing| existing.dialects == rule.dialects) {
        bail!("duplicate skip entry");
    }
    rules.push(rule);
    Ok(())
}

fn first_applicable(rules: &[SkipRule], dialect: Option<Dialect>) -> Option<SkipReason> {
    rules
        .iter()
        .find(|rule| rule.applies(dialect))
        .map(|rule| rule.reason.clone())
}
