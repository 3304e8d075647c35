//! Runs one test case: skip check, compile, then validate every instance.

use crate::dialect::Dialect;
use crate::engine::{Engine, Outcome};
use crate::protocol::{Registry, RunResponse, TestCase, TestResult};
use crate::skip_list::SkipList;
use serde_json::Value;
use tracing::{debug, warn};

pub fn run_case<E: Engine>(
    engine: &E,
    dialect: Option<Dialect>,
    skips: &SkipList,
    seq: Value,
    case: &TestCase,
) -> RunResponse {
    let case_name = case.description.as_deref();

    if let Some(reason) = skips.case(case_name, dialect) {
        debug!(?seq, case = case_name, "skipping case");
        return RunResponse::skipped(seq, reason);
    }

    let empty = Registry::new();
    let registry = case.registry.as_ref().unwrap_or(&empty);
    let compiled = match engine.compile(&case.schema, registry, dialect) {
        Ok(compiled) => compiled,
        Err(error) => {
            debug!(?seq, case = case_name, %error, "schema failed to compile");
            return RunResponse::errored(seq, &error);
        }
    };

    let results = case
        .tests
        .iter()
        .map(|test| {
            let test_name = test.description.as_deref();
            if let Some(reason) = skips.test(case_name, test_name, dialect) {
                debug!(?seq, case = case_name, test = test_name, "skipping test");
                return TestResult::skipped(reason);
            }
            match engine.validate(&compiled, &test.instance) {
                Outcome::Valid => TestResult::executed(true),
                Outcome::Invalid => TestResult::executed(false),
                Outcome::Errored(failure) => {
                    warn!(
                        ?seq,
                        case = case_name,
                        test = test_name,
                        message = %failure.message,
                        "validation errored"
                    );
                    TestResult::errored(failure)
                }
            }
        })
        .collect();

    RunResponse::Completed { seq, results }
}
