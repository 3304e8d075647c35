//! `Engine` adapter for the `jsonschema` crate.
//!
//! The case schema is compiled under the engine's default root URI
//! (`ROOT_SCHEMA_URI`), with a resolver that serves registry documents. The
//! crate resolves remote references lazily, so a pre-flight reference scan
//! turns a missing registry entry into a compile error; anything the scan
//! cannot see still surfaces per instance as `Outcome::Errored`.

use super::registry::{ROOT_SCHEMA_URI, RegistryIndex};
use super::{Engine, EngineError, Failure, Outcome, guard};
use crate::dialect::{DIALECTS, Dialect};
use crate::identity::EngineInfo;
use crate::protocol::Registry;
use anyhow::anyhow;
use jsonschema::ValidationError;
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema, SchemaResolver, SchemaResolverError};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;


#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSchemaEngine;

impl JsonSchemaEngine {
    pub fn new() -> Self {
        Self
    }
}

fn draft_for(dialect: Dialect) -> Draft {
    match dialect {
        Dialect::Draft4 => Draft::Draft4,
        Dialect::Draft6 => Draft::Draft6,
        Dialect::Draft7 => Draft::Draft7,
        Dialect::Draft201909 => Draft::Draft201909,
        Dialect::Draft202012 => Draft::Draft202012,
    }
}

/// Serves the case registry to the engine.
struct CaseResolver {
    registry: RegistryIndex,
}

impl SchemaResolver for CaseResolver {
    fn resolve(
        &self,
        root_schema: &Value,
        url: &Url,
        _original_reference: &str,
    ) -> Result<Arc<Value>, SchemaResolverError> {
        if url.as_str() == ROOT_SCHEMA_URI {
            return Ok(Arc::new(root_schema.clone()));
        }
        self.registry
            .get(url)
            .ok_or_else(|| anyhow!("'{url}' is not in the test case registry"))
    }
}

impl Engine for JsonSchemaEngine {
    type Compiled = JSONSchema;

    fn info(&self) -> EngineInfo {
        EngineInfo {
            name: "jsonschema",
            version: option_env!("BOWTIE_JSONSCHEMA_VERSION").unwrap_or("unknown"),
            homepage: "https://docs.rs/jsonschema",
            documentation: "https://docs.rs/jsonschema",
            issues: "https://github.com/Stranger6667/jsonschema-rs/issues",
            source: "https://github.com/Stranger6667/jsonschema-rs",
        }
    }

    fn dialects(&self) -> &[Dialect] {
        DIALECTS
    }

    fn compile(
        &self,
        schema: &Value,
        registry: &Registry,
        dialect: Option<Dialect>,
    ) -> Result<JSONSchema, EngineError> {
        let index = RegistryIndex::new(registry);
        if let Some(uri) = index.unresolved_references(schema).into_iter().next() {
            return Err(EngineError::UnresolvedReference { uri });
        }
        debug!(
            registry_documents = registry.len(),
            dialect = dialect.map(|d| d.short_name()),
            "compiling case schema"
        );

        let mut options = JSONSchema::options();
        options.with_resolver(CaseResolver { registry: index });
        if let Some(dialect) = dialect {
            options.with_draft(draft_for(dialect));
        }

        guard(|| {
            options.compile(schema).map_err(|error| {
                Failure::new(error.to_string()).with_traceback(Some(format!("{error:?}")))
            })
        })
        .map_err(EngineError::Panicked)?
        .map_err(EngineError::InvalidSchema)
    }

    fn validate(&self, compiled: &JSONSchema, instance: &Value) -> Outcome {
        let verdict = guard(|| match compiled.validate(instance) {
            Ok(()) => Outcome::Valid,
            Err(errors) => {
                for error in errors {
                    if let Some(failure) = engine_failure(&error) {
                        return Outcome::Errored(failure);
                    }
                }
                Outcome::Invalid
            }
        });
        verdict.unwrap_or_else(|failure| {
            Outcome::Errored(Failure {
                message: format!("validator panicked: {}", failure.message),
                traceback: failure.traceback,
            })
        })
    }
}

/// Errors that mean the engine could not evaluate the instance at all, as
/// opposed to an assertion the instance failed.
fn engine_failure(error: &ValidationError<'_>) -> Option<Failure> {
    let message = match &error.kind {
        ValidationErrorKind::Resolver { url, error: source } => {
            format!("cannot resolve '{url}': {source}")
        }
        ValidationErrorKind::InvalidReference { .. }
        | ValidationErrorKind::InvalidURL { .. }
        | ValidationErrorKind::UnknownReferenceScheme { .. }
        | ValidationErrorKind::FileNotFound { .. }
        | ValidationErrorKind::JSONParse { .. }
        | ValidationErrorKind::Utf8 { .. }
        | ValidationErrorKind::FromUtf8 { .. }
        | ValidationErrorKind::BacktrackLimitExceeded { .. } => error.to_string(),
        _ => return None,
    };
    Some(Failure::new(message).with_traceback(Some(format!("{error:?}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcomes(schema: Value, registry: Value, instances: &[Value]) -> Vec<Outcome> {
        let engine = JsonSchemaEngine::new();
        let Value::Object(registry) = registry else {
            panic!("registry fixture must be an object");
        };
        let compiled = engine
            .compile(&schema, &registry, None)
            .expect("schema compiles");
        instances
            .iter()
            .map(|instance| engine.validate(&compiled, instance))
            .collect()
    }

    #[test]
    fn type_keyword_distinguishes_valid_and_invalid() {
        assert_eq!(
            outcomes(json!({"type": "integer"}), json!({}), &[json!(5), json!("x")]),
            vec![Outcome::Valid, Outcome::Invalid]
        );
    }

    #[test]
    fn registry_documents_back_references() {
        assert_eq!(
            outcomes(
                json!({"$ref": "urn:ref"}),
                json!({"urn:ref": {"type": "boolean"}}),
                &[json!(true), json!(1)],
            ),
            vec![Outcome::Valid, Outcome::Invalid]
        );
    }

    #[test]
    fn remote_http_reference_with_pointer() {
        assert_eq!(
            outcomes(
                json!({"$ref": "http://localhost:1234/draft7/subSchemas.json#/definitions/integer"}),
                json!({
                    "http://localhost:1234/draft7/subSchemas.json": {
                        "definitions": {"integer": {"type": "integer"}}
                    }
                }),
                &[json!(1), json!("a")],
            ),
            vec![Outcome::Valid, Outcome::Invalid]
        );
    }

    #[test]
    fn unknown_type_fails_compilation() {
        let engine = JsonSchemaEngine::new();
        let error = engine
            .compile(&json!({"type": "this-is-not-a-type"}), &Registry::new(), None)
            .expect_err("compile should fail");
        assert!(matches!(error, EngineError::InvalidSchema(_)));
        assert!(error.to_string().starts_with("invalid schema: "));
        assert!(error.traceback().is_some_and(|detail| !detail.is_empty()));
    }

    #[test]
    fn missing_registry_entry_fails_compilation() {
        let engine = JsonSchemaEngine::new();
        let error = engine
            .compile(&json!({"$ref": "urn:missing"}), &Registry::new(), None)
            .expect_err("compile should fail");
        assert_eq!(
            error,
            EngineError::UnresolvedReference {
                uri: "urn:missing".to_string()
            }
        );
    }

    #[test]
    fn dangling_local_pointer_is_an_engine_error() {
        let results = outcomes(
            json!({"$ref": "#/definitions/missing"}),
            json!({}),
            &[json!(1)],
        );
        let [Outcome::Errored(failure)] = results.as_slice() else {
            panic!("expected one errored outcome, got {results:?}");
        };
        assert!(failure.message.contains("definitions/missing"), "{}", failure.message);
        assert!(failure.traceback.is_some());
    }

    #[test]
    fn failed_assertions_stay_invalid() {
        assert_eq!(
            outcomes(
                json!({"definitions": {"s": {"type": "string"}}, "$ref": "#/definitions/s"}),
                json!({}),
                &[json!("ok"), json!(1)],
            ),
            vec![Outcome::Valid, Outcome::Invalid]
        );
    }

    #[test]
    fn explicit_dialect_overrides_detection() {
        let engine = JsonSchemaEngine::new();
        // `prefixItems` only exists from 2020-12 on; draft 7 ignores it.
        let schema = json!({"prefixItems": [{"type": "integer"}]});
        let instance = json!(["not an integer"]);

        let modern = engine
            .compile(&schema, &Registry::new(), Some(Dialect::Draft202012))
            .expect("compiles");
        assert_eq!(engine.validate(&modern, &instance), Outcome::Invalid);

        let legacy = engine
            .compile(&schema, &Registry::new(), Some(Dialect::Draft7))
            .expect("compiles");
        assert_eq!(engine.validate(&legacy, &instance), Outcome::Valid);
    }

    #[test]
    fn boolean_schemas_compile() {
        assert_eq!(
            outcomes(json!(false), json!({}), &[json!(1), json!(null)]),
            vec![Outcome::Invalid, Outcome::Invalid]
        );
        assert_eq!(outcomes(json!(true), json!({}), &[json!({})]), vec![Outcome::Valid]);
    }

    #[test]
    fn supports_every_registered_dialect() {
        let engine = JsonSchemaEngine::new();
        for &dialect in crate::dialect::DIALECTS {
            assert!(engine.supports(dialect), "{dialect:?} unsupported");
        }
        assert_eq!(engine.info().name, "jsonschema");
    }
}
