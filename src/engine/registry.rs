//! Per-case reference registry.
//!
//! A test case ships its remote documents as a URI → schema map. The index
//! stores each document under its key exactly as sent and under the key's
//! parsed URL form (fragment stripped), because engines hand resolvers a
//! normalized, fragment-free URL.
//!
//! `unresolved_references` is a pre-flight pass over the case schema: it
//! collects every `$ref`/`$dynamicRef` target and every declared `$id`/`id`
//! (resolving each against the enclosing base URI) and reports targets that
//! nothing can satisfy. Engines that resolve references lazily would otherwise
//! only notice a missing document while validating an instance.

use crate::protocol::Registry;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use url::Url;

/// Base URI given to the anonymous test-case schema.
pub const ROOT_SCHEMA_URI: &str = "json-schema:///";

// Meta-schemas under these hosts ship with the engines.
const BUNDLED_HOSTS: &[&str] = &["json-schema.org"];

// Keywords whose values are data, not subschemas.
const DATA_KEYWORDS: &[&str] = &["const", "enum", "examples", "default"];

const ID_KEYWORDS: &[&str] = &["$id", "id"];
const REF_KEYWORDS: &[&str] = &["$ref", "$dynamicRef"];

#[derive(Clone, Debug, Default)]
pub struct RegistryIndex {
    documents: HashMap<String, Arc<Value>>,
}

impl RegistryIndex {
    pub fn new(registry: &Registry) -> Self {
        let mut documents = HashMap::with_capacity(registry.len() * 2);
        for (uri, document) in registry {
            let document = Arc::new(document.clone());
            if let Ok(url) = Url::parse(uri) {
                documents.insert(resource_key(url), Arc::clone(&document));
            }
            documents.insert(uri.clone(), document);
        }
        Self { documents }
    }

    /// Look up the document for `url`, ignoring its fragment.
    pub fn get(&self, url: &Url) -> Option<Arc<Value>> {
        self.documents
            .get(&resource_key(url.clone()))
            .or_else(|| self.documents.get(url.as_str()))
            .cloned()
    }

    fn contains(&self, resource: &str) -> bool {
        self.documents.contains_key(resource)
    }

    /// Reference targets in `schema` that no registry entry, declared
    /// identifier or bundled meta-schema can satisfy, in sorted order.
    pub fn unresolved_references(&self, schema: &Value) -> Vec<String> {
        let Ok(root) = Url::parse(ROOT_SCHEMA_URI) else {
            return Vec::new();
        };

        let mut scan = ReferenceScan::default();
        scan.declared.insert(resource_key(root.clone()));
        scan.walk(schema, &root, true);

        // Registry documents may embed their own identifiers; their references
        // are only followed if the case schema reaches them, which the engine
        // will report itself.
        for (key, document) in &self.documents {
            if let Ok(base) = Url::parse(key) {
                scan.walk(document, &base, false);
            }
        }

        let resolvable = |target: &String| {
            scan.declared.contains(target) || self.contains(target) || is_bundled(target)
        };
        scan.referenced
            .iter()
            .filter(|candidates| !candidates.iter().any(resolvable))
            .filter_map(|candidates| candidates.first().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Default)]
struct ReferenceScan {
    declared: BTreeSet<String>,
    // Each reference with its candidate targets; any one resolving is enough.
    referenced: Vec<Vec<String>>,
}

impl ReferenceScan {
    fn walk(&mut self, value: &Value, base: &Url, collect_refs: bool) {
        match value {
            Value::Object(map) => {
                let outer = base;
                let mut base = base.clone();
                for keyword in ID_KEYWORDS {
                    if let Some(Value::String(id)) = map.get(*keyword) {
                        if let Ok(joined) = base.join(id) {
                            base = joined;
                            self.declared.insert(resource_key(base.clone()));
                        }
                    }
                }
                if collect_refs {
                    for keyword in REF_KEYWORDS {
                        if let Some(Value::String(reference)) = map.get(*keyword) {
                            // Drafts up to 7 ignore an `$id` sitting next to
                            // `$ref`, so the outer base is a candidate too.
                            let candidates: Vec<String> = [&base, outer]
                                .into_iter()
                                .filter_map(|b| b.join(reference).ok())
                                .map(resource_key)
                                .collect();
                            if !candidates.is_empty() {
                                self.referenced.push(candidates);
                            }
                        }
                    }
                }
                for (key, child) in map {
                    if DATA_KEYWORDS.contains(&key.as_str()) {
                        continue;
                    }
                    self.walk(child, &base, collect_refs);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, base, collect_refs);
                }
            }
            _ => {}
        }
    }
}

fn resource_key(mut url: Url) -> String {
    url.set_fragment(None);
    url.into()
}

fn is_bundled(resource: &str) -> bool {
    Url::parse(resource)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .is_some_and(|host| BUNDLED_HOSTS.contains(&host.as_str()))
}
