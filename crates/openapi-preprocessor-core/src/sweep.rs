//! Garbage collection of declared components unreachable from `/paths`.
//!
//! Runs after expansion, when every `$ref` is a local fragment pointer.
//! Components are the direct children of the dialect's declaration
//! containers; anything not reached by a `$ref` chain rooted under
//! `/paths` is deleted, and emptied containers are dropped afterwards.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};

use crate::error::PreprocessError;
use crate::pointer;
use crate::visitor::{self, RefVisitor};

/// Component containers of a Swagger 2.0 document.
const SWAGGER_CONTAINERS: &[&str] = &["/definitions", "/parameters", "/responses"];

/// Component sections under `/components` in an OpenAPI 3.x document.
const OPENAPI_SECTIONS: &[&str] = &[
    "schemas",
    "parameters",
    "responses",
    "examples",
    "requestBodies",
    "headers",
    "securitySchemes",
    "links",
    "callbacks",
];

/// Delete declared components that no `$ref` chain starting under
/// `/paths` reaches, then drop any declaration container (and
/// `/components` itself) left empty.
///
/// Expects an expanded document: every `$ref` must start with `#`.
pub fn clean_unused(root: &mut Value) -> Result<(), PreprocessError> {
    let containers = {
        let Value::Object(map) = &*root else {
            return Err(PreprocessError::Invariant {
                message: "root is not an object".to_string(),
            });
        };
        dialect_containers(map)
    };

    if root.get("paths").is_some() {
        let mut unused = BTreeSet::new();
        for container in &containers {
            let Ok(Value::Object(entries)) = pointer::get(root, container) else {
                continue;
            };
            for key in entries.keys() {
                unused.insert(pointer::append(container, key));
            }
        }

        let (unused, visited) = {
            let mut reach = Reach {
                root: &*root,
                unused,
                visited: HashSet::new(),
            };
            let paths_node = pointer::get(root, "/paths").map_err(|e| {
                PreprocessError::Invariant {
                    message: format!("/paths: {e}"),
                }
            })?;
            let mut ptr = String::from("/paths");
            visitor::visit_refs_shared(paths_node, &mut ptr, &mut reach)?;
            (reach.unused, reach.visited)
        };

        for component in unused {
            // A reference into the component's interior keeps it alive
            // even when the component-level pointer was never hit.
            let interior = format!("{component}/");
            if visited.iter().any(|seen| seen.starts_with(&interior)) {
                continue;
            }
            pointer::delete(root, &component).map_err(|e| PreprocessError::Invariant {
                message: format!("{component}: {e}"),
            })?;
        }
    }

    for container in &containers {
        remove_empty_object(root, container);
    }
    remove_empty_object(root, "/components");
    Ok(())
}

/// Pick the declaration containers for the document's dialect.
fn dialect_containers(root: &Map<String, Value>) -> Vec<String> {
    if root.get("swagger").is_some_and(Value::is_string) {
        SWAGGER_CONTAINERS.iter().map(|c| c.to_string()).collect()
    } else if root.get("openapi").is_some_and(Value::is_string) {
        OPENAPI_SECTIONS
            .iter()
            .map(|section| format!("/components/{section}"))
            .collect()
    } else {
        Vec::new()
    }
}

/// Reachability walk: follows every local `$ref` from `/paths`, removing
/// hit pointers from `unused` and recursing into each target once.
struct Reach<'a> {
    root: &'a Value,
    unused: BTreeSet<String>,
    visited: HashSet<String>,
}

impl RefVisitor for Reach<'_> {
    fn visit(&mut self, ptr: &str, reference: &str) -> Result<(), PreprocessError> {
        let Some(link) = reference.strip_prefix('#') else {
            return Err(PreprocessError::Invariant {
                message: format!("{ptr}: unexpected $ref {reference:?}"),
            });
        };
        self.unused.remove(link);
        if !self.visited.insert(link.to_string()) {
            return Ok(());
        }
        let root = self.root;
        let target = pointer::get(root, link).map_err(|e| PreprocessError::Invariant {
            message: format!("{ptr}: $ref {reference:?}: {e}"),
        })?;
        let mut target_ptr = link.to_string();
        visitor::visit_refs_shared(target, &mut target_ptr, self)
    }
}

/// Drop the entry at `ptr` when its parent is a non-empty mapping and the
/// entry itself is an empty mapping.
fn remove_empty_object(root: &mut Value, ptr: &str) {
    let Ok(segments) = pointer::parse(ptr) else {
        return;
    };
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let Ok(Value::Object(parent)) = pointer::get_mut(root, &pointer::join(parents)) else {
        return;
    };
    if parent.is_empty() {
        return;
    }
    if matches!(parent.get(last.as_str()), Some(Value::Object(entry)) if entry.is_empty()) {
        parent.remove(last.as_str());
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sweep(mut doc: Value) -> Result<Value, PreprocessError> {
        clean_unused(&mut doc)?;
        Ok(doc)
    }

    #[test]
    fn test_root_must_be_object() {
        let err = sweep(json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "root is not an object");
    }

    #[test]
    fn test_unused_component_removed() {
        let doc = sweep(json!({
            "openapi": "3.0.0",
            "paths": {
                "/p": {"get": {"responses": {"200": {"$ref": "#/components/responses/R"}}}}
            },
            "components": {
                "responses": {
                    "R": {"description": "ok"},
                    "U": {"description": "never used"}
                }
            }
        }))
        .unwrap();
        assert_eq!(
            doc["components"]["responses"],
            json!({"R": {"description": "ok"}})
        );
    }

    #[test]
    fn test_swagger_dialect_containers() {
        let doc = sweep(json!({
            "swagger": "2.0",
            "paths": {
                "/p": {"get": {"responses": {"200": {"schema": {"$ref": "#/definitions/Used"}}}}}
            },
            "definitions": {
                "Used": {"type": "object"},
                "Unused": {"type": "string"}
            }
        }))
        .unwrap();
        assert_eq!(doc["definitions"], json!({"Used": {"type": "object"}}));
    }

    #[test]
    fn test_ref_chain_keeps_transitive_components() {
        let doc = sweep(json!({
            "openapi": "3.0.0",
            "paths": {
                "/p": {"$ref": "#/components/schemas/A"}
            },
            "components": {
                "schemas": {
                    "A": {"properties": {"b": {"$ref": "#/components/schemas/B"}}},
                    "B": {"type": "string"},
                    "C": {"type": "integer"}
                }
            }
        }))
        .unwrap();
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        assert!(schemas.contains_key("A"));
        assert!(schemas.contains_key("B"));
        assert!(!schemas.contains_key("C"));
    }

    #[test]
    fn test_recursive_component_terminates() {
        let doc = sweep(json!({
            "openapi": "3.0.0",
            "paths": {
                "/p": {"$ref": "#/components/schemas/Node"}
            },
            "components": {
                "schemas": {
                    "Node": {"properties": {"next": {"$ref": "#/components/schemas/Node"}}}
                }
            }
        }))
        .unwrap();
        assert!(doc["components"]["schemas"]["Node"].is_object());
    }

    #[test]
    fn test_sub_path_reference_keeps_component() {
        let doc = sweep(json!({
            "openapi": "3.0.0",
            "paths": {
                "/p": {"$ref": "#/components/schemas/Wrapper/properties/x"}
            },
            "components": {
                "schemas": {
                    "Wrapper": {"properties": {"x": {"type": "number"}}}
                }
            }
        }))
        .unwrap();
        assert!(doc["components"]["schemas"]["Wrapper"].is_object());
    }

    #[test]
    fn test_emptied_containers_are_dropped() {
        let doc = sweep(json!({
            "openapi": "3.0.0",
            "paths": {"/p": {"get": {}}},
            "components": {
                "schemas": {"Orphan": {"type": "string"}}
            }
        }))
        .unwrap();
        assert!(doc.get("components").is_none());
    }

    #[test]
    fn test_components_with_other_content_survive() {
        let doc = sweep(json!({
            "openapi": "3.0.0",
            "paths": {"/p": {"get": {}}},
            "components": {
                "schemas": {"Orphan": {"type": "string"}},
                "x-custom": {"keep": true}
            }
        }))
        .unwrap();
        assert_eq!(doc["components"], json!({"x-custom": {"keep": true}}));
    }

    #[test]
    fn test_no_paths_still_cleans_empty_containers() {
        let doc = sweep(json!({
            "openapi": "3.0.0",
            "components": {
                "schemas": {},
                "responses": {"Kept": {"description": "not swept without paths"}}
            }
        }))
        .unwrap();
        assert_eq!(
            doc["components"],
            json!({"responses": {"Kept": {"description": "not swept without paths"}}})
        );
    }

    #[test]
    fn test_unknown_dialect_sweeps_nothing() {
        let original = json!({
            "paths": {"/p": {"$ref": "#/fragments/F"}},
            "fragments": {"F": {"x": 1}, "G": {"y": 2}}
        });
        let doc = sweep(original.clone()).unwrap();
        assert_eq!(doc, original);
    }

    #[test]
    fn test_non_local_ref_is_invariant_violation() {
        let err = sweep(json!({
            "openapi": "3.0.0",
            "paths": {"/p": {"$ref": "other.yaml#/X"}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unexpected $ref"));
    }

    #[test]
    fn test_dangling_local_ref_is_invariant_violation() {
        let err = sweep(json!({
            "openapi": "3.0.0",
            "paths": {"/p": {"$ref": "#/components/schemas/Ghost"}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_escaped_component_names() {
        let doc = sweep(json!({
            "openapi": "3.0.0",
            "paths": {
                "/p": {"$ref": "#/components/schemas/a~1b"}
            },
            "components": {
                "schemas": {"a/b": {"type": "string"}, "a~b": {"type": "integer"}}
            }
        }))
        .unwrap();
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        assert!(schemas.contains_key("a/b"));
        assert!(!schemas.contains_key("a~b"));
    }
}
