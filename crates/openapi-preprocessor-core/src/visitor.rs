//! Generic traversal over every `$ref` value in a tree.
//!
//! Mapping keys are enumerated in ascending byte order and sequence
//! elements in index order, so visit order (and with it error reporting)
//! is deterministic. The pointer argument is shared across the walk:
//! pushed on descent, truncated on ascent — visitors must not keep it
//! beyond their own call.

use serde_json::Value;

use crate::error::PreprocessError;
use crate::pointer;

/// Walk `node`, calling `visitor` for every mapping entry whose key is
/// exactly `"$ref"` and whose value is a string. The visitor receives the
/// pointer of the `$ref` key and the current value; its return value
/// replaces the string in place. A `$ref` entry holding a non-string is
/// skipped entirely. Errors abort the traversal.
pub(crate) fn visit_refs<F>(
    node: &mut Value,
    ptr: &mut String,
    visitor: &mut F,
) -> Result<(), PreprocessError>
where
    F: FnMut(&str, &str) -> Result<String, PreprocessError>,
{
    match node {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                let depth = ptr.len();
                ptr.push('/');
                ptr.push_str(&pointer::escape(key));
                if key == "$ref" {
                    if let Value::String(reference) = value {
                        *reference = visitor(ptr, reference)?;
                    }
                } else {
                    visit_refs(value, ptr, visitor)?;
                }
                ptr.truncate(depth);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter_mut().enumerate() {
                let depth = ptr.len();
                ptr.push('/');
                ptr.push_str(&index.to_string());
                visit_refs(value, ptr, visitor)?;
                ptr.truncate(depth);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Read-only counterpart of [`visit_refs`] for walks that follow
/// references into other parts of the same tree (the visitor re-enters
/// [`visit_refs_shared`] on the target subtree).
pub(crate) trait RefVisitor {
    /// Called for every string-valued `$ref` entry.
    fn visit(&mut self, ptr: &str, reference: &str) -> Result<(), PreprocessError>;
}

/// Walk `node` without mutating it, feeding every string-valued `$ref`
/// entry to `visitor`. Same ordering guarantees as [`visit_refs`].
pub(crate) fn visit_refs_shared<V: RefVisitor + ?Sized>(
    node: &Value,
    ptr: &mut String,
    visitor: &mut V,
) -> Result<(), PreprocessError> {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                let depth = ptr.len();
                ptr.push('/');
                ptr.push_str(&pointer::escape(key));
                if key == "$ref" {
                    if let Value::String(reference) = value {
                        visitor.visit(ptr, reference)?;
                    }
                } else {
                    visit_refs_shared(value, ptr, visitor)?;
                }
                ptr.truncate(depth);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                let depth = ptr.len();
                ptr.push('/');
                ptr.push_str(&index.to_string());
                visit_refs_shared(value, ptr, visitor)?;
                ptr.truncate(depth);
            }
        }
        _ => {}
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
