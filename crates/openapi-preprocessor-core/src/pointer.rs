//! RFC 6901 JSON Pointer primitives: escaping, parsing, lookup, mutation.
//!
//! Everything in the crate addresses nodes through pointers instead of
//! holding references into the tree, so this module is the single place
//! where pointer text meets `serde_json::Value`.

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

/// Error raised when a pointer cannot be parsed or applied to a tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointerError {
    /// The pointer text does not follow RFC 6901.
    #[error("invalid JSON pointer {0:?}")]
    Syntax(String),
    /// A segment names a property the mapping does not have.
    #[error("property {0:?} not found")]
    KeyNotFound(String),
    /// A segment is not a valid sequence index, or indexes out of range.
    #[error("invalid array index {0:?}")]
    BadIndex(String),
    /// A segment descends into a scalar value.
    #[error("scalar value cannot be traversed at {0:?}")]
    Scalar(String),
}

// ---------------------------------------------------------------------------
// Escaping (RFC 6901 §3)
// ---------------------------------------------------------------------------

/// Escape a single pointer segment: `~` → `~0`, `/` → `~1`.
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Unescape a single pointer segment: `~1` → `/`, `~0` → `~`.
///
/// Order matters: `~1` first, so `~01` decodes to `~1` and not `/`.
pub fn unescape(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Append one segment (escaped) to a pointer.
pub fn append(pointer: &str, segment: &str) -> String {
    format!("{}/{}", pointer, escape(segment))
}

/// Rebuild pointer text from decoded segments.
pub fn join(segments: &[String]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(&escape(segment));
    }
    out
}

/// Parse pointer text into decoded segments.
///
/// The empty pointer refers to the whole document and yields no segments;
/// any other pointer must begin with `/`. A `~` not followed by `0` or `1`
/// is a syntax error.
pub fn parse(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PointerError::Syntax(pointer.to_string()));
    };
    rest.split('/')
        .map(|segment| decode_segment(segment, pointer))
        .collect()
}

fn decode_segment(segment: &str, pointer: &str) -> Result<String, PointerError> {
    if !segment.contains('~') {
        return Ok(segment.to_string());
    }
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return Err(PointerError::Syntax(pointer.to_string())),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// Parse a segment as a sequence index: `0`, or digits without a leading
/// zero (RFC 6901 §4).
fn parse_index(segment: &str) -> Option<usize> {
    if segment == "0" {
        return Some(0);
    }
    if segment.is_empty()
        || segment.starts_with('0')
        || !segment.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    segment.parse().ok()
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Resolve a pointer against a tree.
pub fn get<'a>(root: &'a Value, pointer: &str) -> Result<&'a Value, PointerError> {
    let segments = parse(pointer)?;
    let mut current = root;
    for segment in &segments {
        current = step(current, segment)?;
    }
    Ok(current)
}

/// Resolve a pointer against a tree, mutably.
pub fn get_mut<'a>(root: &'a mut Value, pointer: &str) -> Result<&'a mut Value, PointerError> {
    let segments = parse(pointer)?;
    let mut current = root;
    for segment in &segments {
        current = match current {
            Value::Object(map) => map
                .get_mut(segment.as_str())
                .ok_or_else(|| PointerError::KeyNotFound(segment.clone()))?,
            Value::Array(items) => {
                let index = parse_index(segment)
                    .filter(|i| *i < items.len())
                    .ok_or_else(|| PointerError::BadIndex(segment.clone()))?;
                &mut items[index]
            }
            _ => return Err(PointerError::Scalar(segment.clone())),
        };
    }
    Ok(current)
}

fn step<'a>(current: &'a Value, segment: &str) -> Result<&'a Value, PointerError> {
    match current {
        Value::Object(map) => map
            .get(segment)
            .ok_or_else(|| PointerError::KeyNotFound(segment.to_string())),
        Value::Array(items) => parse_index(segment)
            .and_then(|i| items.get(i))
            .ok_or_else(|| PointerError::BadIndex(segment.to_string())),
        _ => Err(PointerError::Scalar(segment.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// Overwrite the value at a pointer.
///
/// Missing mapping keys along the way are created as nested empty mappings
/// (an external fragment may be injected into a root that does not declare
/// the containing section yet). Traversing a scalar or a bad sequence
/// index is an error.
pub fn set(root: &mut Value, pointer: &str, value: Value) -> Result<(), PointerError> {
    let segments = parse(pointer)?;
    set_segments(root, &segments, value)
}

/// [`set`] over pre-decoded segments. `$inline` patch keys go through here
/// because their decoded segments may contain `/`.
pub(crate) fn set_segments(
    root: &mut Value,
    segments: &[String],
    value: Value,
) -> Result<(), PointerError> {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };
    let mut current = root;
    for segment in parents {
        current = match current {
            Value::Object(map) => map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index = parse_index(segment)
                    .filter(|i| *i < items.len())
                    .ok_or_else(|| PointerError::BadIndex(segment.clone()))?;
                &mut items[index]
            }
            _ => return Err(PointerError::Scalar(segment.clone())),
        };
    }
    match current {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(last)
                .filter(|i| *i < items.len())
                .ok_or_else(|| PointerError::BadIndex(last.clone()))?;
            items[index] = value;
            Ok(())
        }
        _ => Err(PointerError::Scalar(last.clone())),
    }
}

/// Remove and return the value at a pointer.
pub fn delete(root: &mut Value, pointer: &str) -> Result<Value, PointerError> {
    let segments = parse(pointer)?;
    let Some((last, parents)) = segments.split_last() else {
        return Err(PointerError::Syntax(pointer.to_string()));
    };
    let parent = get_mut(root, &join(parents))?;
    match parent {
        Value::Object(map) => map
            .remove(last.as_str())
            .ok_or_else(|| PointerError::KeyNotFound(last.clone())),
        Value::Array(items) => {
            let index = parse_index(last)
                .filter(|i| *i < items.len())
                .ok_or_else(|| PointerError::BadIndex(last.clone()))?;
            Ok(items.remove(index))
        }
        _ => Err(PointerError::Scalar(last.clone())),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
