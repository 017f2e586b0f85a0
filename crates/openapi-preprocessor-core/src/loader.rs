//! Document loading: JSON or YAML from disk into a generic tree.

use std::fs;
use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::error::LoadError;
use crate::paths;

/// Load an OpenAPI document from a local file.
///
/// Dispatches on the case-insensitive file extension: `.json` is decoded
/// strictly, `.yaml`/`.yml` through the YAML parser followed by a
/// key-normalization walk that stringifies non-string mapping keys. The
/// decoded root must be a non-null mapping.
///
/// A `file://` prefix is accepted and stripped; any other URL scheme is
/// rejected.
pub fn load_file(path: &str) -> Result<Value, LoadError> {
    let path = match paths::split_scheme(path) {
        Some(("file", rest)) => rest,
        Some((scheme, _)) => {
            return Err(LoadError::UnsupportedScheme {
                path: path.to_string(),
                scheme: scheme.to_string(),
            })
        }
        None => path,
    };

    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let decode: fn(&str, &str) -> Result<Value, LoadError> = match extension.as_deref() {
        Some("json") => decode_json,
        Some("yaml" | "yml") => decode_yaml,
        _ => {
            return Err(LoadError::UnsupportedExtension {
                path: path.to_string(),
            })
        }
    };

    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_string(),
        source,
    })?;
    let doc = decode(&raw, path)?;

    match doc {
        Value::Null => Err(LoadError::Empty {
            path: path.to_string(),
        }),
        Value::Object(_) => {
            tracing::debug!(path, "loaded document");
            Ok(doc)
        }
        _ => Err(LoadError::Decode {
            path: path.to_string(),
            message: "root is not an object".to_string(),
        }),
    }
}

fn decode_json(raw: &str, path: &str) -> Result<Value, LoadError> {
    serde_json::from_str(raw).map_err(|e| LoadError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn decode_yaml(raw: &str, path: &str) -> Result<Value, LoadError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| LoadError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    yaml_to_json(doc, path)
}

/// Convert a YAML tree to the JSON data model, stringifying non-string
/// mapping keys: numbers in decimal form, booleans as `true`/`false`,
/// null as `null`.
fn yaml_to_json(value: serde_yaml::Value, path: &str) -> Result<Value, LoadError> {
    use serde_yaml::Value as Yaml;
    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => Value::Number(yaml_number(n, path)?),
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(|item| yaml_to_json(item, path))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(entries) => {
            let mut map = Map::new();
            for (key, val) in entries {
                map.insert(key_string(key, path)?, yaml_to_json(val, path)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value, path)?,
    })
}

fn yaml_number(n: serde_yaml::Number, path: &str) -> Result<Number, LoadError> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Number::from(u));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .ok_or_else(|| LoadError::Decode {
            path: path.to_string(),
            message: format!("number {n} cannot be represented in JSON"),
        })
}

fn key_string(key: serde_yaml::Value, path: &str) -> Result<String, LoadError> {
    use serde_yaml::Value as Yaml;
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => key_string(tagged.value, path),
        Yaml::Sequence(_) | Yaml::Mapping(_) => Err(LoadError::Decode {
            path: path.to_string(),
            message: "mapping key is not a scalar".to_string(),
        }),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
