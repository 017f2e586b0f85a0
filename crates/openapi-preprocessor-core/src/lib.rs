//! Preprocessor for multi-file OpenAPI/Swagger documents.
//!
//! Takes a root JSON or YAML specification that may reference other local
//! files through `$ref`, the `$inline` extension, and the `$merge`
//! extension, and produces one self-contained JSON document: external
//! fragments are injected into the root at the pointer they occupy in
//! their source file, every surviving `$ref` is rewritten to a local
//! fragment pointer, and declared components no longer reachable from
//! `/paths` are garbage-collected.
//!
//! [`process_file`] runs the whole pipeline; [`expand_refs`] and
//! [`clean_unused`] expose the two stages separately for callers that
//! already hold a parsed tree.

mod error;
mod expand;
mod loader;
mod loc;
mod paths;
pub mod pointer;
mod sweep;
mod visitor;

pub use error::{LoadError, PreprocessError};
pub use expand::{expand_refs, TraceFn};
pub use loader::load_file;
pub use loc::Loc;
pub use paths::resolve_path;
pub use sweep::clean_unused;

use std::path::Path;

use serde_json::Value;

/// Run the full pipeline on a file: load, expand, sweep.
///
/// The input path is made absolute and slash-normalized before anything
/// else, so relative references inside the document resolve against its
/// real location.
pub fn process_file<'a>(
    path: &Path,
    trace: Option<&'a mut TraceFn<'a>>,
) -> Result<Value, PreprocessError> {
    let absolute = std::path::absolute(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let absolute = slash_path(&absolute);

    let mut doc = load_file(&absolute)?;
    expand_refs(&mut doc, &absolute, trace)?;
    clean_unused(&mut doc)?;
    Ok(doc)
}

/// Render a filesystem path with `/` separators regardless of host OS.
fn slash_path(path: &Path) -> String {
    let text = path.display().to_string();
    if cfg!(windows) {
        text.replace('\\', "/")
    } else {
        text
    }
}
