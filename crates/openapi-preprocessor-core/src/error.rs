//! Error types for preprocessing.

use thiserror::Error;

use crate::loc::Loc;

/// Errors surfaced while reading a document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("{path}: {source}")]
    Io {
        /// Path of the document.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A reference used a URL scheme other than `file`. Only local
    /// filesystem references are supported.
    #[error("{path}: unsupported {scheme:?} URL scheme")]
    UnsupportedScheme {
        /// The offending reference.
        path: String,
        /// Its scheme.
        scheme: String,
    },

    /// The file extension is neither `.json` nor `.yaml`/`.yml`.
    #[error("{path}: unsupported file extension")]
    UnsupportedExtension {
        /// Path of the document.
        path: String,
    },

    /// The underlying JSON or YAML parser rejected the document, or the
    /// decoded root is not a mapping.
    #[error("{path}: {message}")]
    Decode {
        /// Path of the document.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The decoded document is absent or null.
    #[error("{path}: empty document")]
    Empty {
        /// Path of the document.
        path: String,
    },
}

/// Errors produced by the expansion engine and the component sweep.
///
/// Engine errors carry the [`Loc`] of the offending node and render as
/// `path#pointer: message`; the path is relativized against the working
/// directory sampled when expansion began.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// A document could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A link or JSON Pointer could not be parsed or resolved.
    #[error("{loc}: {message}")]
    Reference {
        /// Node the failing reference lives at.
        loc: Loc,
        /// What went wrong.
        message: String,
    },

    /// A `$ref`, `$merge` or `$inline` directive is malformed.
    #[error("{loc}: {message}")]
    Directive {
        /// Node carrying the directive.
        loc: Loc,
        /// What went wrong.
        message: String,
    },

    /// A reference chain loops back on itself.
    #[error("{loc}: {message}")]
    Cycle {
        /// Node closing the loop.
        loc: Loc,
        /// What went wrong.
        message: String,
    },

    /// Two external documents claim the same injection pointer.
    #[error("{loc}: {message}")]
    Consistency {
        /// The `$ref` node that introduced the second source.
        loc: Loc,
        /// What went wrong.
        message: String,
    },

    /// Content required by the injection pass is missing or was
    /// overwritten.
    #[error("{message}")]
    Injection {
        /// Pointer-qualified diagnostic.
        message: String,
    },

    /// The document violates an invariant the sweep relies on.
    #[error("{message}")]
    Invariant {
        /// Pointer-qualified diagnostic.
        message: String,
    },

    /// Decorates an error that carries no location of its own with the
    /// location of the reference that triggered it.
    #[error("{loc}: {source}")]
    At {
        /// Node whose resolution failed.
        loc: Loc,
        /// The undecorated error.
        source: Box<PreprocessError>,
    },
}

impl PreprocessError {
    /// Attach `loc` unless the error already carries a location.
    pub(crate) fn at(self, loc: Loc) -> Self {
        match self {
            err @ (PreprocessError::Reference { .. }
            | PreprocessError::Directive { .. }
            | PreprocessError::Cycle { .. }
            | PreprocessError::Consistency { .. }
            | PreprocessError::At { .. }) => err,
            err => PreprocessError::At {
                loc,
                source: Box::new(err),
            },
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_located_error_display() {
        let err = PreprocessError::Reference {
            loc: Loc::new("spec.yaml", "/paths/~1p"),
            message: "property \"R\" not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "spec.yaml#/paths/~1p: property \"R\" not found"
        );
    }

    #[test]
    fn test_at_wraps_unlocated() {
        let load = PreprocessError::Load(LoadError::Empty {
            path: "other.yaml".to_string(),
        });
        let wrapped = load.at(Loc::new("spec.yaml", "/a"));
        assert_eq!(wrapped.to_string(), "spec.yaml#/a: other.yaml: empty document");
    }

    #[test]
    fn test_at_keeps_existing_location() {
        let cycle = PreprocessError::Cycle {
            loc: Loc::new("spec.yaml", "/a"),
            message: "circular link".to_string(),
        };
        let same = cycle.at(Loc::new("spec.yaml", "/b"));
        assert_eq!(same.to_string(), "spec.yaml#/a: circular link");
    }
}
