//! Reference-path arithmetic: RFC 3986 merging, percent decoding, scheme
//! splitting, display relativization.
//!
//! Paths are always slash-separated, whatever the host OS; the resolver
//! treats the document path as an opaque identity and only the loader
//! touches the filesystem.

use thiserror::Error;

/// A `%`-escape that is not two hex digits, or decodes to invalid UTF-8.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed percent-encoding in {0:?}")]
pub struct PercentDecodeError(pub String);

/// Resolve a reference path against the absolute path of the referring
/// document, per the reference-resolution algorithm of RFC 3986 §5.2
/// restricted to the path component.
///
/// - empty reference → the base itself
/// - absolute reference (leading `/`) → the reference
/// - otherwise → the base's directory part followed by the reference
///
/// The merged path is then segment-normalized: `.` segments are dropped,
/// `..` segments pop the previous segment, and a trailing `.`/`..` keeps a
/// terminating `/`. POSIX hosts get a leading `/`; Windows hosts do not.
pub fn resolve_path(base: &str, reference: &str) -> String {
    let full = if reference.is_empty() {
        base.to_string()
    } else if reference.starts_with('/') {
        reference.to_string()
    } else {
        match base.rfind('/') {
            Some(i) => format!("{}{}", &base[..=i], reference),
            None => reference.to_string(),
        }
    };
    if full.is_empty() {
        return full;
    }

    let src: Vec<&str> = full.split('/').collect();
    let mut dst: Vec<&str> = Vec::with_capacity(src.len());
    for element in &src {
        match *element {
            "." => {}
            ".." => {
                dst.pop();
            }
            _ => dst.push(element),
        }
    }
    if matches!(src.last(), Some(&".") | Some(&"..")) {
        // Keep the terminating slash of a directory reference.
        dst.push("");
    }

    let joined = dst.join("/");
    let trimmed = joined.strip_prefix('/').unwrap_or(&joined);
    if cfg!(windows) {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Decode `%XX` escapes in the path part of a reference link (RFC 3986
/// §2.1).
pub fn percent_decode(input: &str) -> Result<String, PercentDecodeError> {
    if !input.contains('%') {
        return Ok(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).copied().and_then(hex_digit),
                bytes.get(i + 2).copied().and_then(hex_digit),
            ) else {
                return Err(PercentDecodeError(input.to_string()));
            };
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| PercentDecodeError(input.to_string()))
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Split a leading `scheme://` prefix off a reference, if present.
///
/// Returns `(scheme, remainder)`; the remainder of `file:///tmp/x` is
/// `/tmp/x`. A candidate scheme with characters outside RFC 3986 §3.1 is
/// not a scheme (so a relative path containing `://` later on stays a
/// path).
pub fn split_scheme(reference: &str) -> Option<(&str, &str)> {
    let i = reference.find("://")?;
    let scheme = &reference[..i];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some((scheme, &reference[i + 3..]))
}

/// Strip `base` (a directory) off the front of `path` for display in error
/// messages. Paths outside `base` come back unchanged.
pub(crate) fn relativize(base: &str, path: &str) -> String {
    if base.is_empty() || base == "/" {
        return path.to_string();
    }
    let prefix = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    match path.strip_prefix(&prefix) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => path.to_string(),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
