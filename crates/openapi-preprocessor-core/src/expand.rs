//! The reference-expansion engine.
//!
//! Three passes over the root document:
//!
//! 1. **Expand** — recursive, cycle-aware evaluation of `$ref`, `$merge`
//!    and `$inline`, loading external documents on demand and recording
//!    which external fragments must be injected into the output.
//! 2. **Inject** — copy each recorded fragment into the root document at
//!    the same pointer it occupies in its source document.
//! 3. **Localize** — rewrite surviving cross-document `$ref` values to
//!    fragment-only form.
//!
//! The engine addresses nodes as [`Loc`] values and resolves the pointer
//! against the owning document immediately before each read or write, so
//! no references into the trees are held across recursion.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::env;
use std::mem;

use serde_json::{Map, Value};

use crate::error::{LoadError, PreprocessError};
use crate::loader;
use crate::loc::Loc;
use crate::paths;
use crate::pointer;
use crate::visitor;

/// Callback invoked with the engine's current location on every expansion
/// step. Diagnostic only; it must not influence behavior.
pub type TraceFn<'a> = dyn FnMut(&Loc) + 'a;

/// Expand all references in `root`, in place.
///
/// `root_path` is the absolute, slash-separated path of the document; it
/// anchors relative reference paths and identifies the root among the
/// loaded documents. On return every surviving `$ref` is an
/// intra-document fragment pointer and no `$merge`/`$inline` keys remain.
pub fn expand_refs<'a>(
    root: &mut Value,
    root_path: &str,
    trace: Option<&'a mut TraceFn<'a>>,
) -> Result<(), PreprocessError> {
    let base_path = env::current_dir()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();

    let mut docs = HashMap::new();
    docs.insert(root_path.to_string(), mem::take(root));
    let mut resolver = Resolver {
        base_path,
        root_path: root_path.to_string(),
        docs,
        visited: HashSet::new(),
        inject: BTreeMap::new(),
        inlining: false,
        trace,
    };

    let result = resolver.run();
    // The caller owns the root tree, errors included.
    *root = resolver
        .docs
        .remove(root_path)
        .unwrap_or(Value::Null);
    result
}

struct Resolver<'a> {
    /// Working directory when expansion began; error locations are shown
    /// relative to it.
    base_path: String,
    /// Absolute path of the input document.
    root_path: String,
    /// Every loaded document, keyed by absolute path. The root's entry is
    /// moved in from the caller; others are loaded on first reference and
    /// never evicted.
    docs: HashMap<String, Value>,
    /// Locations already expanded. Inserted before descending, so
    /// cross-references converging on a node short-circuit.
    visited: HashSet<Loc>,
    /// Output pointer → source document for pass 2.
    inject: BTreeMap<String, String>,
    /// While resolving an `$inline` target the engine must not mark the
    /// target as visited: each inline site deep-copies it and every copy
    /// may need independent expansion.
    inlining: bool,
    trace: Option<&'a mut TraceFn<'a>>,
}

/// What to do with a node, captured up front so the borrow on the tree is
/// released before recursing.
enum Step {
    Leaf,
    Seq(Vec<usize>),
    Map(Vec<String>),
    Ref { link: Value, alone: bool },
    Merge { links: Value, solo: bool },
    Inline { link: Value, siblings: Vec<String> },
}

impl Resolver<'_> {
    fn run(&mut self) -> Result<(), PreprocessError> {
        let root_loc = Loc::new(self.root_path.clone(), "");
        self.expand(&root_loc)?;
        self.inject_external()?;
        self.localize()
    }

    // -----------------------------------------------------------------------
    // Pass 1: expand
    // -----------------------------------------------------------------------

    fn expand(&mut self, loc: &Loc) -> Result<(), PreprocessError> {
        if self.visited.contains(loc) {
            return Ok(());
        }
        if !self.inlining {
            self.visited.insert(loc.clone());
        }
        if let Some(trace) = self.trace.as_mut() {
            (*trace)(loc);
        }

        let step = match self.value_at(loc)? {
            Value::Array(items) => Step::Seq(
                items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| item.is_object() || item.is_array())
                    .map(|(index, _)| index)
                    .collect(),
            ),
            Value::Object(map) if !map.is_empty() => {
                if let Some(link) = map.get("$ref") {
                    Step::Ref {
                        link: link.clone(),
                        alone: map.len() == 1,
                    }
                } else if let Some(links) = map.get("$merge") {
                    Step::Merge {
                        links: links.clone(),
                        solo: map.len() == 1,
                    }
                } else if let Some(link) = map.get("$inline") {
                    Step::Inline {
                        link: link.clone(),
                        siblings: map.keys().filter(|k| *k != "$inline").cloned().collect(),
                    }
                } else {
                    Step::Map(map.keys().cloned().collect())
                }
            }
            _ => Step::Leaf,
        };

        match step {
            Step::Leaf => Ok(()),
            Step::Seq(indices) => {
                for index in indices {
                    self.expand(&loc.child_index(index))?;
                }
                Ok(())
            }
            Step::Map(keys) => {
                for key in keys {
                    self.expand(&loc.child(&key))?;
                }
                Ok(())
            }
            Step::Ref { link, alone } => self.expand_ref(loc, link, alone),
            Step::Merge { links, solo } => self.expand_merge(loc, links, solo),
            Step::Inline { link, siblings } => self.expand_inline(loc, link, siblings),
        }
    }

    fn expand_ref(&mut self, loc: &Loc, link: Value, alone: bool) -> Result<(), PreprocessError> {
        let Value::String(link) = link else {
            return Err(self.directive(loc, "$ref must be a string"));
        };
        if !alone {
            return Err(self.directive(loc, "$ref must be alone (tip: use $merge instead)"));
        }

        let target = self.resolve_and_expand(&link, loc)?;
        if target.path == self.root_path {
            // Intra-document reference: stays as-is in the output.
            return Ok(());
        }

        // The fragment will be injected into the root at its own pointer.
        // If that pointer is an ancestor of the $ref node, the rewritten
        // local reference would point into itself.
        if format!("{}/", loc.ptr).starts_with(&format!("{}/", target.ptr)) {
            return Err(self.cycle(
                loc,
                format!(
                    "injection of {link} in {} will create a circular link (tip: use $inline)",
                    target.ptr
                ),
            ));
        }
        let recorded = self.inject.get(&target.ptr).cloned();
        match recorded {
            Some(source) if source != target.path => Err(self.consistency(
                loc,
                format!(
                    "import fragment {} is imported from {} and {}",
                    target.ptr,
                    paths::relativize(&self.base_path, &source),
                    paths::relativize(&self.base_path, &target.path),
                ),
            )),
            Some(_) => Ok(()),
            None => {
                self.inject.insert(target.ptr.clone(), target.path.clone());
                Ok(())
            }
        }
    }

    fn expand_merge(&mut self, loc: &Loc, links: Value, solo: bool) -> Result<(), PreprocessError> {
        let (links, single) = match links {
            Value::String(link) => (vec![link], true),
            Value::Array(items) => {
                let mut links = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let Value::String(link) = item else {
                        return Err(self.directive(
                            &loc.child("$merge").child_index(index),
                            "must be a string",
                        ));
                    };
                    links.push(link);
                }
                (links, false)
            }
            _ => return Err(self.directive(loc, "must be a string or array of strings")),
        };
        if solo || links.is_empty() {
            return Err(self.directive(loc, "merging with nothing?"));
        }

        self.remove_entry(loc, "$merge")?;
        let local_keys: HashSet<String> = match self.value_at(loc)? {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => HashSet::new(),
        };

        // Expand the mapping itself now that the directive is gone.
        self.visited.remove(loc);
        self.expand(loc)?;
        self.visited.insert(loc.clone());

        // Reversed, so of two links supplying the same key the one listed
        // first ends up winning. Keys the mapping declared itself always
        // win.
        for (index, link) in links.iter().enumerate().rev() {
            let target = self.resolve_and_expand(link, loc)?;
            let entries = match self.value_at(&target)?.clone() {
                Value::Object(entries) => entries,
                _ => {
                    let at = if single {
                        loc.child("$merge")
                    } else {
                        loc.child("$merge").child_index(index)
                    };
                    return Err(self.directive(&at, "link must point to object"));
                }
            };
            let merged = self.object_at_mut(loc)?;
            for (key, value) in entries {
                if local_keys.contains(&key) {
                    continue;
                }
                merged.insert(key, value);
            }
        }
        Ok(())
    }

    fn expand_inline(
        &mut self,
        loc: &Loc,
        link: Value,
        siblings: Vec<String>,
    ) -> Result<(), PreprocessError> {
        let Value::String(link) = link else {
            return Err(self.directive(loc, "$inline must be a string"));
        };

        let was_inlining = self.inlining;
        self.inlining = true;
        let resolved = self.resolve_and_expand(&link, loc);
        self.inlining = was_inlining;
        let target = resolved?;

        // Every inline site gets an independent copy: later patches here
        // must not reach back into the source document.
        let copy = self.value_at(&target)?.clone();

        if siblings.is_empty() {
            return self.set_at(loc, copy);
        }
        let mut copy = match copy {
            Value::Object(_) => copy,
            Value::Array(_) => {
                return Err(self.directive(loc, "inlining of array not yet implemented"))
            }
            _ => return Err(self.directive(loc, "inlined scalar value can't be patched")),
        };

        // Sibling keys are patch pointers into the copy, in ascending byte
        // order.
        for key in &siblings {
            let patch_loc = loc.child(key);
            self.expand(&patch_loc)?;
            let patch_value = self.value_at(&patch_loc)?.clone();
            let segments = decode_patch_key(key);
            pointer::set_segments(&mut copy, &segments, patch_value)
                .map_err(|e| self.reference(&patch_loc, e.to_string()))?;
        }
        self.set_at(loc, copy)
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    fn resolve_and_expand(
        &mut self,
        link: &str,
        relative_to: &Loc,
    ) -> Result<Loc, PreprocessError> {
        let target = match self.resolve(link, relative_to) {
            Ok(target) => target,
            Err(err) => return Err(err.at(self.err_loc(relative_to))),
        };
        self.expand(&target)?;
        Ok(target)
    }

    /// Split a link into path and fragment, resolve the path against the
    /// referring document, load the target document if needed, and verify
    /// the fragment resolves — expanding any `$inline` the pointer passes
    /// through.
    fn resolve(&mut self, link: &str, relative_to: &Loc) -> Result<Loc, PreprocessError> {
        let (raw_path, raw_fragment) = match link.find('#') {
            Some(i) => (&link[..i], &link[i + 1..]),
            None => (link, ""),
        };

        let path = if raw_path.is_empty() {
            relative_to.path.clone()
        } else {
            let decoded = paths::percent_decode(raw_path)
                .map_err(|e| self.reference(relative_to, e.to_string()))?;
            match paths::split_scheme(&decoded) {
                Some(("file", rest)) => rest.to_string(),
                Some((scheme, _)) => {
                    return Err(LoadError::UnsupportedScheme {
                        path: decoded.clone(),
                        scheme: scheme.to_string(),
                    }
                    .into())
                }
                None => paths::resolve_path(&relative_to.path, &decoded),
            }
        };

        let fragment = paths::percent_decode(raw_fragment)
            .map_err(|e| self.reference(relative_to, e.to_string()))?;
        let segments = pointer::parse(&fragment)
            .map_err(|e| self.reference(relative_to, e.to_string()))?;

        if path == relative_to.path {
            let target = format!("{fragment}/");
            let current = format!("{}/", relative_to.ptr);
            if current.starts_with(&target) {
                return Err(self.cycle(relative_to, "circular link"));
            }
        }

        if !self.docs.contains_key(&path) {
            let doc = loader::load_file(&path)?;
            self.docs.insert(path.clone(), doc);
        }

        let target = Loc::new(path, fragment);
        if target.ptr.is_empty() {
            return Ok(target);
        }

        if self.peek(&target).is_none() {
            // The pointer may pass through an $inline that has not been
            // evaluated yet: expand any such prefix in place, then retry.
            for depth in 1..segments.len() {
                let prefix = Loc::new(target.path.clone(), pointer::join(&segments[..depth]));
                let through_inline = matches!(
                    self.peek(&prefix),
                    Some(Value::Object(map)) if map.contains_key("$inline")
                );
                if through_inline {
                    self.expand(&prefix)?;
                }
            }
            self.value_at(&target)?;
        }
        Ok(target)
    }

    // -----------------------------------------------------------------------
    // Pass 2: inject
    // -----------------------------------------------------------------------

    /// Copy each recorded external fragment into the root document, at the
    /// same pointer it occupies in its source document.
    fn inject_external(&mut self) -> Result<(), PreprocessError> {
        let inject = mem::take(&mut self.inject);
        let root_path = self.root_path.clone();
        for (ptr, source_path) in inject {
            let shown = paths::relativize(&self.base_path, &source_path);
            let content = pointer::get(self.doc(&source_path)?, &ptr)
                .map_err(|_| PreprocessError::Injection {
                    message: format!(
                        "{shown}#{ptr}: has disappeared after replacement of $inline/$merge"
                    ),
                })?
                .clone();
            let root = self.doc_mut(&root_path)?;
            pointer::set(root, &ptr, content).map_err(|_| PreprocessError::Injection {
                message: format!("{ptr}: content replaced from {shown}"),
            })?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pass 3: localize
    // -----------------------------------------------------------------------

    /// Strip the document part off every `$ref` that carries a fragment.
    /// Only needed when external documents were pulled in.
    fn localize(&mut self) -> Result<(), PreprocessError> {
        if self.docs.len() < 2 {
            return Ok(());
        }
        let root_path = self.root_path.clone();
        let root = self.doc_mut(&root_path)?;
        visitor::visit_refs(root, &mut String::new(), &mut |_, reference| {
            Ok(match reference.find('#') {
                Some(i) if i > 0 => reference[i..].to_string(),
                _ => reference.to_string(),
            })
        })
    }

    // -----------------------------------------------------------------------
    // Tree access
    // -----------------------------------------------------------------------

    fn doc(&self, path: &str) -> Result<&Value, PreprocessError> {
        self.docs.get(path).ok_or_else(|| PreprocessError::Invariant {
            message: format!("document {path} is not loaded"),
        })
    }

    fn doc_mut(&mut self, path: &str) -> Result<&mut Value, PreprocessError> {
        self.docs
            .get_mut(path)
            .ok_or_else(|| PreprocessError::Invariant {
                message: format!("document {path} is not loaded"),
            })
    }

    fn value_at(&self, loc: &Loc) -> Result<&Value, PreprocessError> {
        pointer::get(self.doc(&loc.path)?, &loc.ptr)
            .map_err(|e| self.reference(loc, e.to_string()))
    }

    fn peek(&self, loc: &Loc) -> Option<&Value> {
        pointer::get(self.docs.get(&loc.path)?, &loc.ptr).ok()
    }

    fn set_at(&mut self, loc: &Loc, value: Value) -> Result<(), PreprocessError> {
        let err_loc = self.err_loc(loc);
        let doc = self.doc_mut(&loc.path)?;
        pointer::set(doc, &loc.ptr, value).map_err(|e| PreprocessError::Reference {
            loc: err_loc,
            message: e.to_string(),
        })
    }

    fn object_at_mut(&mut self, loc: &Loc) -> Result<&mut Map<String, Value>, PreprocessError> {
        let err_loc = self.err_loc(loc);
        let doc = self.doc_mut(&loc.path)?;
        match pointer::get_mut(doc, &loc.ptr) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PreprocessError::Invariant {
                message: format!("{err_loc}: expected an object"),
            }),
            Err(e) => Err(PreprocessError::Reference {
                loc: err_loc,
                message: e.to_string(),
            }),
        }
    }

    fn remove_entry(&mut self, loc: &Loc, key: &str) -> Result<(), PreprocessError> {
        self.object_at_mut(loc)?.remove(key);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Error construction
    // -----------------------------------------------------------------------

    fn err_loc(&self, loc: &Loc) -> Loc {
        Loc {
            path: paths::relativize(&self.base_path, &loc.path),
            ptr: loc.ptr.clone(),
        }
    }

    fn reference(&self, loc: &Loc, message: impl Into<String>) -> PreprocessError {
        PreprocessError::Reference {
            loc: self.err_loc(loc),
            message: message.into(),
        }
    }

    fn directive(&self, loc: &Loc, message: impl Into<String>) -> PreprocessError {
        PreprocessError::Directive {
            loc: self.err_loc(loc),
            message: message.into(),
        }
    }

    fn cycle(&self, loc: &Loc, message: impl Into<String>) -> PreprocessError {
        PreprocessError::Cycle {
            loc: self.err_loc(loc),
            message: message.into(),
        }
    }

    fn consistency(&self, loc: &Loc, message: impl Into<String>) -> PreprocessError {
        PreprocessError::Consistency {
            loc: self.err_loc(loc),
            message: message.into(),
        }
    }
}

/// Decode an `$inline` sibling patch key into pointer segments.
///
/// Patch keys use JSON Pointer encoding with one extra escape: `~2`
/// decodes to a literal `$`, keeping bare `$`-prefixed keys reserved for
/// directives while still allowing them in patched content.
fn decode_patch_key(key: &str) -> Vec<String> {
    key.split('/')
        .map(|segment| {
            segment
                .replace("~2", "$")
                .replace("~1", "/")
                .replace("~0", "~")
        })
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const DOC: &str = "/virtual/spec.json";

    fn expand(mut doc: Value) -> Result<Value, PreprocessError> {
        expand_refs(&mut doc, DOC, None)?;
        Ok(doc)
    }

    // --- $ref ---

    #[test]
    fn test_local_ref_is_kept() {
        let doc = expand(json!({
            "a": {"$ref": "#/b"},
            "b": {"description": "ok"}
        }))
        .unwrap();
        assert_eq!(doc["a"], json!({"$ref": "#/b"}));
    }

    #[test]
    fn test_ref_must_be_alone() {
        let err = expand(json!({"a": {"$ref": "#/b", "extra": 1}, "b": {}})).unwrap_err();
        assert!(err
            .to_string()
            .contains("$ref must be alone (tip: use $merge instead)"));
    }

    #[test]
    fn test_ref_must_be_a_string() {
        let err = expand(json!({"a": {"$ref": 42}})).unwrap_err();
        assert!(err.to_string().contains("$ref must be a string"));
    }

    #[test]
    fn test_self_ref_is_circular() {
        let err = expand(json!({"a": {"$ref": "#/a"}})).unwrap_err();
        assert!(err.to_string().contains("circular link"));
    }

    #[test]
    fn test_ancestor_ref_is_circular() {
        let err = expand(json!({"a": {"b": {"$ref": "#/a"}}})).unwrap_err();
        assert!(err.to_string().contains("circular link"));
    }

    #[test]
    fn test_mutual_refs_terminate() {
        // Sibling recursion is legal; only self/ancestor links are cycles.
        let doc = expand(json!({
            "a": {"item": {"$ref": "#/b"}},
            "b": {"item": {"$ref": "#/a"}}
        }))
        .unwrap();
        assert_eq!(doc["a"]["item"], json!({"$ref": "#/b"}));
    }

    #[test]
    fn test_empty_link_is_circular() {
        let err = expand(json!({"a": {"$ref": "#"}})).unwrap_err();
        assert!(err.to_string().contains("circular link"));
    }

    // --- $merge ---

    #[test]
    fn test_merge_precedence() {
        // Local keys beat both links; the first listed link beats the
        // second.
        let doc = expand(json!({
            "m": {"k": "local", "$merge": ["#/A", "#/B"]},
            "A": {"k": "from-a", "y": "a-y", "z": "a-z"},
            "B": {"y": "b-y", "w": "b-w"}
        }))
        .unwrap();
        assert_eq!(
            doc["m"],
            json!({"k": "local", "y": "a-y", "z": "a-z", "w": "b-w"})
        );
    }

    #[test]
    fn test_merge_single_string_link() {
        let doc = expand(json!({
            "m": {"x": 1, "$merge": "#/A"},
            "A": {"x": 9, "y": 2}
        }))
        .unwrap();
        assert_eq!(doc["m"], json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_merge_with_nothing() {
        let err = expand(json!({"m": {"$merge": "#/A"}, "A": {"x": 1}})).unwrap_err();
        assert!(err.to_string().contains("merging with nothing?"));
    }

    #[test]
    fn test_merge_empty_list() {
        let err = expand(json!({"m": {"x": 1, "$merge": []}})).unwrap_err();
        assert!(err.to_string().contains("merging with nothing?"));
    }

    #[test]
    fn test_merge_link_not_a_string() {
        let err = expand(json!({"m": {"x": 1, "$merge": [42]}})).unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }

    #[test]
    fn test_merge_value_not_string_or_list() {
        let err = expand(json!({"m": {"x": 1, "$merge": 42}})).unwrap_err();
        assert!(err
            .to_string()
            .contains("must be a string or array of strings"));
    }

    #[test]
    fn test_merge_target_must_be_object() {
        let err = expand(json!({"m": {"x": 1, "$merge": ["#/A"]}, "A": [1]})).unwrap_err();
        assert!(err.to_string().contains("link must point to object"));
    }

    #[test]
    fn test_merge_directive_is_removed() {
        let doc = expand(json!({
            "m": {"x": 1, "$merge": "#/A"},
            "A": {"y": 2}
        }))
        .unwrap();
        assert!(doc["m"].get("$merge").is_none());
    }

    // --- $inline ---

    #[test]
    fn test_inline_replaces_mapping() {
        let doc = expand(json!({
            "node": {"$inline": "#/T"},
            "T": {"a": 1}
        }))
        .unwrap();
        assert_eq!(doc["node"], json!({"a": 1}));
        assert_eq!(doc["T"], json!({"a": 1}));
    }

    #[test]
    fn test_inline_scalar_without_patch() {
        let doc = expand(json!({"node": {"$inline": "#/S"}, "S": "text"})).unwrap();
        assert_eq!(doc["node"], json!("text"));
    }

    #[test]
    fn test_inline_with_patches() {
        let doc = expand(json!({
            "node": {
                "$inline": "#/T",
                "name": "override",
                "nested/deep": 42
            },
            "T": {"name": "orig", "nested": {"deep": 0, "other": 5}}
        }))
        .unwrap();
        assert_eq!(
            doc["node"],
            json!({"name": "override", "nested": {"deep": 42, "other": 5}})
        );
        // The source is untouched.
        assert_eq!(doc["T"], json!({"name": "orig", "nested": {"deep": 0, "other": 5}}));
    }

    #[test]
    fn test_inline_copies_are_independent() {
        let doc = expand(json!({
            "first": {"$inline": "#/T", "name": "patched"},
            "second": {"$inline": "#/T"},
            "T": {"name": "orig"}
        }))
        .unwrap();
        assert_eq!(doc["first"], json!({"name": "patched"}));
        assert_eq!(doc["second"], json!({"name": "orig"}));
    }

    #[test]
    fn test_inline_patch_dollar_escape() {
        let doc = expand(json!({
            "node": {"$inline": "#/T", "~2id": "x"},
            "T": {}
        }))
        .unwrap();
        assert_eq!(doc["node"], json!({"$id": "x"}));
    }

    #[test]
    fn test_inline_array_not_implemented() {
        let err = expand(json!({
            "node": {"$inline": "#/T", "k": 1},
            "T": [1, 2]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("inlining of array not yet implemented"));
    }

    #[test]
    fn test_inline_scalar_cannot_be_patched() {
        let err = expand(json!({
            "node": {"$inline": "#/S", "k": 1},
            "S": "text"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("inlined scalar value can't be patched"));
    }

    #[test]
    fn test_inline_must_be_a_string() {
        let err = expand(json!({"node": {"$inline": 42}})).unwrap_err();
        assert!(err.to_string().contains("$inline must be a string"));
    }

    #[test]
    fn test_ref_through_unexpanded_inline() {
        // "a" sorts before "lib", so the reference is resolved while
        // /lib/T is still an $inline directive.
        let doc = expand(json!({
            "a": {"$ref": "#/lib/T/inner"},
            "defs": {"X": {"inner": {"type": "string"}}},
            "lib": {"T": {"$inline": "#/defs/X"}}
        }))
        .unwrap();
        assert_eq!(doc["lib"]["T"], json!({"inner": {"type": "string"}}));
        assert_eq!(doc["a"], json!({"$ref": "#/lib/T/inner"}));
    }

    #[test]
    fn test_unresolved_pointer_reports_target() {
        let err = expand(json!({"a": {"$ref": "#/missing/deep"}})).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_directives_are_gone_from_output() {
        let doc = expand(json!({
            "m": {"x": 1, "$merge": "#/A"},
            "n": {"$inline": "#/A"},
            "A": {"y": 2}
        }))
        .unwrap();
        let text = doc.to_string();
        assert!(!text.contains("$merge"));
        assert!(!text.contains("$inline"));
    }

    #[test]
    fn test_trace_reports_locations() {
        let mut doc = json!({"a": {"b": 1}});
        let mut seen = Vec::new();
        let mut trace = |loc: &Loc| seen.push(loc.to_string());
        expand_refs(&mut doc, DOC, Some(&mut trace)).unwrap();
        assert!(seen.contains(&DOC.to_string()));
        assert!(seen.contains(&format!("{DOC}#/a")));
    }
}
