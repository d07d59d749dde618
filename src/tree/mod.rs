//! Dot-path addressable configuration tree.
//!
//! A [`Tree`] is an insertion-ordered mapping from key segments to either a
//! scalar value or a nested mapping. Paths such as `"server.http.port"` are
//! split on `.` and resolved one segment at a time.
//!
//! Values are stored as [`serde_json::Value`], so any parsed document (YAML,
//! JSON, TOML) can be dropped in without conversion.

mod merge;
mod namespace;

pub use merge::{MergePolicy, deep_merge, merge_all};
pub use namespace::wrap;

use crate::error::{Error, Result};
use serde_json::{Map, Value, map::Entry};
use tracing::debug;

/// Split a dot-path into its segments.
///
/// The empty path yields no segments (the root). Empty segments are rejected.
pub fn segments(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(Error::invalid_path(path, "empty path segment"));
    }
    Ok(parts)
}

/// Ordered, dot-path addressable key-value tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    root: Map<String, Value>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(root: Map<String, Value>) -> Self {
        Self { root }
    }

    /// Build a tree from a parsed document.
    ///
    /// `null` becomes an empty tree; any other non-object value is rejected.
    pub fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            Value::Null => Ok(Self::new()),
            other => Err(other),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Look up the value at `path` without building anything.
    ///
    /// Returns `None` for missing segments, for descending through a scalar,
    /// and for malformed paths. The empty path names the root, which is not a
    /// single value; use [`subtree`](Self::subtree) or [`as_map`](Self::as_map).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segs = segments(path).ok()?;
        let (last, parents) = segs.split_last()?;
        let mut node = &self.root;
        for seg in parents {
            node = node.get(*seg)?.as_object()?;
        }
        node.get(*last)
    }

    /// Copy the subtree at `path`. The empty path copies the whole tree.
    pub fn subtree(&self, path: &str) -> Option<Tree> {
        if path.is_empty() {
            return Some(self.clone());
        }
        self.get(path)?
            .as_object()
            .map(|map| Tree::from_map(map.clone()))
    }

    /// Descend to the mapping at `path`.
    ///
    /// With `build`, missing segments are created and scalar intermediates are
    /// replaced by empty mappings. Without it, both are errors.
    pub fn walk(&mut self, path: &str, build: bool) -> Result<&mut Map<String, Value>> {
        let segs = segments(path)?;
        walk_segments(&mut self.root, path, &segs, build)
    }

    /// Store `value` at `path`, replacing whatever the leaf held before.
    pub fn set(&mut self, path: &str, value: impl Into<Value>, build: bool) -> Result<()> {
        let segs = segments(path)?;
        let Some((leaf, parents)) = segs.split_last() else {
            return Err(Error::invalid_path(path, "cannot assign to the root"));
        };
        let node = walk_segments(&mut self.root, path, parents, build)?;
        node.insert((*leaf).to_string(), value.into());
        Ok(())
    }

    /// Remove and return the value at `path`.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segs = segments(path).ok()?;
        let (leaf, parents) = segs.split_last()?;
        let node = walk_segments(&mut self.root, path, parents, false).ok()?;
        node.shift_remove(*leaf)
    }

    /// Merge `other` into this tree; values from `other` win.
    ///
    /// Nested mappings merge recursively, so siblings not mentioned in
    /// `other` survive.
    pub fn merge(&mut self, other: Tree) {
        let base = std::mem::take(&mut self.root);
        if let Value::Object(merged) = deep_merge(Value::Object(base), Value::Object(other.root)) {
            self.root = merged;
        }
    }
}

impl From<Map<String, Value>> for Tree {
    fn from(root: Map<String, Value>) -> Self {
        Self::from_map(root)
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        tree.into_value()
    }
}

fn walk_segments<'a>(
    root: &'a mut Map<String, Value>,
    path: &str,
    segs: &[&str],
    build: bool,
) -> Result<&'a mut Map<String, Value>> {
    let mut node = root;
    for (depth, seg) in segs.iter().enumerate() {
        let slot = match node.entry(*seg) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) if build => entry.insert(Value::Object(Map::new())),
            Entry::Vacant(_) => {
                return Err(Error::MissingSegment {
                    path: path.to_string(),
                    segment: seg.to_string(),
                });
            }
        };
        if !slot.is_object() {
            let at = segs[..=depth].join(".");
            if !build {
                return Err(Error::NotATree { path: at });
            }
            debug!(path = %at, "Replacing scalar with subtree");
            *slot = Value::Object(Map::new());
        }
        node = match slot {
            Value::Object(map) => map,
            _ => {
                return Err(Error::NotATree {
                    path: segs[..=depth].join("."),
                });
            }
        };
    }
    Ok(node)
}
