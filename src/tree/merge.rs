//! Deep merge and merge policies for configuration trees.
//!
//! Objects merge field by field; every other value (scalars, arrays, null)
//! is replaced entirely by the overlay.

use super::Tree;
use clap::ValueEnum;
use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Anything else in overlay replaces base entirely, including `null`
///
/// # Example
/// ```
/// use serde_json::json;
/// use layerconf::tree::deep_merge;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let overlay = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(
///     result,
///     json!({ "server": { "port": 9000, "host": "localhost" }, "features": ["c"] })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value.take(), overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// How conflicting keys are resolved when trees are combined in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MergePolicy {
    /// Later sources overwrite earlier ones.
    #[default]
    Replace,
    /// Earlier sources win; later sources only fill in missing keys.
    Ignore,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Replace => "replace",
            MergePolicy::Ignore => "ignore",
        }
    }

    /// Fold `incoming` into the accumulated tree.
    pub fn combine(self, mut acc: Tree, mut incoming: Tree) -> Tree {
        match self {
            MergePolicy::Replace => {
                acc.merge(incoming);
                acc
            }
            MergePolicy::Ignore => {
                incoming.merge(acc);
                incoming
            }
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Merge trees left to right under `policy`, starting from an empty tree.
pub fn merge_all(trees: impl IntoIterator<Item = Tree>, policy: MergePolicy) -> Tree {
    trees
        .into_iter()
        .fold(Tree::new(), |acc, tree| policy.combine(acc, tree))
}
