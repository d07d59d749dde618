//! Relocating a tree under a dotted namespace.

use super::Tree;
use crate::error::{Error, Result};

/// Place `tree` at `namespace` inside a fresh root, building every segment.
pub fn wrap(tree: Tree, namespace: &str) -> Result<Tree> {
    if namespace.trim().is_empty() {
        return Err(Error::InvalidNamespace {
            namespace: namespace.to_string(),
        });
    }
    let mut root = Tree::new();
    root.set(namespace, tree.into_value(), true)?;
    Ok(root)
}
