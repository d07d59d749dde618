//! File source loading and merging.
//!
//! Resolves each requested name, parses it with the registered format, and
//! folds the results together under a [`MergePolicy`].

use super::formats::FormatRegistry;
use super::resolver::{FileResolver, SearchPath};
use crate::error::{Error, Result};
use crate::tree::{MergePolicy, Tree, wrap};
use std::path::Path;
use tracing::{debug, warn};

/// Options for [`SourceLoader::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// Conflict policy across sources.
    pub merge: MergePolicy,
    /// Fail with [`Error::MissingFile`] instead of skipping unresolved names.
    pub raise_on_missing: bool,
    /// Turn unknown formats and syntax errors into empty trees.
    pub tolerant: bool,
    /// Wrap the merged result under this dot-path.
    pub namespace: Option<String>,
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merge(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    pub fn raise_on_missing(mut self, raise: bool) -> Self {
        self.raise_on_missing = raise;
        self
    }

    pub fn tolerant(mut self, tolerant: bool) -> Self {
        self.tolerant = tolerant;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Loads named file sources into a single tree.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    resolver: FileResolver,
    formats: FormatRegistry,
}

impl SourceLoader {
    /// Build a loader whose resolver tries every extension in `formats`.
    pub fn new(search_path: SearchPath, formats: FormatRegistry) -> Self {
        let resolver = FileResolver::new(search_path, formats.extensions());
        Self { resolver, formats }
    }

    /// Loader over the discovered search path and the default formats.
    pub fn discover() -> Self {
        Self::new(SearchPath::discover(), FormatRegistry::default())
    }

    pub fn resolver(&self) -> &FileResolver {
        &self.resolver
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Load `names` in order and merge them under `opts.merge`.
    pub fn load<S: AsRef<str>>(&self, names: &[S], opts: &FileOptions) -> Result<Tree> {
        let mut acc = Tree::new();
        debug!(sources = names.len(), policy = %opts.merge, "Loading configuration files");

        for name in names {
            let name = name.as_ref();
            let Some(path) = self.resolver.resolve(name) else {
                if opts.raise_on_missing {
                    return Err(Error::missing_file(name));
                }
                debug!(name, "Skipping missing configuration source");
                continue;
            };

            let tree = self.load_file(&path, opts.tolerant)?;
            acc = opts.merge.combine(acc, tree);
        }

        match opts.namespace.as_deref() {
            Some(namespace) => wrap(acc, namespace),
            None => Ok(acc),
        }
    }

    /// Read and parse a single file.
    ///
    /// In tolerant mode a file that cannot be parsed yields an empty tree.
    /// Read failures always propagate.
    pub fn load_file(&self, path: &Path, tolerant: bool) -> Result<Tree> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;

        match self.formats.parse(path, &content) {
            Ok(tree) => {
                debug!(path = %path.display(), keys = tree.len(), "Loaded configuration file");
                Ok(tree)
            }
            Err(err) if tolerant && err.is_format_error() => {
                warn!(path = %path.display(), "Ignoring unreadable configuration: {}", err);
                Ok(Tree::new())
            }
            Err(err) => Err(err),
        }
    }
}
