//! Layered configuration loading.
//!
//! Gathers configuration from files found on a search path, environment
//! variables, and interactive prompts into one dot-path addressable
//! [`Tree`], merging overlapping keys under a [`MergePolicy`].

pub mod cli;
pub mod error;
pub mod format;
pub mod logging;
pub mod sources;
pub mod tree;

pub use error::{Error, ErrorCode, Result};
pub use sources::{
    EnvCollector, EnvOptions, EnvSpec, FileOptions, FileResolver, FormatRegistry, PromptOptions,
    Prompter, SearchPath, SourceLoader, require_env, require_file, require_input,
};
pub use tree::{MergePolicy, Tree, merge_all, wrap};
