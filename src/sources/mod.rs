//! Configuration sources.
//!
//! Three kinds of source feed the same [`Tree`] contract:
//! 1. **Files** - resolved by name across a search path, parsed by extension
//! 2. **Environment** - variables picked by literal name or capture pattern
//! 3. **Input** - an answer typed at an interactive prompt
//!
//! The `require_*` functions run each source against the discovered search
//! path, the live process environment, and stdio. Build a [`SourceLoader`],
//! [`EnvCollector`], or [`Prompter`] directly for anything else.
//!
//! ## Environment Variables
//! - `LAYERCONF_PATH` - Search path for logical file names

mod env;
mod formats;
mod input;
mod loader;
mod resolver;

pub use env::{EnvCollector, EnvOptions, EnvSpec, Environment, ProcessEnv, match_capture};
pub use formats::{Format, FormatRegistry};
pub use input::{PromptOptions, Prompter};
pub use loader::{FileOptions, SourceLoader};
pub use resolver::{FileResolver, SEARCH_PATH_ENV, SearchPath};

use crate::error::Result;
use crate::tree::Tree;

/// Load and merge file sources from the discovered search path.
pub fn require_file<S: AsRef<str>>(names: &[S], opts: &FileOptions) -> Result<Tree> {
    SourceLoader::discover().load(names, opts)
}

/// Collect variables from the process environment.
pub fn require_env(specs: &[EnvSpec], opts: &EnvOptions) -> Result<Tree> {
    EnvCollector::process().collect(specs, opts)
}

/// Ask on stdout and read the answer from stdin.
pub fn require_input(message: &str, path: &str, opts: &PromptOptions) -> Result<Tree> {
    Prompter::stdio().ask(message, path, opts)
}
