//! CLI command definitions for layerconf
//!
//! This module defines the CLI structure using clap's derive macros and the
//! handlers that run each subcommand. Every handler writes to a caller-supplied
//! stream so the binary and the tests share one code path.

use crate::format::{OutputFormat, render};
use crate::sources::{
    EnvCollector, EnvOptions, EnvSpec, FileOptions, FormatRegistry, PromptOptions, Prompter,
    SearchPath, SourceLoader,
};
use crate::tree::{MergePolicy, Tree};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Layered configuration loader
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to search before the default search path (repeatable)
    #[arg(short = 'I', long = "search-dir", value_name = "DIR", global = true)]
    pub search_dirs: Vec<PathBuf>,

    /// Output format for printed trees
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and merge configuration files, then print the result
    Load(LoadArgs),

    /// Collect environment variables, then print the result
    Env(EnvArgs),

    /// Print the path a file name resolves to
    Resolve(ResolveArgs),

    /// Prompt for a value, then print the result
    Ask(AskArgs),
}

/// Arguments for the load subcommand
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// File names: logical names, ~/paths, ./relative or /absolute paths
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,

    /// Conflict policy across files
    #[arg(short, long, value_enum, default_value_t = MergePolicy::Replace)]
    pub merge: MergePolicy,

    /// Wrap the result under this dot-path
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Fail if any name cannot be resolved
    #[arg(long)]
    pub strict: bool,

    /// Treat unparseable files as empty instead of failing
    #[arg(long)]
    pub tolerant: bool,
}

/// Arguments for the env subcommand
#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Variable names, or /patterns/ with a capture group for the key
    #[arg(required = true, value_name = "SPEC")]
    pub specs: Vec<String>,

    /// Keep key case instead of lowercasing
    #[arg(long)]
    pub case_sensitive: bool,

    /// Split keys on this pattern into nested paths
    #[arg(short, long, value_name = "PATTERN")]
    pub split: Option<String>,

    /// Wrap the result under this dot-path
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Value stored for named variables that are unset
    #[arg(short, long)]
    pub default: Option<String>,
}

/// Arguments for the resolve subcommand
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// File name to resolve
    pub name: String,
}

/// Arguments for the ask subcommand
#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question shown to the user
    pub message: String,

    /// Dot-path the answer is stored at
    pub path: String,

    /// Value used when the answer is blank
    #[arg(short, long)]
    pub default: Option<String>,
}

impl Cli {
    /// Search path with `-I` directories ahead of the discovered ones.
    pub fn search_path(&self) -> SearchPath {
        let mut search_path = SearchPath::discover();
        for dir in self.search_dirs.iter().rev() {
            search_path.prepend(dir.clone());
        }
        search_path
    }
}

/// Outcome of a command, mapped to the process exit status by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
}

/// Run `cli`, reading prompts from `input` and writing results to `out`.
///
/// Prompts are written to `out` as well; in the binary that is stdout.
pub fn run<R: BufRead, W: Write>(cli: &Cli, input: R, mut out: W) -> Result<Outcome> {
    let format = cli.format;

    match &cli.command {
        Command::Load(args) => {
            let loader = SourceLoader::new(cli.search_path(), FormatRegistry::default());
            let opts = FileOptions {
                merge: args.merge,
                raise_on_missing: args.strict,
                tolerant: args.tolerant,
                namespace: args.namespace.clone(),
            };
            let tree = loader
                .load(&args.names, &opts)
                .context("failed to load configuration files")?;
            print_tree(&mut out, &tree, format)?;
        }
        Command::Env(args) => {
            let specs = args
                .specs
                .iter()
                .map(|s| EnvSpec::parse(s))
                .collect::<crate::Result<Vec<_>>>()?;
            let mut opts = EnvOptions::new().case_sensitive(args.case_sensitive);
            if let Some(split) = &args.split {
                opts = opts.with_split(split)?;
            }
            opts.namespace = args.namespace.clone();
            opts.default = args.default.clone().map(Value::String);
            let tree = EnvCollector::process().collect(&specs, &opts)?;
            print_tree(&mut out, &tree, format)?;
        }
        Command::Resolve(args) => {
            let loader = SourceLoader::new(cli.search_path(), FormatRegistry::default());
            match loader.resolver().resolve(&args.name) {
                Some(path) => writeln!(out, "{}", path.display())?,
                None => {
                    tracing::info!(name = %args.name, "Not found");
                    return Ok(Outcome::NotFound);
                }
            }
        }
        Command::Ask(args) => {
            let opts = PromptOptions {
                default: args.default.clone().map(Value::String),
            };
            let mut prompter = Prompter::new(input, &mut out);
            let tree = prompter.ask(&args.message, &args.path, &opts)?;
            writeln!(out)?;
            print_tree(&mut out, &tree, format)?;
        }
    }

    Ok(Outcome::Success)
}

fn print_tree<W: Write>(out: &mut W, tree: &Tree, format: OutputFormat) -> Result<()> {
    out.write_all(render(tree, format)?.as_bytes())?;
    Ok(())
}
