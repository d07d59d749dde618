//! Interactive prompts as a configuration source.

use crate::error::{Error, Result};
use crate::tree::Tree;
use serde_json::Value;
use std::io::{self, BufRead, Write};

/// Options for [`Prompter::ask`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptOptions {
    /// Used when the answer is blank.
    pub default: Option<Value>,
}

impl PromptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Asks questions on an output stream and reads answers from an input stream.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Ask `message` and store the answer at `path` in a fresh tree.
    pub fn ask(&mut self, message: &str, path: &str, opts: &PromptOptions) -> Result<Tree> {
        self.ask_with(message, path, opts, Ok)
    }

    /// Like [`ask`](Self::ask), passing the chosen value through `transform`.
    ///
    /// A blank answer (or end of input) selects the default, and `null` when
    /// there is none.
    pub fn ask_with<F>(
        &mut self,
        message: &str,
        path: &str,
        opts: &PromptOptions,
        transform: F,
    ) -> Result<Tree>
    where
        F: FnOnce(Value) -> anyhow::Result<Value>,
    {
        let answer = self.read_answer(message, opts.default.as_ref())?;
        let value = if answer.is_empty() {
            opts.default.clone().unwrap_or(Value::Null)
        } else {
            Value::String(answer)
        };
        let value = transform(value).map_err(|e| Error::transform(path, e))?;

        let mut tree = Tree::new();
        tree.set(path, value, true)?;
        Ok(tree)
    }

    /// Ask for the value at `path` in `tree`, offering the current value as
    /// the default, and merge the answer back in.
    pub fn update(&mut self, tree: &mut Tree, message: &str, path: &str) -> Result<()> {
        self.update_with(tree, message, path, Ok)
    }

    pub fn update_with<F>(
        &mut self,
        tree: &mut Tree,
        message: &str,
        path: &str,
        transform: F,
    ) -> Result<()>
    where
        F: FnOnce(Value) -> anyhow::Result<Value>,
    {
        let opts = PromptOptions {
            default: tree.get(path).cloned(),
        };
        let answer = self.ask_with(message, path, &opts, transform)?;
        tree.merge(answer);
        Ok(())
    }

    fn read_answer(&mut self, message: &str, default: Option<&Value>) -> Result<String> {
        let suffix = default.map(|d| format!("({})", display(d))).unwrap_or_default();
        write!(self.output, "{}{}", message, suffix)
            .and_then(|_| self.output.flush())
            .map_err(|e| Error::io("failed to write prompt", e))?;

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| Error::io("failed to read answer", e))?;
        Ok(line.trim().to_string())
    }
}

/// Render a default for the prompt: strings bare, everything else as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
