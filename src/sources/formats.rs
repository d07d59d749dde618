//! File format registry.
//!
//! Maps file extensions to parsers. Every parser produces a [`Tree`]; the
//! document's top level must be a mapping.

use crate::error::{Error, Result};
use crate::tree::Tree;
use serde_json::Value;
use std::path::Path;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
    /// Line-oriented `dot.path = value` assignments.
    Rc,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Toml => "toml",
            Format::Rc => "rc",
        }
    }

    /// Parse `content` read from `path`.
    pub fn parse(self, content: &str, path: &Path) -> Result<Tree> {
        if content.trim().is_empty() {
            return Ok(Tree::new());
        }
        let value = match self {
            Format::Yaml => {
                let doc: serde_yaml::Value =
                    serde_yaml::from_str(content).map_err(|e| Error::syntax(path, e))?;
                serde_json::to_value(doc).map_err(|e| Error::syntax(path, e))?
            }
            Format::Json => serde_json::from_str(content).map_err(|e| Error::syntax(path, e))?,
            Format::Toml => {
                let table: toml::Table =
                    toml::from_str(content).map_err(|e| Error::syntax(path, e))?;
                from_toml(toml::Value::Table(table))
            }
            Format::Rc => return parse_rc(content, path),
        };
        Tree::from_value(value).map_err(|other| {
            Error::syntax(
                path,
                format!("top level must be a mapping, found {}", kind(&other)),
            )
        })
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Convert a TOML value, rendering datetimes as their TOML text.
///
/// Non-finite floats have no JSON form and become `null`.
fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml(value)))
                .collect(),
        ),
    }
}

/// Parse the rc format: one `dot.path = value` per line.
///
/// Values that read as JSON (numbers, booleans, quoted strings, arrays) are
/// stored typed; anything else is stored as the raw trimmed string.
fn parse_rc(content: &str, path: &Path) -> Result<Tree> {
    let mut tree = Tree::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = idx + 1;
        let Some((key, raw)) = line.split_once('=') else {
            return Err(Error::syntax(
                path,
                format!("line {}: expected 'key = value'", lineno),
            ));
        };
        let key = key.trim();
        let raw = raw.trim();
        let value = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        tree.set(key, value, true)
            .map_err(|e| Error::syntax(path, format!("line {}: {}", lineno, e)))?;
    }
    Ok(tree)
}

/// Extension to format mapping, consulted in registration order.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    entries: Vec<(String, Format)>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                ("yaml".into(), Format::Yaml),
                ("yml".into(), Format::Yaml),
                ("json".into(), Format::Json),
                ("toml".into(), Format::Toml),
                ("rc".into(), Format::Rc),
            ],
        }
    }
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no extensions at all.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Map `extension` (without the dot) to `format`, replacing any mapping.
    pub fn register(&mut self, extension: &str, format: Format) -> &mut Self {
        let ext = extension.trim_start_matches('.').to_lowercase();
        match self.entries.iter_mut().find(|(e, _)| *e == ext) {
            Some(entry) => entry.1 = format,
            None => self.entries.push((ext, format)),
        }
        self
    }

    pub fn lookup(&self, extension: &str) -> Option<Format> {
        let ext = extension.to_lowercase();
        self.entries
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, format)| *format)
    }

    /// Extensions in the order the resolver should try them.
    pub fn extensions(&self) -> Vec<String> {
        self.entries.iter().map(|(e, _)| e.clone()).collect()
    }

    /// Select the format for `path`. Files without an extension are rc files.
    pub fn for_path(&self, path: &Path) -> Result<Format> {
        let Some(ext) = path.extension() else {
            return Ok(Format::Rc);
        };
        let ext = ext.to_string_lossy();
        self.lookup(&ext).ok_or_else(|| Error::UnknownFormat {
            path: path.to_path_buf(),
            extension: ext.to_string(),
        })
    }

    /// Parse `content` with the format registered for `path`.
    pub fn parse(&self, path: &Path, content: &str) -> Result<Tree> {
        self.for_path(path)?.parse(content, path)
    }
}
