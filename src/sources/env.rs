//! Environment variable collection.
//!
//! Variables are selected either by literal name or by a pattern whose first
//! capture group supplies the key:
//!
//! ```text
//! A=1                 EnvSpec::name("A")                 => a = "1"
//! APP_DB_HOST=x       EnvSpec::pattern("APP_(.*)")       => db_host = "x"
//! APP_DB_HOST=x       ... with split "_"                 => db.host = "x"
//! ```
//!
//! Matches from a pattern are applied in lexical order of the variable name,
//! and later writes win, so two variables that fold to the same key always
//! produce the same result.

use crate::error::{Error, Result};
use crate::tree::{Tree, wrap};
use regex_lite::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Read-only view of a set of environment variables.
pub trait Environment {
    /// Value of the variable `name`, if set.
    fn var(&self, name: &str) -> Option<String>;

    /// Every variable, in any order.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The live process environment.
///
/// Variables whose name or value is not valid Unicode are invisible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Selects environment variables.
#[derive(Debug, Clone)]
pub enum EnvSpec {
    /// Exactly this variable; the key is the name itself.
    Name(String),
    /// Every variable matching; the key is capture group 1.
    Pattern(Regex),
}

impl EnvSpec {
    pub fn name(name: impl Into<String>) -> Self {
        EnvSpec::Name(name.into())
    }

    /// Compile a pattern spec. The pattern must have at least one capture group.
    pub fn pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::invalid_spec(pattern, e.to_string()))?;
        Self::from_regex(regex)
    }

    pub fn from_regex(regex: Regex) -> Result<Self> {
        // captures_len counts the implicit whole-match group
        if regex.captures_len() < 2 {
            return Err(Error::invalid_spec(
                regex.as_str(),
                "pattern needs a capture group to name the key",
            ));
        }
        Ok(EnvSpec::Pattern(regex))
    }

    /// Parse textual spec: `/re/` is a pattern, anything else a literal name.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(Error::invalid_spec(text, "empty spec"));
        }
        if text.len() >= 2 && text.starts_with('/') && text.ends_with('/') {
            return Self::pattern(&text[1..text.len() - 1]);
        }
        if text.contains('=') || text.contains('\0') {
            return Err(Error::invalid_spec(
                text,
                "variable names cannot contain '=' or NUL",
            ));
        }
        Ok(EnvSpec::Name(text.to_string()))
    }
}

impl std::fmt::Display for EnvSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvSpec::Name(name) => write!(f, "{}", name),
            EnvSpec::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Capture group 1 of `pattern` in `candidate`, if it matches and participates.
pub fn match_capture(pattern: &Regex, candidate: &str) -> Option<String> {
    pattern
        .captures(candidate)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// Options for [`EnvCollector::collect`].
#[derive(Debug, Clone, Default)]
pub struct EnvOptions {
    /// Keep key case as-is instead of lowercasing.
    pub case_sensitive: bool,
    /// Split keys on this pattern and join the pieces with `.`.
    pub split: Option<Regex>,
    /// Wrap the result under this dot-path.
    pub namespace: Option<String>,
    /// Stored for literal names whose variable is unset.
    pub default: Option<Value>,
}

impl EnvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Split keys on `pattern` (a regular expression).
    pub fn with_split(mut self, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::invalid_spec(pattern, e.to_string()))?;
        self.split = Some(regex);
        Ok(self)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Turn a raw key into a dot-path.
    ///
    /// Empty pieces, whether left by splitting or by stray dots in the key,
    /// are dropped.
    pub fn key_path(&self, key: &str) -> String {
        let key = if self.case_sensitive {
            key.to_string()
        } else {
            key.to_lowercase()
        };
        let pieces: Vec<&str> = match &self.split {
            Some(split) => split.split(&key).flat_map(|piece| piece.split('.')).collect(),
            None => key.split('.').collect(),
        };
        pieces
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Collects environment variables into a tree.
#[derive(Debug, Clone, Default)]
pub struct EnvCollector<E = ProcessEnv> {
    env: E,
}

impl EnvCollector<ProcessEnv> {
    pub fn process() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: Environment> EnvCollector<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// (key, variable name) pairs in application order.
    pub fn matches(&self, specs: &[EnvSpec]) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for spec in specs {
            match spec {
                EnvSpec::Name(name) => pairs.push((name.clone(), name.clone())),
                EnvSpec::Pattern(regex) => {
                    let mut names: Vec<String> =
                        self.env.vars().into_iter().map(|(name, _)| name).collect();
                    names.sort();
                    for name in names {
                        match match_capture(regex, &name) {
                            Some(key) => pairs.push((key, name)),
                            None if regex.is_match(&name) => {
                                debug!(
                                    var = %name,
                                    pattern = regex.as_str(),
                                    "Capture group did not participate"
                                );
                            }
                            None => {}
                        }
                    }
                }
            }
        }
        pairs
    }

    /// Collect `specs` without transforming values.
    pub fn collect(&self, specs: &[EnvSpec], opts: &EnvOptions) -> Result<Tree> {
        self.collect_with(specs, opts, Ok)
    }

    /// Collect `specs`, passing every value through `transform` before storing.
    pub fn collect_with<F>(
        &self,
        specs: &[EnvSpec],
        opts: &EnvOptions,
        mut transform: F,
    ) -> Result<Tree>
    where
        F: FnMut(Value) -> anyhow::Result<Value>,
    {
        let mut tree = Tree::new();

        for (key, name) in self.matches(specs) {
            let path = opts.key_path(&key);
            if path.is_empty() {
                warn!(var = %name, "Environment key is empty after splitting, skipping");
                continue;
            }

            let raw = match self.env.var(&name) {
                Some(value) => Value::String(value),
                None => match &opts.default {
                    Some(default) => default.clone(),
                    None => {
                        debug!(var = %name, "Environment variable not set");
                        continue;
                    }
                },
            };

            let value = transform(raw).map_err(|e| Error::transform(&path, e))?;
            tree.set(&path, value, true)?;
        }

        match opts.namespace.as_deref() {
            Some(namespace) => wrap(tree, namespace),
            None => Ok(tree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn env(vars: &[(&str, &str)]) -> EnvCollector<BTreeMap<String, String>> {
        EnvCollector::new(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_literal_is_lowercased() {
        let c = env(&[("A", "1")]);
        let tree = c.collect(&[EnvSpec::name("A")], &EnvOptions::default()).unwrap();
        assert_eq!(tree.into_value(), json!({"a": "1"}));
    }

    #[test]
    fn test_literal_case_sensitive() {
        let c = env(&[("A", "1")]);
        let opts = EnvOptions::new().case_sensitive(true);
        let tree = c.collect(&[EnvSpec::name("A")], &opts).unwrap();
        assert_eq!(tree.into_value(), json!({"A": "1"}));
    }

    #[test]
    fn test_pattern_uses_first_group() {
        let c = env(&[("OPTIMISM_A", "a"), ("OPTIMISM_B_C", "b"), ("OTHER", "x")]);
        let spec = EnvSpec::pattern("OPTIMISM_(.*)").unwrap();
        let tree = c.collect(&[spec], &EnvOptions::default()).unwrap();
        assert_eq!(tree.into_value(), json!({"a": "a", "b_c": "b"}));
    }

    #[test]
    fn test_pattern_with_split() {
        let c = env(&[("OPTIMISM_A", "a"), ("OPTIMISM_B_C", "b")]);
        let spec = EnvSpec::pattern("OPTIMISM_(.*)").unwrap();
        let opts = EnvOptions::new().with_split("_").unwrap();
        let tree = c.collect(&[spec], &opts).unwrap();
        assert_eq!(tree.into_value(), json!({"a": "a", "b": {"c": "b"}}));
    }

    #[test]
    fn test_pattern_without_group_rejected() {
        let err = EnvSpec::pattern("OPTIMISM_.*").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSpec);
    }

    #[test]
    fn test_bad_regex_rejected() {
        let err = EnvSpec::pattern("(unclosed").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSpec);
    }

    #[test]
    fn test_parse_spec() {
        assert!(matches!(EnvSpec::parse("HOME").unwrap(), EnvSpec::Name(n) if n == "HOME"));
        assert!(matches!(EnvSpec::parse("/APP_(.*)/").unwrap(), EnvSpec::Pattern(_)));
        for bad in ["", "A=B", "/APP_.*/", "/(/"] {
            assert_eq!(
                EnvSpec::parse(bad).unwrap_err().code(),
                ErrorCode::InvalidSpec,
                "{bad:?} should be rejected"
            );
        }
        // a lone slash is a name, not an empty pattern
        assert!(matches!(EnvSpec::parse("/").unwrap(), EnvSpec::Name(_)));
    }

    #[test]
    fn test_spec_display() {
        assert_eq!(EnvSpec::name("A").to_string(), "A");
        assert_eq!(EnvSpec::pattern("X_(.*)").unwrap().to_string(), "/X_(.*)/");
    }

    #[test]
    fn test_match_capture() {
        let re = Regex::new("^APP_(.*)$").unwrap();
        assert_eq!(match_capture(&re, "APP_PORT"), Some("PORT".to_string()));
        assert_eq!(match_capture(&re, "OTHER"), None);

        let optional = Regex::new("^APP(_X)?$").unwrap();
        assert_eq!(match_capture(&optional, "APP"), None);
    }

    #[test]
    fn test_collision_is_lexical_last_wins() {
        // both fold to b.c; "OPTIMISM_B_C" sorts before "OPTIMISM_b_c"
        let c = env(&[("OPTIMISM_b_c", "lower"), ("OPTIMISM_B_C", "upper")]);
        let spec = EnvSpec::pattern("OPTIMISM_(.*)").unwrap();
        let opts = EnvOptions::new().with_split("_").unwrap();
        let tree = c.collect(&[spec], &opts).unwrap();
        assert_eq!(tree.get("b.c"), Some(&json!("lower")));
    }

    #[test]
    fn test_collision_independent_of_input_order() {
        let vars = [("APP_X", "1"), ("APP__X", "2")];
        let mut reversed = vars;
        reversed.reverse();
        let spec = || vec![EnvSpec::pattern("APP_(.*)").unwrap()];
        let opts = EnvOptions::new().with_split("_").unwrap();

        let a = env(&vars).collect(&spec(), &opts).unwrap();
        let b = env(&reversed).collect(&spec(), &opts).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get("x"), Some(&json!("2")));
    }

    #[test]
    fn test_later_spec_wins() {
        let c = env(&[("APP_PORT", "1"), ("PORT", "2")]);
        let specs = vec![EnvSpec::pattern("APP_(.*)").unwrap(), EnvSpec::name("PORT")];
        let tree = c.collect(&specs, &EnvOptions::default()).unwrap();
        assert_eq!(tree.get("port"), Some(&json!("2")));
    }

    #[test]
    fn test_scalar_then_nested_key() {
        let c = env(&[("APP_DB", "flat"), ("APP_DB_HOST", "h")]);
        let spec = EnvSpec::pattern("APP_(.*)").unwrap();
        let opts = EnvOptions::new().with_split("_").unwrap();
        let tree = c.collect(&[spec], &opts).unwrap();
        assert_eq!(tree.into_value(), json!({"db": {"host": "h"}}));
    }

    #[test]
    fn test_unset_literal_uses_default() {
        let c = env(&[]);
        let tree = c.collect(&[EnvSpec::name("MISSING")], &EnvOptions::default()).unwrap();
        assert!(tree.is_empty());

        let opts = EnvOptions::new().with_default("fallback");
        let tree = c.collect(&[EnvSpec::name("MISSING")], &opts).unwrap();
        assert_eq!(tree.get("missing"), Some(&json!("fallback")));
    }

    #[test]
    fn test_empty_key_skipped() {
        let c = env(&[("APP_", "x"), ("APP_A", "a")]);
        let spec = EnvSpec::pattern("APP_(.*)").unwrap();
        let tree = c.collect(&[spec], &EnvOptions::default()).unwrap();
        assert_eq!(tree.into_value(), json!({"a": "a"}));
    }

    #[test]
    fn test_transform_applied() {
        let c = env(&[("AGE", "1")]);
        let tree = c
            .collect_with(&[EnvSpec::name("AGE")], &EnvOptions::default(), |v| {
                let n: i64 = v.as_str().unwrap_or_default().parse()?;
                Ok(json!(n))
            })
            .unwrap();
        assert_eq!(tree.get("age"), Some(&json!(1)));
    }

    #[test]
    fn test_transform_failure_propagates() {
        let c = env(&[("AGE", "old")]);
        let err = c
            .collect_with(&[EnvSpec::name("AGE")], &EnvOptions::default(), |v| {
                let n: i64 = v.as_str().unwrap_or_default().parse()?;
                Ok(json!(n))
            })
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TransformFailed);
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_namespace() {
        let c = env(&[("A", "1")]);
        let opts = EnvOptions::new().with_namespace("env.vars");
        let tree = c.collect(&[EnvSpec::name("A")], &opts).unwrap();
        assert_eq!(tree.into_value(), json!({"env": {"vars": {"a": "1"}}}));
    }

    #[test]
    fn test_stray_dots_in_key_are_dropped() {
        let c = env(&[("OPTIMISM_A", "a"), ("OPTIMISM_B.", "b"), ("OPTIMISM_.C..D", "d")]);
        let spec = EnvSpec::pattern("OPTIMISM_(.*)").unwrap();
        let tree = c.collect(&[spec], &EnvOptions::default()).unwrap();
        assert_eq!(tree.into_value(), json!({"a": "a", "b": "b", "c": {"d": "d"}}));
    }

    #[test]
    fn test_key_path() {
        let opts = EnvOptions::new().with_split("_").unwrap();
        assert_eq!(opts.key_path("DB__HOST_"), "db.host");
        assert_eq!(opts.key_path("DB_.HOST"), "db.host");
        assert_eq!(EnvOptions::default().key_path("..A.B"), "a.b");
        assert_eq!(EnvOptions::default().key_path("."), "");
    }

    #[test]
    fn test_dotted_key_nests_without_split() {
        let c = env(&[("app.port", "80")]);
        let tree = c.collect(&[EnvSpec::name("app.port")], &EnvOptions::default()).unwrap();
        assert_eq!(tree.get("app.port"), Some(&json!("80")));
    }
}
