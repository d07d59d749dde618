//! Output formatting for configuration trees.

use crate::tree::Tree;
use clap::ValueEnum;
use serde_json::Value;

/// Output format for printed trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    #[value(alias = "yml")]
    Yaml,
    /// One `dot.path = value` line per leaf
    #[value(alias = "flat")]
    Rc,
}

/// Render `tree` in `format`. The result always ends with a newline.
pub fn render(tree: &Tree, format: OutputFormat) -> anyhow::Result<String> {
    let mut out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(tree.as_map())?,
        OutputFormat::Yaml => serde_yaml::to_string(tree.as_map())?,
        OutputFormat::Rc => format_rc(tree),
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Flatten a tree into rc lines, in insertion order.
///
/// Empty subtrees produce no lines.
pub fn format_rc(tree: &Tree) -> String {
    let mut lines = Vec::new();
    for (key, value) in tree.as_map() {
        flatten(key, value, &mut lines);
    }
    lines.join("\n")
}

fn flatten(prefix: &str, value: &Value, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&format!("{}.{}", prefix, key), child, lines);
            }
        }
        Value::String(s)
            if serde_json::from_str::<Value>(s).is_err() && s.trim() == s && !s.contains('\n') =>
        {
            lines.push(format!("{} = {}", prefix, s));
        }
        other => lines.push(format!("{} = {}", prefix, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Tree {
        Tree::from_value(json!({"server": {"port": 80, "host": "localhost"}, "debug": true}))
            .unwrap()
    }

    #[test]
    fn test_format_names() {
        assert_eq!(OutputFormat::from_str("JSON", true), Ok(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("yml", false), Ok(OutputFormat::Yaml));
        assert_eq!(OutputFormat::from_str("flat", false), Ok(OutputFormat::Rc));
        assert!(OutputFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn test_render_json_keeps_order() {
        let out = render(&sample(), OutputFormat::Json).unwrap();
        let server = out.find("server").unwrap();
        let debug = out.find("debug").unwrap();
        assert!(server < debug);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, sample().into_value());
    }

    #[test]
    fn test_render_yaml() {
        let out = render(&sample(), OutputFormat::Yaml).unwrap();
        assert!(out.contains("port: 80"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_render_rc() {
        let out = render(&sample(), OutputFormat::Rc).unwrap();
        assert_eq!(
            out,
            "server.port = 80\nserver.host = localhost\ndebug = true\n"
        );
    }

    #[test]
    fn test_rc_quotes_ambiguous_strings() {
        let tree = Tree::from_value(json!({"a": "1", "b": " padded", "c": "plain"})).unwrap();
        assert_eq!(format_rc(&tree), "a = \"1\"\nb = \" padded\"\nc = plain");
    }

    #[test]
    fn test_rc_multiline_strings_reparse() {
        let tree = Tree::from_value(json!({"motd": "hello\nworld", "name": "x"})).unwrap();
        let out = render(&tree, OutputFormat::Rc).unwrap();
        assert_eq!(out, "motd = \"hello\\nworld\"\nname = x\n");

        let reparsed = crate::sources::FormatRegistry::default()
            .parse(std::path::Path::new("out.rc"), &out)
            .unwrap();
        assert_eq!(reparsed, tree);
    }
}
