//! Configuration file resolution.
//!
//! Names come in three shapes:
//! - `~/.apprc`, `./local.yaml`, `../shared` - expanded against the home or
//!   current directory
//! - `/etc/app.toml` - taken as is
//! - `app` - a logical name searched for across the search path, trying the
//!   bare name and then each registered extension
//!
//! Resolution never fails: a name that matches nothing is simply `None`.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Environment variable holding the search path (platform path-list syntax).
pub const SEARCH_PATH_ENV: &str = "LAYERCONF_PATH";

/// Ordered list of directories searched for logical names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Discover the search path from `LAYERCONF_PATH`, or fall back to the
    /// current directory followed by `<config dir>/layerconf`.
    pub fn discover() -> Self {
        if let Some(raw) = std::env::var_os(SEARCH_PATH_ENV) {
            let dirs: Vec<PathBuf> = std::env::split_paths(&raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !dirs.is_empty() {
                return Self { dirs };
            }
        }

        let mut dirs = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            dirs.push(config_dir.join("layerconf"));
        }
        Self { dirs }
    }

    /// Create a search path with explicit directories.
    pub fn with_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Put `dir` ahead of every existing entry.
    pub fn prepend(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.insert(0, dir.into());
    }

    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

/// Turns file names into existing paths.
#[derive(Debug, Clone)]
pub struct FileResolver {
    search_path: SearchPath,
    extensions: Vec<String>,
}

impl FileResolver {
    pub fn new(search_path: SearchPath, extensions: Vec<String>) -> Self {
        Self {
            search_path,
            extensions,
        }
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Resolve `name` to a path that exists right now.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        // ~/.apprc, ./relative/path, ../relative/path
        if name.starts_with('~') || name.starts_with("./") || name.starts_with("../") {
            let expanded = expand(name)?;
            return existing(expanded);
        }

        // /absolute/path/to/rc
        let path = Path::new(name);
        if path.is_absolute() {
            return existing(path.to_path_buf());
        }

        self.search(name)
    }

    /// Candidate paths for a logical name, in the order they are tried.
    ///
    /// Directories form the outer loop; within a directory the bare name comes
    /// first, then each extension in registry order.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut out = Vec::with_capacity(self.search_path.dirs.len() * (self.extensions.len() + 1));
        for dir in &self.search_path.dirs {
            out.push(dir.join(name));
            for ext in &self.extensions {
                out.push(dir.join(format!("{}.{}", name, ext)));
            }
        }
        out
    }

    fn search(&self, name: &str) -> Option<PathBuf> {
        let found = self.candidates(name).into_iter().find(|p| p.is_file());
        match &found {
            Some(path) => debug!(name, path = %path.display(), "Resolved configuration file"),
            None => debug!(name, "No configuration file on search path"),
        }
        found
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() { Some(path) } else { None }
}

/// Expand a home- or cwd-relative name to an absolute, normalized path.
fn expand(name: &str) -> Option<PathBuf> {
    let absolute = if let Some(rest) = name.strip_prefix('~') {
        if !rest.is_empty() && !rest.starts_with('/') {
            debug!(name, "Home expansion for other users is not supported");
            return None;
        }
        let home = dirs::home_dir()?;
        home.join(rest.trim_start_matches('/'))
    } else {
        std::env::current_dir().ok()?.join(name)
    };
    Some(normalize_path_components(&absolute))
}

/// Resolve `.` and `..` lexically, without touching the filesystem.
fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    components.push(Component::ParentDir);
                }
            }
            other => components.push(other),
        }
    }

    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver(dirs: &[&Path]) -> FileResolver {
        FileResolver::new(
            SearchPath::with_dirs(dirs.iter().copied()),
            vec!["yaml".into(), "json".into()],
        )
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize_path_components(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(
            normalize_path_components(Path::new("/a/b/../../..")),
            PathBuf::from("/..")
        );
    }

    #[test]
    fn test_bare_name_before_extensions() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app"), "a = 1").unwrap();
        fs::write(temp.path().join("app.yaml"), "a: 2").unwrap();

        let found = resolver(&[temp.path()]).resolve("app").unwrap();
        assert_eq!(found, temp.path().join("app"));
    }

    #[test]
    fn test_extension_order() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.json"), "{}").unwrap();
        fs::write(temp.path().join("app.yaml"), "").unwrap();

        let found = resolver(&[temp.path()]).resolve("app").unwrap();
        assert_eq!(found, temp.path().join("app.yaml"));
    }

    #[test]
    fn test_directory_order_is_outer_loop() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        // json in the first dir beats yaml in the second, despite yaml
        // coming first in extension order
        fs::write(first.path().join("app.json"), "{}").unwrap();
        fs::write(second.path().join("app.yaml"), "").unwrap();

        let found = resolver(&[first.path(), second.path()]).resolve("app").unwrap();
        assert_eq!(found, first.path().join("app.json"));
    }

    #[test]
    fn test_directories_are_not_matches() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("app")).unwrap();
        fs::write(temp.path().join("app.json"), "{}").unwrap();

        let found = resolver(&[temp.path()]).resolve("app").unwrap();
        assert_eq!(found, temp.path().join("app.json"));
    }

    #[test]
    fn test_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(resolver(&[temp.path()]).resolve("missing").is_none());
        assert!(resolver(&[]).resolve("missing").is_none());
        assert!(resolver(&[temp.path()]).resolve("").is_none());
    }

    #[test]
    fn test_absolute_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("abs.yaml");
        fs::write(&path, "").unwrap();

        let r = resolver(&[]);
        assert_eq!(r.resolve(path.to_str().unwrap()), Some(path.clone()));
        let missing = temp.path().join("nope.yaml");
        assert!(r.resolve(missing.to_str().unwrap()).is_none());
    }

    #[test]
    fn test_absolute_path_skips_extensions() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("abs.yaml"), "").unwrap();

        let bare = temp.path().join("abs");
        assert!(resolver(&[]).resolve(bare.to_str().unwrap()).is_none());
    }

    #[test]
    fn test_relative_to_current_dir() {
        let r = resolver(&[]);
        let found = r.resolve("./Cargo.toml").unwrap();
        assert!(found.is_absolute());
        assert_eq!(found, std::env::current_dir().unwrap().join("Cargo.toml"));
        assert_eq!(r.resolve("./src/../Cargo.toml"), Some(found));
        assert!(r.resolve("./no-such-file.yaml").is_none());
    }

    #[test]
    fn test_parent_relative_to_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        let crate_dir = cwd.file_name().unwrap().to_str().unwrap();
        let name = format!("../{}/Cargo.toml", crate_dir);

        let found = resolver(&[]).resolve(&name).unwrap();
        assert_eq!(found, cwd.join("Cargo.toml"));
        assert!(resolver(&[]).resolve("../no-such-dir-here/app.yaml").is_none());
    }

    #[test]
    fn test_home_expansion() {
        let r = resolver(&[]);
        assert_eq!(r.resolve("~"), dirs::home_dir().filter(|home| home.exists()));
        assert!(r.resolve("~/surely-not-a-layerconf-file.yaml").is_none());
    }

    #[test]
    fn test_other_user_home_unsupported() {
        assert!(resolver(&[]).resolve("~nobody/.apprc").is_none());
    }

    #[test]
    fn test_candidates() {
        let r = resolver(&[Path::new("/one"), Path::new("/two")]);
        let got = r.candidates("app");
        let want: Vec<PathBuf> = [
            "/one/app",
            "/one/app.yaml",
            "/one/app.json",
            "/two/app",
            "/two/app.yaml",
            "/two/app.json",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_search_path_prepend() {
        let mut sp = SearchPath::with_dirs(["b"]);
        sp.prepend("a");
        sp.push("c");
        assert_eq!(
            sp.dirs(),
            &[PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]
        );
    }
}
