//! Filesystem path and dotted module path utilities.

use std::path::{Component, Path, PathBuf};

/// Drops `.` components so that `./src/a` and `src/a` compare equal.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Converts a project-relative file path to its dotted module path.
///
/// The first source root containing the file wins. `pkg/__init__.py` maps to
/// `pkg`, `pkg/mod.py` maps to `pkg.mod`.
///
/// # Example
///
/// ```ignore
/// let roots = vec![PathBuf::from("src")];
/// assert_eq!(file_to_module_path(&roots, Path::new("src/core/api.py")), Some("core.api".into()));
/// ```
#[must_use]
pub fn file_to_module_path(source_roots: &[PathBuf], file: &Path) -> Option<String> {
    let file = normalize(file);
    let rel = strip_source_root(source_roots, &file)?;
    let mut parts = components_as_strings(&rel.with_extension(""))?;
    if parts.last().is_some_and(|last| last == "__init__") {
        parts.pop();
    }
    Some(parts.join("."))
}

/// Converts a project-relative directory to its dotted module path.
///
/// Returns `None` if the directory is outside every source root or is a
/// source root itself.
#[must_use]
pub fn dir_to_module_path(source_roots: &[PathBuf], dir: &Path) -> Option<String> {
    let dir = normalize(dir);
    let rel = strip_source_root(source_roots, &dir)?;
    let parts = components_as_strings(&rel)?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}

fn strip_source_root(source_roots: &[PathBuf], path: &Path) -> Option<PathBuf> {
    source_roots.iter().find_map(|root| {
        let root = normalize(root);
        path.strip_prefix(&root).ok().map(Path::to_path_buf)
    })
}

fn components_as_strings(path: &Path) -> Option<Vec<String>> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_str().map(String::from)),
            Component::CurDir => None,
            _ => Some(None),
        })
        .collect()
}

/// Returns true if `full` equals `prefix` or is a dotted child of it.
///
/// `a.b` is a prefix of `a.b` and `a.b.c` but not of `a.bc`.
#[must_use]
pub fn is_module_prefix(prefix: &str, full: &str) -> bool {
    if !full.starts_with(prefix) {
        return false;
    }
    full.len() == prefix.len() || full[prefix.len()..].starts_with('.')
}

/// Joins a module path and a member name, tolerating an empty module.
#[must_use]
pub fn join_module(module: &str, member: &str) -> String {
    match (module.is_empty(), member.is_empty()) {
        (true, _) => member.to_string(),
        (_, true) => module.to_string(),
        _ => format!("{module}.{member}"),
    }
}

/// Resolves a relative import to an absolute module path.
///
/// * `file_module` - module path of the importing file
/// * `is_package_init` - whether the importing file is an `__init__.py`
/// * `level` - number of leading dots (must be at least 1)
/// * `module` - the dotted remainder after the dots, possibly empty
///
/// Returns `None` when the import climbs above the source root.
#[must_use]
pub fn resolve_relative(
    file_module: &str,
    is_package_init: bool,
    level: usize,
    module: &str,
) -> Option<String> {
    let mut parts: Vec<&str> = if file_module.is_empty() {
        Vec::new()
    } else {
        file_module.split('.').collect()
    };
    if !is_package_init {
        parts.pop()?;
    }
    for _ in 1..level {
        parts.pop()?;
    }
    Some(join_module(&parts.join("."), module))
}

/// Returns true if any component of the path starts with `.`.
#[must_use]
pub fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(s) => s.to_str().is_some_and(|s| s.starts_with('.')),
        _ => false,
    })
}

/// Returns true if a pattern matches the whole relative path or any single
/// component of it.
#[must_use]
pub fn is_excluded(path: &Path, patterns: &[glob::Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let path = normalize(path);
    let whole = path.to_string_lossy();
    patterns.iter().any(|p| {
        p.matches(&whole)
            || path.components().any(|c| match c {
                Component::Normal(s) => s.to_str().is_some_and(|s| p.matches(s)),
                _ => false,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots(r: &[&str]) -> Vec<PathBuf> {
        r.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_file_to_module_path() {
        let r = roots(&["."]);
        assert_eq!(
            file_to_module_path(&r, Path::new("core/__init__.py")),
            Some("core".to_string())
        );
        assert_eq!(
            file_to_module_path(&r, Path::new("core/api/views.py")),
            Some("core.api.views".to_string())
        );
        assert_eq!(
            file_to_module_path(&r, Path::new("__init__.py")),
            Some(String::new())
        );
    }

    #[test]
    fn test_file_to_module_path_with_source_root() {
        let r = roots(&["src", "lib"]);
        assert_eq!(
            file_to_module_path(&r, Path::new("./lib/db/models.py")),
            Some("db.models".to_string())
        );
        assert_eq!(file_to_module_path(&r, Path::new("scripts/run.py")), None);
    }

    #[test]
    fn test_dir_to_module_path() {
        let r = roots(&["src"]);
        assert_eq!(
            dir_to_module_path(&r, Path::new("src/core/db")),
            Some("core.db".to_string())
        );
        assert_eq!(dir_to_module_path(&r, Path::new("src")), None);
        assert_eq!(dir_to_module_path(&r, Path::new("other")), None);
    }

    #[test]
    fn test_is_module_prefix() {
        assert!(is_module_prefix("a.b", "a.b"));
        assert!(is_module_prefix("a.b", "a.b.c"));
        assert!(!is_module_prefix("a.b", "a.bc"));
        assert!(!is_module_prefix("a.b.c", "a.b"));
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative("a.b.c", false, 1, ""),
            Some("a.b".to_string())
        );
        assert_eq!(
            resolve_relative("a.b.c", false, 2, "x"),
            Some("a.x".to_string())
        );
        assert_eq!(
            resolve_relative("a.b", true, 1, "y"),
            Some("a.b.y".to_string())
        );
        assert_eq!(resolve_relative("a", false, 2, "x"), None);
    }

    #[test]
    fn test_hidden_and_excluded() {
        assert!(is_hidden(Path::new("a/.venv/lib.py")));
        assert!(!is_hidden(Path::new("./a/lib.py")));

        let patterns = vec![
            glob::Pattern::new("tests").unwrap(),
            glob::Pattern::new("build/*").unwrap(),
        ];
        assert!(is_excluded(Path::new("core/tests/test_api.py"), &patterns));
        assert!(is_excluded(Path::new("build/gen.py"), &patterns));
        assert!(!is_excluded(Path::new("core/api.py"), &patterns));
    }
}
