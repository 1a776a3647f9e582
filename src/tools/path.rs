//! Resolving tool path arguments against the working directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static ABSOLUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Za-z]:[\\/]|[\\/])").expect("absolute path regex must compile"));

/// Whether `raw` is absolute: a leading slash or a drive letter.
pub fn is_absolute(raw: &str) -> bool {
    ABSOLUTE_RE.is_match(raw)
}

/// Resolve a path argument: absolute paths are kept, others join `cwd`.
pub fn resolve_path(cwd: &Path, raw: &str) -> PathBuf {
    let raw = raw.trim();
    if is_absolute(raw) {
        PathBuf::from(raw)
    } else {
        let relative = raw.strip_prefix("./").unwrap_or(raw);
        if relative.is_empty() || relative == "." {
            cwd.to_path_buf()
        } else {
            cwd.join(relative)
        }
    }
}

/// Path shown to the model: relative to `cwd` when inside it.
pub fn display_path(cwd: &Path, path: &Path) -> String {
    path.strip_prefix(cwd)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_forms_are_kept() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_path(cwd, "/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(resolve_path(cwd, "C:\\x\\y"), PathBuf::from("C:\\x\\y"));
        assert_eq!(resolve_path(cwd, "d:/x"), PathBuf::from("d:/x"));
        assert!(!is_absolute("src/main.rs"));
    }

    #[test]
    fn relative_forms_join_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_path(cwd, "src/lib.rs"), PathBuf::from("/work/src/lib.rs"));
        assert_eq!(resolve_path(cwd, "./a"), PathBuf::from("/work/a"));
        assert_eq!(resolve_path(cwd, "."), PathBuf::from("/work"));
    }

    #[test]
    fn display_is_relative_inside_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(display_path(cwd, Path::new("/work/src/a.rs")), "src/a.rs");
        assert_eq!(display_path(cwd, Path::new("/elsewhere/b")), "/elsewhere/b");
    }
}
