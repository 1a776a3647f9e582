//! Filesystem commands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ignore::WalkBuilder;

use crate::error::{Result, TillerError};

/// Largest file `read_file` will load.
pub const MAX_READ_BYTES: u64 = 10 * 1024 * 1024;

/// Directories skipped by listings and searches.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "target",
    "dist",
    "build",
    ".next",
    ".nuxt",
    ".output",
    "__pycache__",
    ".cache",
    ".parcel-cache",
    "coverage",
    ".idea",
    ".vscode",
];

/// OS clutter skipped by listings.
pub const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// One `list_dir` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
}

pub fn is_ignored_dir(name: &str) -> bool {
    IGNORED_DIRS.contains(&name)
}

pub fn is_ignored_file(name: &str) -> bool {
    IGNORED_FILES.contains(&name)
}

fn io_error(path: &Path, e: std::io::Error) -> TillerError {
    TillerError::backend(format!("{}: {e}", path.display()))
}

pub async fn read_file(path: &Path) -> Result<String> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| io_error(path, e))?;
    if meta.len() > MAX_READ_BYTES {
        return Err(TillerError::backend("File exceeds 10MB limit"));
    }
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| io_error(path, e))
}

/// Write a file, creating missing parent directories.
pub async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| io_error(path, e))
}

/// Non-recursive listing, directories first, then by case-insensitive name.
pub async fn list_dir(path: &Path) -> Result<Vec<FileEntry>> {
    if !tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(TillerError::backend(format!(
            "{}: Not a directory",
            path.display()
        )));
    }

    let mut read_dir = tokio::fs::read_dir(path)
        .await
        .map_err(|e| io_error(path, e))?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(|e| io_error(path, e))? {
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let is_dir = metadata.is_dir();
        if (is_dir && is_ignored_dir(&name)) || (!is_dir && is_ignored_file(&name)) {
            continue;
        }
        entries.push(FileEntry {
            name,
            path: entry.path().to_string_lossy().to_string(),
            is_dir,
        });
    }

    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    Ok(entries)
}

pub fn get_basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Recursive file listing under `root`. Honors `.gitignore` and `.ignore`
/// files and skips hidden entries and the ignored directories.
pub async fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || walk_files(&root))
        .await
        .map_err(|e| TillerError::backend(format!("file walk failed: {e}")))
}

pub(crate) fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(true);
    builder.ignore(true);
    builder.git_ignore(true);
    builder.git_exclude(true);
    builder.git_global(true);
    builder.parents(true);
    builder.require_git(false);
    builder.sort_by_file_name(|a, b| a.cmp(b));
    builder.filter_entry(|entry| {
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        entry.depth() == 0 || !is_dir || !is_ignored_dir(&entry.file_name().to_string_lossy())
    });

    let mut files = Vec::new();
    for entry in builder.build() {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                if is_ignored_file(&entry.file_name().to_string_lossy()) {
                    continue;
                }
                files.push(entry.into_path());
            }
            Err(error) => tracing::debug!(%error, "skipping unreadable entry"),
        }
    }
    files
}

/// Replace the first (or every) literal occurrence of `search`. Returns the count.
pub async fn search_replace(path: &Path, search: &str, replace: &str, all: bool) -> Result<u32> {
    if search.is_empty() {
        return Err(TillerError::backend("search text must not be empty"));
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| io_error(path, e))?;

    let (updated, count) = if all {
        let count = content.matches(search).count() as u32;
        (content.replace(search, replace), count)
    } else if content.contains(search) {
        (content.replacen(search, replace, 1), 1)
    } else {
        (content, 0)
    };

    if count > 0 {
        tokio::fs::write(path, updated)
            .await
            .map_err(|e| io_error(path, e))?;
    }
    Ok(count)
}
