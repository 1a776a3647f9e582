//! Workspace text search.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::fs::walk_files;
use crate::error::{Result, TillerError};

pub const DEFAULT_MAX_RESULTS: usize = 500;
const MAX_MATCHES_PER_FILE: usize = 100;
const MAX_FILE_BYTES: u64 = 1024 * 1024;

/// One matching span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub path: String,
    /// 1-indexed.
    pub line_number: u64,
    /// Byte offset of the match within the line.
    pub column: u64,
    pub line_text: String,
    pub match_text: String,
}

/// Options for [`search`].
#[derive(Debug, Clone, Deserialize)]
pub struct SearchOptions {
    pub query: String,
    pub cwd: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub regex: bool,
    pub max_results: Option<usize>,
}

/// Search every text file under `cwd` (or `cwd` itself when it is a file).
pub async fn search(options: SearchOptions) -> Result<Vec<SearchMatch>> {
    if options.query.is_empty() {
        return Ok(Vec::new());
    }
    let pattern = if options.regex {
        options.query.clone()
    } else {
        regex::escape(&options.query)
    };
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|e| TillerError::backend(format!("invalid search pattern: {e}")))?;
    let max = options.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    let root = PathBuf::from(&options.cwd);

    tokio::task::spawn_blocking(move || {
        let files = if root.is_file() {
            vec![root.clone()]
        } else {
            walk_files(&root)
        };
        let mut results = Vec::new();
        for file in files {
            if results.len() >= max {
                break;
            }
            scan_file(&file, &re, max, &mut results);
        }
        results
    })
    .await
    .map_err(|e| TillerError::backend(format!("search failed: {e}")))
}

fn scan_file(path: &Path, re: &Regex, max: usize, out: &mut Vec<SearchMatch>) {
    let too_big = std::fs::metadata(path)
        .map(|m| m.len() > MAX_FILE_BYTES)
        .unwrap_or(true);
    if too_big {
        return;
    }
    // Binary and non-UTF-8 files are skipped.
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    if content.contains('\0') {
        return;
    }

    let path_text = path.to_string_lossy().to_string();
    let mut in_file = 0;
    for (idx, line) in content.lines().enumerate() {
        for m in re.find_iter(line) {
            out.push(SearchMatch {
                path: path_text.clone(),
                line_number: idx as u64 + 1,
                column: m.start() as u64,
                line_text: line.trim_end().to_string(),
                match_text: m.as_str().to_string(),
            });
            in_file += 1;
            if out.len() >= max || in_file >= MAX_MATCHES_PER_FILE {
                return;
            }
        }
    }
}
