//! Content search and literal replace.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::backend::commands::{READ_FILE, RIPGREP_SEARCH, SEARCH_REPLACE};
use crate::backend::SearchMatch;
use crate::error::Result;
use crate::tools::{FnTool, Tool, ToolContext, ToolParameters};

const GREP_MAX_LINES: usize = 100;
const CODEBASE_MAX_LINES: usize = 50;

/// One `path:line: text` entry per matching line, paths shown relative to cwd.
fn render_matches(ctx: &ToolContext, matches: &[SearchMatch], max_lines: usize) -> String {
    let mut seen = HashSet::new();
    let lines: Vec<String> = matches
        .iter()
        .filter(|m| seen.insert((m.path.as_str(), m.line_number)))
        .map(|m| {
            format!(
                "{}:{}: {}",
                ctx.display(Path::new(&m.path)),
                m.line_number,
                m.line_text.trim()
            )
        })
        .collect();

    let total = lines.len();
    let mut out = lines.into_iter().take(max_lines).collect::<Vec<_>>().join("\n");
    if total > max_lines {
        out.push_str(&format!(
            "\n... ({} more matching lines; refine the search)",
            total - max_lines
        ));
    }
    out
}

async fn run_search(
    ctx: &ToolContext,
    query: &str,
    root: &Path,
    regex: bool,
    case_sensitive: bool,
    max_results: usize,
) -> Result<Vec<SearchMatch>> {
    ctx.invoke_as(
        RIPGREP_SEARCH,
        json!({
            "query": query,
            "cwd": root.to_string_lossy(),
            "regex": regex,
            "case_sensitive": case_sensitive,
            "max_results": max_results,
        }),
    )
    .await
}

pub fn grep_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "grep",
            "Search file contents with a regular expression. Returns path:line: text for each match.",
            ToolParameters::object()
                .string("pattern", "Regular expression to search for", true)
                .string("path", "File or directory to search; defaults to the workspace", false)
                .boolean("case_sensitive", "Match case exactly (default true)", false)
                .build(),
            |args, ctx| async move {
                let pattern = args.get_str("pattern")?;
                let root = ctx.resolve(args.get_str_opt("path").unwrap_or("."));
                let case_sensitive = args.get_bool_opt("case_sensitive").unwrap_or(true);

                let matches =
                    run_search(&ctx, pattern, &root, true, case_sensitive, GREP_MAX_LINES * 2)
                        .await?;
                if matches.is_empty() {
                    return Ok(format!("No matches found for pattern '{pattern}'."));
                }
                Ok(render_matches(&ctx, &matches, GREP_MAX_LINES))
            },
        )
        .with_example(r#"{"tool": "grep", "args": {"pattern": "fn\\s+parse_", "path": "src"}}"#),
    )
}

pub fn codebase_search_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "codebase_search",
            "Find code mentioning a phrase across the workspace (case-insensitive, literal text).",
            ToolParameters::object()
                .string("query", "Text to look for", true)
                .string_array(
                    "target_directories",
                    "Directories to limit the search to; defaults to the whole workspace",
                    false,
                )
                .build(),
            |args, ctx| async move {
                let query = args.get_str("query")?.trim().to_string();
                let mut roots: Vec<_> = args
                    .get_str_list("target_directories")
                    .iter()
                    .map(|d| ctx.resolve(d))
                    .collect();
                if roots.is_empty() {
                    roots.push(ctx.cwd.clone());
                }

                let mut matches = Vec::new();
                for root in &roots {
                    if matches.len() >= CODEBASE_MAX_LINES * 2 {
                        break;
                    }
                    let remaining = CODEBASE_MAX_LINES * 2 - matches.len();
                    matches.extend(run_search(&ctx, &query, root, false, false, remaining).await?);
                }
                if matches.is_empty() {
                    return Ok(format!("No results found for '{query}'."));
                }
                Ok(render_matches(&ctx, &matches, CODEBASE_MAX_LINES))
            },
        )
        .with_example(r#"{"tool": "codebase_search", "args": {"query": "retry policy", "target_directories": ["src"]}}"#),
    )
}

pub fn search_replace_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "search_replace",
            "Replace exact text in a file. Replaces the first occurrence unless all is true.",
            ToolParameters::object()
                .string("target_file", "File to modify", true)
                .string("search", "Exact text to find", true)
                .string("replace", "Replacement text", true)
                .boolean("all", "Replace every occurrence", false)
                .build(),
            |args, ctx| async move {
                let path = ctx.resolve(args.get_str("target_file")?);
                let count: u32 = ctx
                    .invoke_as(
                        SEARCH_REPLACE,
                        json!({
                            "file_path": path.to_string_lossy(),
                            "search": args.get_str("search")?,
                            "replace": args.get_str("replace")?,
                            "all": args.get_bool_opt("all").unwrap_or(false),
                        }),
                    )
                    .await?;

                if count == 0 {
                    return Ok(format!(
                        "No occurrences of the search text in {}. Nothing changed.",
                        ctx.display(&path)
                    ));
                }
                if ctx.editor.snapshot().document(&path).is_some() {
                    let content: String = ctx
                        .invoke_as(READ_FILE, json!({ "path": path.to_string_lossy() }))
                        .await?;
                    ctx.editor.mirror_write(&path, &content);
                }
                Ok(format!(
                    "Replaced {count} occurrence{} in {}.",
                    if count == 1 { "" } else { "s" },
                    ctx.display(&path)
                ))
            },
        )
        .with_example(r#"{"tool": "search_replace", "args": {"target_file": "Cargo.toml", "search": "0.1.0", "replace": "0.2.0"}}"#),
    )
}
