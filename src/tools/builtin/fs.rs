//! File tools: read, list, edit, clear, and glob search.

use std::path::Path;
use std::sync::Arc;

use globset::GlobBuilder;
use serde_json::json;

use crate::backend::commands::{LIST_DIR, LIST_FILES, READ_FILE, WRITE_FILE};
use crate::backend::FileEntry;
use crate::error::{Result, TillerError};
use crate::sketch;
use crate::tools::{FnTool, Tool, ToolContext, ToolParameters};
use crate::util::truncate_with_marker;

/// Characters of numbered file text returned by `read_file`.
pub const READ_FILE_MAX_CHARS: usize = 30_000;
const FILE_SEARCH_MAX_RESULTS: usize = 200;

/// Current text of a file: the editor buffer when it has unsaved changes,
/// otherwise what is on disk.
pub(crate) async fn current_content(ctx: &ToolContext, path: &Path) -> Result<String> {
    if let Some(doc) = ctx.editor.snapshot().document(path) {
        if doc.dirty {
            return Ok(doc.content.clone());
        }
    }
    ctx.invoke_as(READ_FILE, json!({ "path": path.to_string_lossy() })).await
}

/// Number lines from 1 and keep the `[offset, offset + limit)` window.
pub fn number_lines(content: &str, offset: Option<usize>, limit: Option<usize>) -> String {
    let start = offset.unwrap_or(1).max(1);
    let mut out = String::new();
    for (idx, line) in content
        .lines()
        .enumerate()
        .skip(start - 1)
        .take(limit.unwrap_or(usize::MAX))
    {
        out.push_str(&format!("{:>6}\t{line}\n", idx + 1));
    }
    out
}

pub fn read_file_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "read_file",
            "Read a file with 1-indexed line numbers. Use offset/limit to page through large files.",
            ToolParameters::object()
                .string("target_file", "Path to the file, relative to the workspace or absolute", true)
                .integer("offset", "First line to return (1-indexed)", false)
                .integer("limit", "Maximum number of lines to return", false)
                .build(),
            |args, ctx| async move {
                let path = ctx.resolve(args.get_str("target_file")?);
                let offset = args.get_i64_opt("offset").map(|o| o.max(1) as usize);
                let limit = args.get_i64_opt("limit").map(|l| l.max(0) as usize);

                let content = current_content(&ctx, &path).await?;
                if content.is_empty() {
                    return Ok(format!("{} is empty.", ctx.display(&path)));
                }
                let numbered = number_lines(&content, offset, limit);
                if numbered.is_empty() {
                    return Ok(format!(
                        "{} has {} lines; nothing at offset {}.",
                        ctx.display(&path),
                        content.lines().count(),
                        offset.unwrap_or(1)
                    ));
                }
                Ok(truncate_with_marker(&numbered, READ_FILE_MAX_CHARS))
            },
        )
        .with_example(r#"{"tool": "read_file", "args": {"target_file": "src/main.rs", "offset": 1, "limit": 200}}"#),
    )
}

pub fn list_dir_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "list_dir",
            "List the entries of one directory (not recursive).",
            ToolParameters::object()
                .string("target_directory", "Directory to list; '.' for the workspace root", true)
                .build(),
            |args, ctx| async move {
                let path = ctx.resolve(args.get_str("target_directory")?);
                let entries: Vec<FileEntry> =
                    ctx.invoke_as(LIST_DIR, json!({ "path": path.to_string_lossy() })).await?;
                if entries.is_empty() {
                    return Ok(format!("{} is empty.", ctx.display(&path)));
                }
                Ok(entries
                    .iter()
                    .map(|e| {
                        let marker = if e.is_dir { "[dir] " } else { "[file]" };
                        format!("{marker} {}", e.name)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            },
        )
        .with_example(r#"{"tool": "list_dir", "args": {"target_directory": "src"}}"#),
    )
}

pub fn edit_file_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "edit_file",
            "Create a file or edit an existing one. code_edit is either the complete new file, \
             or a sketch that keeps unchanged regions as a comment like `// ... existing code ...` \
             and includes a line before and after each change so it can be placed.",
            ToolParameters::object()
                .string("target_file", "File to create or modify", true)
                .string("code_edit", "Full content or a sketch with existing-code markers", true)
                .string("instructions", "One sentence describing the edit", false)
                .build(),
            |args, ctx| async move {
                let path = ctx.resolve(args.get_str("target_file")?);
                let sketch_text = args.get_str("code_edit")?;

                let (updated, created) = if sketch::has_markers(sketch_text) {
                    let existing = current_content(&ctx, &path).await.map_err(|e| {
                        TillerError::tool(
                            "edit_file",
                            format!(
                                "cannot apply a partial edit to {}: {e}",
                                ctx.display(&path)
                            ),
                        )
                    })?;
                    (sketch::apply_sketch_edit(&existing, sketch_text), false)
                } else {
                    let exists = ctx
                        .invoke(READ_FILE, json!({ "path": path.to_string_lossy() }))
                        .await
                        .is_ok();
                    (sketch_text.to_string(), !exists)
                };

                ctx.invoke(WRITE_FILE, json!({ "path": path.to_string_lossy(), "content": updated }))
                    .await?;
                ctx.editor.mirror_write(&path, &updated);

                let verb = if created { "Created" } else { "Updated" };
                Ok(format!(
                    "{verb} {} ({} lines).",
                    ctx.display(&path),
                    updated.lines().count()
                ))
            },
        )
        .with_example(
            r#"{"tool": "edit_file", "args": {"target_file": "src/lib.rs", "code_edit": "// ... existing code ...\nfn helper() {\n    todo!()\n}\n// ... existing code ..."}}"#,
        ),
    )
}

pub fn delete_file_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "delete_file",
            "Clear a file's contents. The file itself is left in place.",
            ToolParameters::object()
                .string("target_file", "File to clear", true)
                .build(),
            |args, ctx| async move {
                let path = ctx.resolve(args.get_str("target_file")?);
                ctx.invoke(READ_FILE, json!({ "path": path.to_string_lossy() })).await?;
                ctx.invoke(WRITE_FILE, json!({ "path": path.to_string_lossy(), "content": "" }))
                    .await?;
                ctx.editor.mirror_write(&path, "");
                Ok(format!("Cleared the contents of {}.", ctx.display(&path)))
            },
        )
        .with_example(r#"{"tool": "delete_file", "args": {"target_file": "old/notes.txt"}}"#),
    )
}

pub fn file_search_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "file_search",
            "Find files anywhere in the workspace whose path matches a glob pattern.",
            ToolParameters::object()
                .string("glob_pattern", "Glob such as **/*.rs or *config*", true)
                .build(),
            |args, ctx| async move {
                let pattern = args.get_str("glob_pattern")?.trim().to_string();
                let glob = GlobBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| TillerError::InvalidArgument(format!("invalid glob '{pattern}': {e}")))?
                    .compile_matcher();

                let files: Vec<String> = ctx
                    .invoke_as(LIST_FILES, json!({ "path": ctx.cwd.to_string_lossy() }))
                    .await?;
                let matches: Vec<String> = files
                    .iter()
                    .map(|f| ctx.display(Path::new(f)))
                    .filter(|rel| {
                        let name = rel.rsplit(['/', '\\']).next().unwrap_or(rel);
                        glob.is_match(rel) || glob.is_match(name)
                    })
                    .collect();

                if matches.is_empty() {
                    return Ok(format!("No files found matching '{pattern}'."));
                }
                let total = matches.len();
                let mut out = matches
                    .into_iter()
                    .take(FILE_SEARCH_MAX_RESULTS)
                    .collect::<Vec<_>>()
                    .join("\n");
                if total > FILE_SEARCH_MAX_RESULTS {
                    out.push_str(&format!(
                        "\n... ({} more files; narrow the pattern)",
                        total - FILE_SEARCH_MAX_RESULTS
                    ));
                }
                Ok(out)
            },
        )
        .with_example(r#"{"tool": "file_search", "args": {"glob_pattern": "**/*.toml"}}"#),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbering_respects_window() {
        let text = "a\nb\nc\nd";
        assert_eq!(number_lines(text, None, None), "     1\ta\n     2\tb\n     3\tc\n     4\td\n");
        assert_eq!(number_lines(text, Some(2), Some(2)), "     2\tb\n     3\tc\n");
        assert_eq!(number_lines(text, Some(9), None), "");
    }
}
