//! Tests for the tool registry and the built-in tools against a real directory.

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use tiller::backend::LocalBackend;
use tiller::error::TillerError;
use tiller::tools::{FnTool, ToolContext, ToolParameters, ToolRegistry};
use tiller::types::ToolCall;

fn context(cwd: &Path) -> ToolContext {
    ToolContext::new(cwd, Arc::new(LocalBackend::new()))
}

fn call(tool: &str, args: Value) -> ToolCall {
    ToolCall::from_value(&json!({ "tool": tool, "args": args })).unwrap()
}

async fn run(ctx: &ToolContext, tool: &str, args: Value) -> String {
    ToolRegistry::builtin().execute(&call(tool, args), ctx).await
}

#[test]
fn builtin_catalogue_is_complete() {
    let registry = ToolRegistry::builtin();
    let names = registry.names();
    for expected in [
        "read_file",
        "list_dir",
        "grep",
        "codebase_search",
        "edit_file",
        "delete_file",
        "file_search",
        "run_terminal_cmd",
        "check_background_cmd",
        "kill_background_cmd",
        "search_replace",
        "browser_open",
        "browser_click",
        "browser_type",
        "browser_scroll",
        "browser_hover",
        "browser_read",
        "browser_close",
        "schedule_request",
        "todo_write",
    ] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    assert_eq!(registry.len(), 20);
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = ToolRegistry::builtin();
    let dup = Arc::new(FnTool::new(
        "read_file",
        "shadow",
        ToolParameters::empty(),
        |_args, _ctx| async move { Ok(String::new()) },
    ));
    assert!(registry.register(dup).is_err());
}

#[tokio::test]
async fn custom_tool_runs_through_registry() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(FnTool::new(
            "shout",
            "Upper-case the input",
            ToolParameters::object()
                .string("text", "Text to shout", true)
                .build(),
            |args, _ctx| async move { Ok(args.get_str("text")?.to_uppercase()) },
        )))
        .unwrap();

    let ctx = context(dir.path());
    let out = registry
        .execute(&call("shout", json!({"text": "hey"})), &ctx)
        .await;
    assert_eq!(out, "HEY");

    let missing = registry.execute(&call("shout", json!({})), &ctx).await;
    assert!(missing.starts_with("Tool error: invalid arguments for shout"), "got {missing}");
}

#[tokio::test]
async fn handler_errors_become_tool_error_strings() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(FnTool::new(
            "flaky",
            "Always fails",
            ToolParameters::empty(),
            |_args, _ctx| async move { Err(TillerError::backend("disk on fire")) },
        )))
        .unwrap();

    let out = registry
        .execute(&call("flaky", json!({})), &context(dir.path()))
        .await;
    assert_eq!(out, "Tool error: disk on fire");
}

#[tokio::test]
async fn edit_file_creates_then_patches_with_sketch() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let created = run(
        &ctx,
        "edit_file",
        json!({"target_file": "src/lib.rs", "code_edit": "fn a() {}\n\nfn b() {}\n"}),
    )
    .await;
    assert_eq!(created, "Created src/lib.rs (3 lines).");

    let patched = run(
        &ctx,
        "edit_file",
        json!({
            "target_file": "src/lib.rs",
            "code_edit": "// ... existing code ...\nfn a() {}\n\nfn inserted() {}\n\nfn b() {}\n// ... existing code ..."
        }),
    )
    .await;
    assert!(patched.starts_with("Updated src/lib.rs"), "got {patched}");

    let content = std::fs::read_to_string(dir.path().join("src/lib.rs")).unwrap();
    assert_eq!(content, "fn a() {}\n\nfn inserted() {}\n\nfn b() {}\n");
}

#[tokio::test]
async fn edit_file_mirrors_into_open_document() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.md");
    std::fs::write(&file, "old").unwrap();
    let ctx = context(dir.path());
    ctx.editor.update(|state| state.open(file.clone(), "old"));

    run(
        &ctx,
        "edit_file",
        json!({"target_file": "notes.md", "code_edit": "new"}),
    )
    .await;

    let snapshot = ctx.editor.snapshot();
    assert_eq!(snapshot.document(&file).unwrap().content, "new");
}

#[tokio::test]
async fn sketch_edit_on_missing_file_is_a_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        &context(dir.path()),
        "edit_file",
        json!({"target_file": "nope.rs", "code_edit": "// ... existing code ...\nx"}),
    )
    .await;
    assert!(out.starts_with("Tool error:"), "got {out}");
}

#[tokio::test]
async fn read_file_numbers_and_windows_lines() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
    let ctx = context(dir.path());

    let all = run(&ctx, "read_file", json!({"target_file": "a.txt"})).await;
    assert_eq!(all, "     1\tone\n     2\ttwo\n     3\tthree\n");

    let window = run(
        &ctx,
        "read_file",
        json!({"target_file": "a.txt", "offset": 2, "limit": 1}),
    )
    .await;
    assert_eq!(window, "     2\ttwo\n");

    let absolute = dir.path().join("a.txt");
    let by_absolute = run(
        &ctx,
        "read_file",
        json!({"target_file": absolute.to_string_lossy(), "limit": 1}),
    )
    .await;
    assert_eq!(by_absolute, "     1\tone\n");
}

#[tokio::test]
async fn read_missing_file_is_a_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        &context(dir.path()),
        "read_file",
        json!({"target_file": "ghost.txt"}),
    )
    .await;
    assert!(out.starts_with("Tool error:"), "got {out}");
}

#[tokio::test]
async fn delete_file_empties_without_removing() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("gone.txt");
    std::fs::write(&file, "content").unwrap();

    let out = run(
        &context(dir.path()),
        "delete_file",
        json!({"target_file": "gone.txt"}),
    )
    .await;
    assert_eq!(out, "Cleared the contents of gone.txt.");
    assert!(file.exists());
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "");
}

#[tokio::test]
async fn list_dir_marks_dirs_and_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("README.md"), "").unwrap();
    std::fs::write(dir.path().join(".env"), "").unwrap();

    let out = run(
        &context(dir.path()),
        "list_dir",
        json!({"target_directory": "."}),
    )
    .await;
    assert_eq!(out, "[dir]  src\n[file] README.md");
}

#[tokio::test]
async fn file_search_matches_globs_or_says_none() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
    std::fs::write(dir.path().join("src/nested/Config.toml"), "").unwrap();
    std::fs::write(dir.path().join("src/main.rs"), "").unwrap();
    let ctx = context(dir.path());

    let found = run(&ctx, "file_search", json!({"glob_pattern": "*.toml"})).await;
    assert_eq!(found, "src/nested/Config.toml");

    let none = run(&ctx, "file_search", json!({"glob_pattern": "*.py"})).await;
    assert_eq!(none, "No files found matching '*.py'.");
}

#[tokio::test]
async fn grep_reports_path_line_text() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("lib.rs"),
        "fn alpha() {}\nfn beta() {}\n",
    )
    .unwrap();
    let ctx = context(dir.path());

    let out = run(&ctx, "grep", json!({"pattern": "fn b\\w+"})).await;
    assert_eq!(out, "lib.rs:2: fn beta() {}");

    let none = run(&ctx, "grep", json!({"pattern": "gamma"})).await;
    assert_eq!(none, "No matches found for pattern 'gamma'.");
}

#[tokio::test]
async fn grep_skips_gitignored_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();
    std::fs::create_dir_all(dir.path().join("generated")).unwrap();
    std::fs::write(dir.path().join("generated/out.rs"), "fn needle() {}\n").unwrap();
    std::fs::write(dir.path().join("lib.rs"), "fn needle() {}\n").unwrap();

    let out = run(&context(dir.path()), "grep", json!({"pattern": "needle"})).await;
    assert_eq!(out, "lib.rs:1: fn needle() {}");
}

#[tokio::test]
async fn codebase_search_is_literal_and_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "Retry Policy (a+b)\nother\n").unwrap();

    let out = run(
        &context(dir.path()),
        "codebase_search",
        json!({"query": "retry policy (a+b)"}),
    )
    .await;
    assert_eq!(out, "notes.txt:1: Retry Policy (a+b)");
}

#[tokio::test]
async fn search_replace_counts_occurrences() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Cargo.toml");
    std::fs::write(&file, "version = \"0.1.0\"\ndep = \"0.1.0\"\n").unwrap();
    let ctx = context(dir.path());

    let out = run(
        &ctx,
        "search_replace",
        json!({"target_file": "Cargo.toml", "search": "0.1.0", "replace": "0.2.0", "all": true}),
    )
    .await;
    assert_eq!(out, "Replaced 2 occurrences in Cargo.toml.");
    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        "version = \"0.2.0\"\ndep = \"0.2.0\"\n"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn run_terminal_cmd_returns_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        &context(dir.path()),
        "run_terminal_cmd",
        json!({"command": "echo hello", "timeout": 5000}),
    )
    .await;
    assert_eq!(out, "Command finished. Exit code: 0\nSTDOUT:\nhello");
}

#[cfg(unix)]
#[tokio::test]
async fn slow_command_moves_to_background_and_can_be_killed() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let out = run(
        &ctx,
        "run_terminal_cmd",
        json!({"command": "sleep 30", "timeout": 100}),
    )
    .await;
    assert!(out.starts_with("Command is still running in the background (pid: "), "got {out}");

    let pid = out
        .split("(pid: ")
        .nth(1)
        .and_then(|rest| rest.split(')').next())
        .unwrap()
        .to_string();
    let status = run(&ctx, "check_background_cmd", json!({"pid": pid})).await;
    assert!(status.contains("still running"), "got {status}");

    let killed = run(&ctx, "kill_background_cmd", json!({"pid": pid})).await;
    assert_eq!(killed, format!("Stopped background command {pid}."));
}

#[tokio::test]
async fn schedule_request_and_todo_write_acknowledge() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());

    let scheduled = run(
        &ctx,
        "schedule_request",
        json!({"delay_seconds": 60, "message": "check CI"}),
    )
    .await;
    assert!(scheduled.starts_with("Reminder scheduled for "), "got {scheduled}");

    let rejected = run(
        &ctx,
        "schedule_request",
        json!({"delay_seconds": -5, "message": "too early"}),
    )
    .await;
    assert!(rejected.starts_with("Tool error:"));

    let ack = run(&ctx, "todo_write", json!({"todos": ["a", "b"]})).await;
    assert_eq!(ack, "Todo list noted.");
    ctx.scheduler.cancel_pending();
}

#[tokio::test]
async fn browser_tools_report_missing_window() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        &context(dir.path()),
        "browser_read",
        json!({"label": "agent-missing"}),
    )
    .await;
    assert!(out.starts_with("Tool error:"), "got {out}");
    assert!(out.contains("Window not found"), "got {out}");
}
