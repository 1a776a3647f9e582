//! Shell commands with a bounded wait, plus polling and stopping.

use std::sync::Arc;

use serde_json::json;

use crate::backend::commands::{CHECK_BACKGROUND_CMD, EXEC_BACKGROUND_CMD, KILL_BACKGROUND_CMD};
use crate::backend::{CmdResult, CmdStatus};
use crate::tools::{FnTool, Tool, ToolParameters};
use crate::util::truncate_with_marker;

/// Characters kept from each of stdout and stderr.
const STREAM_MAX_CHARS: usize = 10_000;
const MAX_TIMEOUT_MS: u64 = 10 * 60 * 1000;

fn render_streams(result: &CmdResult) -> String {
    let mut out = String::new();
    let stdout = result.stdout.trim_end();
    let stderr = result.stderr.trim_end();
    if !stdout.is_empty() {
        out.push_str(&format!("STDOUT:\n{}\n", truncate_with_marker(stdout, STREAM_MAX_CHARS)));
    }
    if !stderr.is_empty() {
        out.push_str(&format!("STDERR:\n{}\n", truncate_with_marker(stderr, STREAM_MAX_CHARS)));
    }
    if out.is_empty() {
        out.push_str("(no output)\n");
    }
    out
}

/// Text shown to the model for a command snapshot.
pub fn render_cmd_result(result: &CmdResult) -> String {
    match result.status {
        CmdStatus::Completed => {
            let code = result
                .exit_code
                .map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string());
            format!("Command finished. Exit code: {code}\n{}", render_streams(result))
                .trim_end()
                .to_string()
        }
        CmdStatus::Running => format!(
            "Command is still running in the background (pid: {}). \
             Use check_background_cmd with this pid to poll it, or kill_background_cmd to stop it.\n\
             Output so far:\n{}",
            result.pid,
            render_streams(result)
        )
        .trim_end()
        .to_string(),
    }
}

pub fn run_terminal_cmd_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "run_terminal_cmd",
            "Run a shell command in the workspace. If it has not finished within the timeout it \
             keeps running in the background and a pid is returned.",
            ToolParameters::object()
                .string("command", "Shell command to run", true)
                .integer("timeout", "Milliseconds to wait before backgrounding (default 5000)", false)
                .build(),
            |args, ctx| async move {
                let command = args.get_str("command")?;
                let timeout_ms = args
                    .get_i64_opt("timeout")
                    .map(|t| (t.max(0) as u64).min(MAX_TIMEOUT_MS))
                    .unwrap_or(ctx.command_timeout.as_millis() as u64);

                let result: CmdResult = ctx
                    .invoke_as(
                        EXEC_BACKGROUND_CMD,
                        json!({
                            "command": command,
                            "cwd": ctx.cwd.to_string_lossy(),
                            "timeout_ms": timeout_ms,
                        }),
                    )
                    .await?;
                Ok(render_cmd_result(&result))
            },
        )
        .with_example(r#"{"tool": "run_terminal_cmd", "args": {"command": "cargo test", "timeout": 60000}}"#),
    )
}

pub fn check_background_cmd_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "check_background_cmd",
            "Poll a command that run_terminal_cmd moved to the background.",
            ToolParameters::object()
                .string("pid", "The pid returned by run_terminal_cmd", true)
                .build(),
            |args, ctx| async move {
                let result: CmdResult = ctx
                    .invoke_as(CHECK_BACKGROUND_CMD, json!({ "pid": args.get_str("pid")? }))
                    .await?;
                Ok(render_cmd_result(&result))
            },
        )
        .with_example(r#"{"tool": "check_background_cmd", "args": {"pid": "5f0c..."}}"#),
    )
}

pub fn kill_background_cmd_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "kill_background_cmd",
        "Stop a background command.",
        ToolParameters::object()
            .string("pid", "The pid returned by run_terminal_cmd", true)
            .build(),
        |args, ctx| async move {
            let pid = args.get_str("pid")?;
            ctx.invoke(KILL_BACKGROUND_CMD, json!({ "pid": pid })).await?;
            Ok(format!("Stopped background command {pid}."))
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: CmdStatus, stdout: &str, code: Option<i32>) -> CmdResult {
        CmdResult {
            status,
            pid: "p1".into(),
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: code,
        }
    }

    #[test]
    fn completed_shows_exit_code_and_output() {
        let text = render_cmd_result(&result(CmdStatus::Completed, "ok\n", Some(0)));
        assert_eq!(text, "Command finished. Exit code: 0\nSTDOUT:\nok");
    }

    #[test]
    fn running_shows_handle() {
        let text = render_cmd_result(&result(CmdStatus::Running, "", None));
        assert!(text.contains("pid: p1"));
        assert!(text.ends_with("(no output)"));
    }
}
