//! Reminders and advisory todo tracking.

use std::sync::Arc;
use std::time::Duration;

use crate::error::TillerError;
use crate::tools::{FnTool, Tool, ToolParameters};

const MAX_DELAY_SECONDS: f64 = 24.0 * 60.0 * 60.0;

pub const TODO_ACK: &str = "Todo list noted.";

pub fn schedule_request_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "schedule_request",
            "Ask to be reminded with a message after a delay, e.g. to check on a long build. \
             The reminder arrives as a user message at the next step, or starts a new turn if \
             this one has ended.",
            ToolParameters::object()
                .number("delay_seconds", "Seconds to wait", true)
                .string("message", "Reminder text", true)
                .build(),
            |args, ctx| async move {
                let delay = args.get_f64("delay_seconds")?;
                if !(0.0..=MAX_DELAY_SECONDS).contains(&delay) {
                    return Err(TillerError::InvalidArgument(format!(
                        "delay_seconds must be between 0 and {MAX_DELAY_SECONDS}"
                    )));
                }
                let message = args.get_str("message")?;
                let due_at = ctx
                    .scheduler
                    .schedule(Duration::from_secs_f64(delay), message);
                Ok(format!(
                    "Reminder scheduled for {} ({delay} seconds from now).",
                    due_at.format("%H:%M:%S UTC")
                ))
            },
        )
        .with_example(r#"{"tool": "schedule_request", "args": {"delay_seconds": 60, "message": "check the test run"}}"#),
    )
}

pub fn todo_write_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "todo_write",
        "Record your plan as a todo list. Advisory only; nothing is executed.",
        ToolParameters::object()
            .string_array("todos", "Todo items", false)
            .build(),
        |_args, _ctx| async move { Ok(TODO_ACK.to_string()) },
    ))
}
