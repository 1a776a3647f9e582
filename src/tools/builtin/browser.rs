//! Browser tools. Sessions are identified by the label `browser_open` returns.

use std::sync::Arc;

use serde_json::json;

use crate::backend::commands::{
    AGENT_CLICK, AGENT_CLOSE, AGENT_GET_CONTENT, AGENT_HOVER, AGENT_SCROLL, AGENT_SPAWN, AGENT_TYPE,
};
use crate::tools::{FnTool, Tool, ToolParameters};

const LABEL_DESC: &str = "Session label returned by browser_open";
const SELECTOR_DESC: &str = "CSS selector of the target element";

pub fn browser_open_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "browser_open",
            "Open a URL in a new browser session.",
            ToolParameters::object()
                .string("url", "Absolute URL to open", true)
                .build(),
            |args, ctx| async move {
                let url = args.get_str("url")?;
                let label: String = ctx.invoke_as(AGENT_SPAWN, json!({ "url": url })).await?;
                Ok(format!(
                    "Opened {url} in browser session '{label}'. Pass this label to the other browser tools."
                ))
            },
        )
        .with_example(r#"{"tool": "browser_open", "args": {"url": "http://localhost:3000"}}"#),
    )
}

/// Tool that runs one selector-targeted action and confirms it.
fn selector_action(
    name: &'static str,
    description: &'static str,
    command: &'static str,
    past_tense: &'static str,
) -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        name,
        description,
        ToolParameters::object()
            .string("label", LABEL_DESC, true)
            .string("selector", SELECTOR_DESC, true)
            .build(),
        move |args, ctx| async move {
            let selector = args.get_str("selector")?;
            ctx.invoke(
                command,
                json!({ "label": args.get_str("label")?, "selector": selector }),
            )
            .await?;
            Ok(format!("{past_tense} '{selector}'."))
        },
    ))
}

pub fn browser_click_tool() -> Arc<dyn Tool> {
    selector_action("browser_click", "Click an element.", AGENT_CLICK, "Clicked")
}

pub fn browser_scroll_tool() -> Arc<dyn Tool> {
    selector_action(
        "browser_scroll",
        "Scroll an element into view.",
        AGENT_SCROLL,
        "Scrolled to",
    )
}

pub fn browser_hover_tool() -> Arc<dyn Tool> {
    selector_action(
        "browser_hover",
        "Move the pointer over an element.",
        AGENT_HOVER,
        "Hovered over",
    )
}

pub fn browser_type_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new(
            "browser_type",
            "Set the value of an input element.",
            ToolParameters::object()
                .string("label", LABEL_DESC, true)
                .string("selector", SELECTOR_DESC, true)
                .string("text", "Text to enter", true)
                .build(),
            |args, ctx| async move {
                let selector = args.get_str("selector")?;
                ctx.invoke(
                    AGENT_TYPE,
                    json!({
                        "label": args.get_str("label")?,
                        "selector": selector,
                        "text": args.get_str("text")?,
                    }),
                )
                .await?;
                Ok(format!("Typed into '{selector}'."))
            },
        )
        .with_example(r##"{"tool": "browser_type", "args": {"label": "agent-...", "selector": "#search", "text": "rust"}}"##),
    )
}

pub fn browser_read_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "browser_read",
        "Read the visible text of the page (first 5000 characters).",
        ToolParameters::object()
            .string("label", LABEL_DESC, true)
            .build(),
        |args, ctx| async move {
            let text: String = ctx
                .invoke_as(AGENT_GET_CONTENT, json!({ "label": args.get_str("label")? }))
                .await?;
            if text.trim().is_empty() {
                return Ok("(page has no visible text)".to_string());
            }
            Ok(text)
        },
    ))
}

pub fn browser_close_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "browser_close",
        "Close a browser session.",
        ToolParameters::object()
            .string("label", LABEL_DESC, true)
            .build(),
        |args, ctx| async move {
            let label = args.get_str("label")?;
            ctx.invoke(AGENT_CLOSE, json!({ "label": label })).await?;
            Ok(format!("Closed browser session '{label}'."))
        },
    ))
}
