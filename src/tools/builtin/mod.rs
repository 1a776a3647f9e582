//! Built-in tool catalogue.
//!
//! Each tool is a [`FnTool`](super::FnTool) whose handler reaches the
//! workspace only through the context's [`Backend`](crate::backend::Backend).

pub mod browser;
pub mod fs;
pub mod misc;
pub mod search;
pub mod terminal;

use std::sync::Arc;

use super::Tool;

/// Every built-in tool, in catalogue order.
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        fs::read_file_tool(),
        fs::list_dir_tool(),
        search::grep_tool(),
        search::codebase_search_tool(),
        fs::edit_file_tool(),
        fs::delete_file_tool(),
        fs::file_search_tool(),
        search::search_replace_tool(),
        terminal::run_terminal_cmd_tool(),
        terminal::check_background_cmd_tool(),
        terminal::kill_background_cmd_tool(),
        browser::browser_open_tool(),
        browser::browser_click_tool(),
        browser::browser_type_tool(),
        browser::browser_scroll_tool(),
        browser::browser_hover_tool(),
        browser::browser_read_tool(),
        browser::browser_close_tool(),
        misc::schedule_request_tool(),
        misc::todo_write_tool(),
    ]
}
