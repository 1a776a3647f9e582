//! System prompt for the agent loop.
//!
//! The call grammar described here is what the parser's first dialect
//! expects, so the two change together.

use std::fmt::Write as _;

use crate::tools::ToolRegistry;

const PREAMBLE: &str = "You are an autonomous coding agent working inside the user's project. \
Work step by step: inspect the code before changing it, make focused edits, and verify your \
work when you can. Paths are relative to the project root unless absolute.";

const CALL_GRAMMAR: &str = "\
To use a tool, reply with exactly one fenced block tagged `tool` that contains a JSON object \
with a `tool` name and an `args` object:

```tool
{\"tool\": \"read_file\", \"args\": {\"target_file\": \"src/main.rs\"}}
```

Rules:
- Call at most one tool per reply. You will receive its result in the next message.
- Put any short explanation before the block, never after it.
- When the task is done, reply with your final answer in plain text and no tool block.";

const EDIT_GUIDE: &str = "\
Editing files with `edit_file`:
- To create a file or rewrite it completely, pass the whole new content as `code_edit`.
- To change part of a file, write only the changed lines and stand in for unchanged \
regions with a comment marker such as `// ... existing code ...` (use the comment syntax \
of the file: `#`, `--`, `<!-- -->` and so on).
- Include one unchanged line right before and right after each change so the edit can be \
placed. Without that anchor the new lines land at the end of the file.";

/// Build the system prompt listing every tool in `registry`.
pub fn system_prompt(registry: &ToolRegistry) -> String {
    let mut prompt = String::new();
    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\n");
    prompt.push_str(CALL_GRAMMAR);
    prompt.push_str("\n\nAvailable tools:\n");

    for tool in registry.tools() {
        let _ = writeln!(prompt, "\n## {}\n{}", tool.name(), tool.description());
        let parameters = tool.parameters();
        let required = parameters.required();
        for (name, description) in parameters.properties() {
            let flag = if required.contains(&name) {
                "required"
            } else {
                "optional"
            };
            let _ = writeln!(prompt, "- {name} ({flag}): {description}");
        }
        if let Some(example) = tool.example() {
            let _ = writeln!(prompt, "Example:\n```tool\n{example}\n```");
        }
    }

    prompt.push('\n');
    prompt.push_str(EDIT_GUIDE);
    prompt
}
