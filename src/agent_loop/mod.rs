//! Agent loop primitives (runner, progress updates, prompt, call rendering).

pub mod events;
pub mod prompt;
pub mod render;
pub mod runner;

pub use events::*;
pub use prompt::system_prompt;
pub use render::render_call;
pub use runner::*;
