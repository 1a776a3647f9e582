//! Convenience re-exports for common use.

pub use crate::agent_loop::{AgentRunner, AgentUpdate, RunOutcome};
pub use crate::backend::{Backend, LocalBackend};
pub use crate::config::{AgentSettings, TillerConfig};
pub use crate::error::{Result, TillerError};
pub use crate::models::{ModelSpec, ProviderKey};
pub use crate::provider::{create_provider, ModelProvider};
pub use crate::session::{AgentSession, ConversationEntry};
pub use crate::tools::{Tool, ToolArguments, ToolContext, ToolParameters, ToolRegistry};
pub use crate::types::{ChatMessage, GenerationSettings, Role, ToolCall};
