//! Error classification used by the agent loop and UI layers.

use serde::{Deserialize, Serialize};

/// Broad error category for routing failure handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    ToolExecution,
    Backend,
    Cancelled,
    Unknown,
}

/// Suggested recovery action shown next to a failed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryLater,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    StartProviderDaemon,
    None,
}
