//! Error types for Tiller.

pub mod category;

pub use category::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all Tiller operations.
#[derive(Error, Debug)]
pub enum TillerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Aborted")]
    Aborted,
}

impl TillerError {
    /// Create an API error from an HTTP status and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) | Self::ModelNotFound(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Provider { .. } => ErrorCategory::Api,
            Self::ToolExecution { .. } | Self::UnknownTool { .. } | Self::InvalidArgument(_) => {
                ErrorCategory::ToolExecution
            }
            Self::Io(_) | Self::Backend(_) => ErrorCategory::Backend,
            Self::Aborted => ErrorCategory::Cancelled,
        }
    }

    /// Whether this error came from talking to the model backend.
    ///
    /// These abort the current turn; everything raised while running a tool is
    /// fed back to the model instead.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Authentication
                | ErrorCategory::RateLimit
                | ErrorCategory::Network
                | ErrorCategory::Timeout
                | ErrorCategory::Server
                | ErrorCategory::Api
                | ErrorCategory::Configuration
                | ErrorCategory::Serialization
        )
    }

    /// Whether this is the cancellation condition.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Suggest a recovery action for display.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::RateLimit | ErrorCategory::Server => RecoverySuggestion::RetryLater,
            ErrorCategory::Network => RecoverySuggestion::StartProviderDaemon,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            _ => RecoverySuggestion::None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TillerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_category() {
        assert_eq!(
            TillerError::api(401, "nope").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            TillerError::api(429, "slow down").category(),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            TillerError::api(503, "down").category(),
            ErrorCategory::Server
        );
        assert_eq!(TillerError::api(400, "bad").category(), ErrorCategory::Api);
    }

    #[test]
    fn tool_errors_are_not_provider_failures() {
        assert!(!TillerError::tool("read_file", "missing").is_provider_failure());
        assert!(!TillerError::backend("spawn failed").is_provider_failure());
        assert!(TillerError::api(500, "boom").is_provider_failure());
        assert!(TillerError::Authentication("Missing OPENAI_API_KEY".into()).is_provider_failure());
    }

    #[test]
    fn aborted_is_distinguished() {
        let err = TillerError::Aborted;
        assert!(err.is_aborted());
        assert!(!err.is_provider_failure());
        assert_eq!(err.to_string(), "Aborted");
    }
}
