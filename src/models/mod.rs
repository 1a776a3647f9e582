//! Model selection: which provider serves which model id.

pub mod provider_key;

pub use provider_key::ProviderKey;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TillerError;

/// A provider plus the model id it should serve, written `provider:model`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelSpec {
    pub provider: ProviderKey,
    pub model_id: String,
}

impl ModelSpec {
    pub fn new(provider: ProviderKey, model_id: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.as_str()
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider.as_str(), self.model_id)
    }
}

impl FromStr for ModelSpec {
    type Err = TillerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model_id) = s.split_once(':').ok_or_else(|| {
            TillerError::ModelNotFound(format!(
                "Invalid model '{s}'. Use provider:model (e.g. ollama:llama3.1)"
            ))
        })?;
        let provider = ProviderKey::parse(provider)
            .ok_or_else(|| TillerError::ModelNotFound(format!("Unknown provider '{provider}'")))?;
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(TillerError::ModelNotFound(format!("Missing model id in '{s}'")));
        }
        Ok(Self::new(provider, model_id))
    }
}

impl TryFrom<String> for ModelSpec {
    type Error = TillerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelSpec> for String {
    fn from(value: ModelSpec) -> Self {
        value.to_string()
    }
}
