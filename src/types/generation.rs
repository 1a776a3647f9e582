//! Generation settings shared by every provider.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Settings controlling a single model call.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub stop_sequences: Option<Vec<String>>,
    pub response_format: Option<ResponseFormat>,
}

impl GenerationSettings {
    /// Copy of these settings that asks the provider for strict JSON output.
    pub fn force_json(&self) -> Self {
        Self {
            response_format: Some(ResponseFormat::JsonObject),
            ..self.clone()
        }
    }

    pub fn wants_json(&self) -> bool {
        matches!(self.response_format, Some(ResponseFormat::JsonObject))
    }
}

/// Requested response format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
}
