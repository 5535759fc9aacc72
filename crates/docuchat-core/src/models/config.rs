//! Per-request model configuration and the resolved client descriptor.

use serde::{Deserialize, Serialize};

/// Model used when a request carries no explicit configuration.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

fn default_max_tokens() -> u32 {
    2000
}

/// Model configuration as sent by clients on a chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Accepted for wire compatibility; not forwarded to the model client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Accepted for wire compatibility; not consumed.
    #[serde(default)]
    pub send_memory: bool,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Resolved model-client descriptor. Built fresh per request; holds no shared
/// state.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ModelSettings {
    /// Resolve request configuration into a client descriptor.
    ///
    /// An unset temperature stays unset so the model client applies its own
    /// default. A missing config falls back to [`DEFAULT_MODEL`] with no
    /// overrides at all.
    pub fn resolve(config: Option<&LlmConfig>) -> Self {
        match config {
            Some(config) => Self {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: Some(config.max_tokens),
            },
            None => Self {
                model: DEFAULT_MODEL.to_string(),
                temperature: None,
                max_tokens: None,
            },
        }
    }
}
