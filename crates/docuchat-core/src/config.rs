//! Environment-backed service configuration.

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Core configuration: where the external index service lives and how to reach
/// the model provider.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the external index-lookup service.
    pub index_url: String,
    /// API key for the model provider.
    pub openai_api_key: String,
    /// Override base URL for API-compatible model providers.
    pub openai_base_url: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            index_url: env_var("DOCUCHAT_INDEX_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8100".to_string()),
            openai_api_key: env_var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: env_var("OPENAI_BASE_URL"),
        }
    }
}
