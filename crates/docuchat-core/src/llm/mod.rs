//! LLM clients

pub mod client;
pub mod mock_client;
pub mod openai;

pub use client::{ChatPrompt, LlmClient, TokenStream};
pub use mock_client::{MockLlmClient, MockStep};
pub use openai::OpenAiClient;

use std::sync::Arc;

use crate::models::ModelSettings;

/// Build a fresh model client for the resolved settings.
///
/// Clients are constructed per call and hold no cross-request state.
pub fn client_for(
    settings: &ModelSettings,
    api_key: &str,
    base_url: Option<&str>,
) -> Arc<dyn LlmClient> {
    let mut client = OpenAiClient::new(api_key).with_model(&settings.model);
    if let Some(base_url) = base_url {
        client = client.with_base_url(base_url);
    }
    Arc::new(client)
}
