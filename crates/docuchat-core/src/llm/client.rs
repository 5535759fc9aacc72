//! LLM client trait and streaming types

use std::pin::Pin;

use futures::Stream;

use crate::error::Result;
use crate::models::ChatMessage;

/// Lazy, single-pass, forward-only sequence of generated text fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Prompt handed to an LLM client.
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatPrompt {
    /// Create a new prompt
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

/// LLM client trait
pub trait LlmClient: Send + Sync {
    /// Get provider name
    fn provider(&self) -> &str;

    /// Get model name
    fn model(&self) -> &str;

    /// Start a streaming completion. Fragments arrive in generation order; the
    /// stream ends when the model finishes and is not restartable.
    fn stream_chat(&self, prompt: ChatPrompt) -> TokenStream;
}
