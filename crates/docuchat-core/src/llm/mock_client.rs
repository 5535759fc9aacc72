//! Deterministic mock LLM client for engine and endpoint tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_stream::try_stream;
use tokio::sync::Mutex;

use crate::error::Error;
use crate::models::Role;

use super::client::{ChatPrompt, LlmClient, TokenStream};

/// Deterministic step for scripted mock completions.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Stream the given fragments in order.
    Fragments(Vec<String>),
    /// Fail the stream after zero fragments.
    Error(String),
}

impl MockStep {
    /// Single-fragment response.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Fragments(vec![content.into()])
    }

    /// Multi-fragment response.
    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fragments(fragments.into_iter().map(Into::into).collect())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

/// A deterministic mock LLM client driven by scripted steps.
///
/// Clones share the script queue and the captured prompts, so a test can keep
/// a handle for assertions after handing a clone to the code under test. An
/// exhausted script echoes the last user message.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
    prompts: Arc<Mutex<Vec<ChatPrompt>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }

    /// Prompts received so far, in call order.
    pub async fn prompts(&self) -> Vec<ChatPrompt> {
        self.prompts.lock().await.clone()
    }

    fn fallback_fragment(prompt: &ChatPrompt) -> String {
        prompt
            .messages
            .iter()
            .rev()
            .find(|msg| msg.role == Role::User)
            .map(|msg| format!("mock-echo: {}", msg.content))
            .unwrap_or_else(|| "mock-ok".to_string())
    }
}

impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn stream_chat(&self, prompt: ChatPrompt) -> TokenStream {
        let client = self.clone();
        Box::pin(try_stream! {
            client.prompts.lock().await.push(prompt.clone());

            let step = client.script.lock().await.pop_front();
            match step {
                Some(MockStep::Fragments(fragments)) => {
                    for fragment in fragments {
                        yield fragment;
                    }
                }
                Some(MockStep::Error(message)) => {
                    Err(Error::Llm(message))?;
                }
                None => {
                    yield Self::fallback_fragment(&prompt);
                }
            }
        })
    }
}
