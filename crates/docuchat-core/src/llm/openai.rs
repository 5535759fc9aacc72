//! OpenAI LLM provider

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::llm::client::{ChatPrompt, LlmClient, TokenStream};
use crate::models::Role;

/// OpenAI-compatible chat completion client
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize, Debug)]
struct StreamResponse {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Debug)]
struct StreamDelta {
    content: Option<String>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

/// Drain complete SSE events from the buffer, returning their data payloads.
/// Events are terminated by a blank line; a trailing partial event stays in
/// the buffer.
fn drain_events(buffer: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(pos) = buffer.find("\n\n") {
        let event: String = buffer.drain(..pos + 2).collect();
        for line in event.lines() {
            if let Some(data) = line.strip_prefix("data: ") {
                payloads.push(data.to_string());
            }
        }
    }
    payloads
}

fn content_fragments(payload: &str) -> Vec<String> {
    let Ok(parsed) = serde_json::from_str::<StreamResponse>(payload) else {
        return Vec::new();
    };
    parsed
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .collect()
}

impl LlmClient for OpenAiClient {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn stream_chat(&self, prompt: ChatPrompt) -> TokenStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let base_url = self.base_url.clone();
        let model = self.model.clone();

        Box::pin(async_stream::stream! {
            let messages: Vec<WireMessage> = prompt
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: role_name(m.role),
                    content: m.content.clone(),
                })
                .collect();

            let body = serde_json::json!({
                "model": model,
                "messages": messages,
                "temperature": prompt.temperature,
                "max_tokens": prompt.max_tokens,
                "stream": true,
            });

            let response = match client
                .post(format!("{}/chat/completions", base_url))
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(Error::Llm(format!("Request failed: {}", e)));
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                yield Err(Error::Llm(format!("OpenAI API error {}: {}", status, text)));
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(Error::Llm(format!("Stream error: {}", e)));
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                for payload in drain_events(&mut buffer) {
                    if payload.trim() == "[DONE]" {
                        continue;
                    }
                    for fragment in content_fragments(&payload) {
                        yield Ok(fragment);
                    }
                }
            }

            // Flush a final event that lacks its trailing blank line, e.g. when
            // the connection was interrupted.
            let remaining = buffer.trim();
            if !remaining.is_empty() {
                for line in remaining.lines() {
                    if let Some(data) = line.strip_prefix("data: ")
                        && data.trim() != "[DONE]"
                    {
                        for fragment in content_fragments(data) {
                            yield Ok(fragment);
                        }
                    }
                }
            }
        })
    }
}
