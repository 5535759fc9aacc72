//! Retrieval-augmented chat engine.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::index::{ContextChunk, Retriever};
use crate::llm::{ChatPrompt, LlmClient, TokenStream};
use crate::models::{ChatMessage, ModelSettings};

const CONTEXT_PREAMBLE: &str = "You are a helpful assistant answering questions \
about a document collection. Use the context below to answer. If the context \
is not relevant to the question, say that you do not know.";

/// Streamed chat response. `response_gen` yields fragments in generation
/// order and ends when the model finishes.
pub struct StreamingChatResponse {
    pub response_gen: TokenStream,
}

/// Chat engine boundary: a message plus history in, a fragment stream out.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    async fn stream_chat(
        &self,
        message: &str,
        history: Vec<ChatMessage>,
    ) -> Result<StreamingChatResponse>;
}

/// Chat engine that grounds each turn in context retrieved for the new
/// message. Built fresh per request by [`crate::index::IndexHandle`].
pub struct RetrievalChatEngine {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    settings: ModelSettings,
}

impl RetrievalChatEngine {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmClient>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            retriever,
            llm,
            settings,
        }
    }
}

fn build_system_prompt(chunks: &[ContextChunk]) -> String {
    let mut prompt = String::from(CONTEXT_PREAMBLE);
    prompt.push_str("\n\nContext:\n");
    for chunk in chunks {
        prompt.push_str("---\n");
        prompt.push_str(&chunk.text);
        prompt.push('\n');
    }
    prompt
}

#[async_trait]
impl ChatEngine for RetrievalChatEngine {
    /// Retrieve context for `message`, then stream the model's answer. An
    /// empty history means the message is the entire conversational context.
    async fn stream_chat(
        &self,
        message: &str,
        history: Vec<ChatMessage>,
    ) -> Result<StreamingChatResponse> {
        let chunks = self.retriever.retrieve(message).await?;
        tracing::debug!(
            model = self.llm.model(),
            chunks = chunks.len(),
            "Retrieved context for chat"
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(build_system_prompt(&chunks)));
        messages.extend(history);
        messages.push(ChatMessage::user(message));

        let mut prompt = ChatPrompt::new(messages);
        if let Some(temperature) = self.settings.temperature {
            prompt = prompt.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            prompt = prompt.with_max_tokens(max_tokens);
        }

        Ok(StreamingChatResponse {
            response_gen: self.llm.stream_chat(prompt),
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;
    use crate::index::StaticRetriever;
    use crate::llm::{MockLlmClient, MockStep};
    use crate::models::Role;

    fn engine_with(
        chunks: Vec<ContextChunk>,
        client: MockLlmClient,
        settings: ModelSettings,
    ) -> RetrievalChatEngine {
        RetrievalChatEngine::new(
            Arc::new(StaticRetriever::new(chunks)),
            Arc::new(client),
            settings,
        )
    }

    #[tokio::test]
    async fn streams_fragments_in_order() {
        let client = MockLlmClient::from_steps(
            "mock-model",
            vec![MockStep::fragments(["Hello", ", ", "world"])],
        );
        let engine = engine_with(vec![], client, ModelSettings::resolve(None));

        let response = engine.stream_chat("Hi", vec![]).await.unwrap();
        let fragments = response.response_gen.try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(fragments, vec!["Hello", ", ", "world"]);
    }

    #[tokio::test]
    async fn prompt_embeds_context_and_preserves_history_order() {
        let client = MockLlmClient::from_steps("mock-model", vec![MockStep::text("ok")]);
        let chunks = vec![ContextChunk {
            text: "Widgets ship on Tuesdays.".to_string(),
            score: 0.9,
        }];
        let engine = engine_with(chunks, client.clone(), ModelSettings::resolve(None));

        let history = vec![
            ChatMessage::user("What do you sell?"),
            ChatMessage::assistant("Widgets."),
        ];
        let response = engine.stream_chat("When do they ship?", history).await.unwrap();
        let _ = response.response_gen.try_collect::<Vec<_>>().await.unwrap();

        let prompts = client.prompts().await;
        assert_eq!(prompts.len(), 1);
        let messages = &prompts[0].messages;

        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Widgets ship on Tuesdays."));
        assert_eq!(messages[1], ChatMessage::user("What do you sell?"));
        assert_eq!(messages[2], ChatMessage::assistant("Widgets."));
        assert_eq!(
            messages.last().unwrap(),
            &ChatMessage::user("When do they ship?")
        );
    }

    #[tokio::test]
    async fn sampling_settings_reach_the_prompt() {
        let client = MockLlmClient::from_steps("mock-model", vec![MockStep::text("ok")]);
        let settings = ModelSettings {
            model: "mock-model".to_string(),
            temperature: Some(0.3),
            max_tokens: Some(2000),
        };
        let engine = engine_with(vec![], client.clone(), settings);

        let response = engine.stream_chat("Hi", vec![]).await.unwrap();
        let _ = response.response_gen.try_collect::<Vec<_>>().await.unwrap();

        let prompts = client.prompts().await;
        assert_eq!(prompts[0].temperature, Some(0.3));
        assert_eq!(prompts[0].max_tokens, Some(2000));
    }

    #[tokio::test]
    async fn unset_sampling_stays_unset() {
        let client = MockLlmClient::from_steps("mock-model", vec![MockStep::text("ok")]);
        let engine = engine_with(vec![], client.clone(), ModelSettings::resolve(None));

        let response = engine.stream_chat("Hi", vec![]).await.unwrap();
        let _ = response.response_gen.try_collect::<Vec<_>>().await.unwrap();

        let prompts = client.prompts().await;
        assert_eq!(prompts[0].temperature, None);
        assert_eq!(prompts[0].max_tokens, None);
    }
}
