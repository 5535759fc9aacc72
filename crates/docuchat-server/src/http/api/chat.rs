//! Streaming chat endpoint.
//!
//! POST /api/chat takes a message, optional history, and a datasource name,
//! and relays the chat engine's token stream as server-sent events. Each
//! frame is `data: <JSON>\n\n`; the stream always ends with a single
//! `{"done": true}` frame, whether it ran to completion, hit an upstream
//! error, or was cancelled.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Extension,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use docuchat_core::engine::ChatEngine;
use docuchat_core::llm::TokenStream;
use docuchat_core::models::{ChatMessage, LlmConfig, ModelSettings, Role};

use crate::http::ApiError;
use crate::AppCore;

pub fn router() -> Router {
    Router::new().route("/", post(chat))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub messages: Option<Vec<IncomingMessage>>,
    #[serde(default)]
    pub datasource: Option<String>,
    #[serde(default)]
    pub config: Option<LlmConfig>,
    /// Accepted for wire compatibility; not consumed.
    #[serde(default)]
    pub embeddings: Option<Vec<EmbeddingRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingRecord {
    pub text: String,
    pub embedding: Vec<f32>,
}

async fn chat(
    Extension(core): Extension<Arc<AppCore>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let Some(datasource) = request.datasource.filter(|name| !name.is_empty()) else {
        return Err(ApiError::bad_request("No datasource provided"));
    };

    let settings = ModelSettings::resolve(request.config.as_ref());

    let history: Vec<ChatMessage> = request
        .messages
        .unwrap_or_default()
        .into_iter()
        .map(|m| ChatMessage {
            role: m.role,
            content: m.content,
        })
        .collect();

    let request_id = Uuid::new_v4();
    tracing::info!(
        %request_id,
        datasource = %datasource,
        model = %settings.model,
        history = history.len(),
        "Chat request"
    );

    let index = core.indexes.resolve(&settings, &datasource)?;
    let engine = index.as_chat_engine();
    let response = engine.stream_chat(&request.message, history).await?;

    // Stops consumption at the next fragment boundary on server shutdown;
    // client disconnects drop the body stream directly.
    let cancel = core.shutdown.child_token();
    let body = Body::from_stream(sse_events(response.response_gen, cancel));

    Ok(([(header::CONTENT_TYPE, "text/event-stream")], body).into_response())
}

/// Frame a JSON payload as a server-sent event.
fn sse_frame<T: serde::Serialize>(payload: &T) -> String {
    let json = serde_json::to_string(payload).unwrap_or_default();
    format!("data: {}\n\n", json)
}

/// Relay a fragment stream as SSE frames.
///
/// The token is checked at each fragment boundary; cancellation is advisory
/// and does not abort an in-flight upstream call. An upstream error becomes a
/// single error frame. Exactly one `{"done": true}` frame is emitted, always
/// last, on every path.
fn sse_events(
    mut fragments: TokenStream,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<String, Infallible>> + Send {
    async_stream::stream! {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Chat stream cancelled before completion");
                    None
                }
                fragment = fragments.next() => fragment,
            };

            let Some(fragment) = next else { break };
            match fragment {
                Ok(fragment) => yield Ok(sse_frame(&fragment)),
                Err(err) => {
                    tracing::error!(error = %err, "Chat stream failed mid-generation");
                    yield Ok(sse_frame(&json!({ "error": err.to_string() })));
                    break;
                }
            }
        }

        yield Ok(sse_frame(&json!({ "done": true })));
    }
}
