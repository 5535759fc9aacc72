//! Datasource index boundary.
//!
//! Document indexes are built and stored by an external service; this module
//! resolves datasource names to handles and retrieves context snippets for
//! queries. Nothing here persists state between requests.

pub mod http;

pub use http::HttpRetriever;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::RetrievalChatEngine;
use crate::error::{Error, Result};
use crate::llm::{self, LlmClient};
use crate::models::ModelSettings;
use crate::CoreConfig;

/// One retrieved context snippet with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    pub text: String,
    pub score: f32,
}

/// Read-only view of an external document index.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve the context snippets most relevant to the query.
    async fn retrieve(&self, query: &str) -> Result<Vec<ContextChunk>>;
}

/// Fixed-content retriever. Returns the same chunks for every query.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    chunks: Vec<ContextChunk>,
}

impl StaticRetriever {
    pub fn new(chunks: Vec<ContextChunk>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<ContextChunk>> {
        Ok(self.chunks.clone())
    }
}

/// Handle to one resolved datasource, scoped to a model descriptor.
///
/// Handles are borrowed for the duration of a request and carry no state of
/// their own.
pub struct IndexHandle {
    datasource: String,
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    settings: ModelSettings,
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("datasource", &self.datasource)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl IndexHandle {
    pub fn datasource(&self) -> &str {
        &self.datasource
    }

    /// Stateless accessor; builds a fresh chat engine per call.
    pub fn as_chat_engine(&self) -> RetrievalChatEngine {
        RetrievalChatEngine::new(
            self.retriever.clone(),
            self.llm.clone(),
            self.settings.clone(),
        )
    }
}

type LlmFactory = dyn Fn(&ModelSettings) -> Arc<dyn LlmClient> + Send + Sync;

/// Resolves datasource names against the externally managed index store.
pub struct IndexRegistry {
    retrievers: HashMap<String, Arc<dyn Retriever>>,
    remote_base: Option<String>,
    http: reqwest::Client,
    llm_factory: Arc<LlmFactory>,
}

impl IndexRegistry {
    /// Production registry: datasources resolve to the remote index service,
    /// models to the configured provider.
    pub fn from_config(config: &CoreConfig) -> Self {
        let api_key = config.openai_api_key.clone();
        let base_url = config.openai_base_url.clone();
        Self {
            retrievers: HashMap::new(),
            remote_base: Some(config.index_url.clone()),
            http: reqwest::Client::new(),
            llm_factory: Arc::new(move |settings| {
                llm::client_for(settings, &api_key, base_url.as_deref())
            }),
        }
    }

    /// Registry with a custom model-client factory and no remote index
    /// service. Datasources must be registered explicitly.
    pub fn with_llm_factory(
        factory: impl Fn(&ModelSettings) -> Arc<dyn LlmClient> + Send + Sync + 'static,
    ) -> Self {
        Self {
            retrievers: HashMap::new(),
            remote_base: None,
            http: reqwest::Client::new(),
            llm_factory: Arc::new(factory),
        }
    }

    /// Register an in-process retriever for a datasource name.
    pub fn register(&mut self, name: impl Into<String>, retriever: Arc<dyn Retriever>) {
        self.retrievers.insert(name.into(), retriever);
    }

    /// Resolve a datasource name into an index handle scoped to the given
    /// model descriptor.
    ///
    /// The name-to-index mapping is externally owned: unknown names fail here
    /// only when no remote index service is configured; otherwise the remote
    /// lookup reports them at retrieval time. No retry either way.
    pub fn resolve(&self, settings: &ModelSettings, datasource: &str) -> Result<IndexHandle> {
        let retriever: Arc<dyn Retriever> = if let Some(retriever) = self.retrievers.get(datasource)
        {
            retriever.clone()
        } else if let Some(base) = &self.remote_base {
            Arc::new(HttpRetriever::new(self.http.clone(), base, datasource))
        } else {
            return Err(Error::DatasourceNotFound(datasource.to_string()));
        };

        Ok(IndexHandle {
            datasource: datasource.to_string(),
            retriever,
            llm: (self.llm_factory)(settings),
            settings: settings.clone(),
        })
    }
}
