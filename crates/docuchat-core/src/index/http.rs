//! Retriever backed by the external index-lookup service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ContextChunk, Retriever};
use crate::error::{Error, Result};

const DEFAULT_TOP_K: usize = 4;

/// Queries one datasource of the remote index service.
pub struct HttpRetriever {
    client: Client,
    base_url: String,
    datasource: String,
    top_k: usize,
}

impl HttpRetriever {
    pub fn new(client: Client, base_url: impl Into<String>, datasource: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            datasource: datasource.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    fn query_url(&self) -> String {
        format!(
            "{}/datasources/{}/query",
            self.base_url.trim_end_matches('/'),
            self.datasource
        )
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    chunks: Vec<ContextChunk>,
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let response = self
            .client
            .post(self.query_url())
            .json(&QueryRequest {
                query,
                top_k: self.top_k,
            })
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::DatasourceNotFound(self.datasource.clone()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Index(format!(
                "index service error {}: {}",
                status, body
            )));
        }

        let data: QueryResponse = response.json().await?;
        Ok(data.chunks)
    }
}
