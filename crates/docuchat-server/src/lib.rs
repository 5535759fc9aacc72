//! HTTP surface for docuchat.

pub mod http;

use std::sync::Arc;

use docuchat_core::index::IndexRegistry;
use docuchat_core::CoreConfig;
use tokio_util::sync::CancellationToken;

/// Application state shared across requests: the datasource registry and the
/// server-wide shutdown token. Everything else is built per request.
pub struct AppCore {
    pub indexes: IndexRegistry,
    pub shutdown: CancellationToken,
}

impl AppCore {
    pub fn new(indexes: IndexRegistry) -> Arc<Self> {
        Arc::new(Self {
            indexes,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn from_env() -> Arc<Self> {
        let config = CoreConfig::default();
        Self::new(IndexRegistry::from_config(&config))
    }
}
