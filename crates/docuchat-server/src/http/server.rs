use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::sync::broadcast;
use tracing::info;

use crate::AppCore;

use super::router;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to (default: 127.0.0.1)
    pub host: String,
    /// Port to listen on (default: 8080)
    pub port: u16,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let host = env_var("DOCUCHAT_HTTP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = env_var("DOCUCHAT_HTTP_PORT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);

        Self {
            host,
            port,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// HTTP server for the chat API
pub struct HttpServer {
    config: HttpConfig,
    core: Arc<AppCore>,
}

impl HttpServer {
    pub fn new(config: HttpConfig, core: Arc<AppCore>) -> Self {
        Self { config, core }
    }

    fn build_router(&self) -> Router {
        router::build_router(self.core.clone(), &self.config)
    }

    /// Run the HTTP server until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let app = self.build_router();
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("HTTP server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("HTTP server shutting down");
            })
            .await?;

        Ok(())
    }
}
