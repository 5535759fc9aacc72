pub mod chat;

use axum::Router;

/// Build the main API router
pub fn router() -> Router {
    Router::new().nest("/chat", chat::router())
}
