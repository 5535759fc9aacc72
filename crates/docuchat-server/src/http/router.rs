use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::AppCore;

use super::{api, middleware, HttpConfig};

pub fn build_router(core: Arc<AppCore>, config: &HttpConfig) -> Router {
    let cors = middleware::cors::build_cors_layer(config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api::router())
        .layer(cors)
        .layer(Extension(core))
}

async fn health_check() -> &'static str {
    "OK"
}
