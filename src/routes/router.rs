use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers::{handle_poll, health};

pub fn create_router(config: AppConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/poll", post(handle_poll))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}
