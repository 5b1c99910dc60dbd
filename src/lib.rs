pub mod analytics;
pub mod auth;
pub mod clicks;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redirect;
pub mod slug;
pub mod state;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use crate::config::AppConfig;
pub use crate::error::AppError;
pub use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/links", post(handlers::create_link))
        .route("/links/:slug", get(handlers::redirect_link))
        .route("/analytics", get(handlers::list_analytics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
