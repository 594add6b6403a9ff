//! Forensic Nexus service: indexed entity storage and the JSON API over it.

pub mod config;
pub mod db;
pub mod entities;
pub mod entity;
pub mod error;
pub mod routes;
pub mod search;
pub mod seed;

pub use config::ServiceConfig;
pub use routes::AppState;

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = tower_http::cors::CorsLayer::permissive();

    Router::new()
        // Health
        .route("/api/health/extended", get(routes::health_extended))
        // Semantic memory
        .route(
            "/api/memory",
            get(routes::memory_list).post(routes::memory_create),
        )
        .route("/api/memory/retrieve", post(routes::memory_retrieve))
        .route("/api/memory/:id", get(routes::memory_get))
        // Checkpoints
        .route(
            "/api/checkpoints",
            get(routes::checkpoints_list).post(routes::checkpoint_create),
        )
        .route(
            "/api/checkpoints/rollback",
            post(routes::checkpoint_rollback),
        )
        .route("/api/checkpoints/:id", get(routes::checkpoint_get))
        // Audit logs
        .route("/api/logs", get(routes::logs_list))
        .with_state(state)
        .layer(cors)
}
