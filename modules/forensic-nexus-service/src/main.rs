//! Forensic Nexus Service — standalone binary serving the forensics JSON API.
//!
//! Default: http://127.0.0.1:9103/

use forensic_nexus_service::db::Db;
use forensic_nexus_service::{AppState, ServiceConfig, build_router};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServiceConfig::from_env();

    log::info!("Opening database at: {}", config.db_path);
    let database = Arc::new(Db::open(&config.db_path).expect("Failed to open database"));

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(database, config));
    let app = build_router(state);

    log::info!("Forensic Nexus Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
