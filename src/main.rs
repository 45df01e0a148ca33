mod backend;
mod catalog;
mod compat;
mod config;
mod editor;
mod error;
mod layout;
mod report;
mod routes;
mod schema;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::StudioConfig::from_env().map_err(|e| format!("invalid configuration: {e}"))?;
    let backend = backend::HttpBackend::new(&config).map_err(|e| format!("backend client init failed: {e}"))?;
    tracing::info!(backend_url = %config.backend_url, "backend client initialized");

    let state = state::AppState::new(Arc::new(backend), config.sessions.idle_ttl());

    // Spawn background session expiry.
    let _expiry = services::session::spawn_expiry_task(state.clone(), config.sessions.sweep_interval());

    let app = routes::app(state);
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    tracing::info!(%addr, "report studio listening");
    axum::serve(listener, app).await?;
    Ok(())
}
