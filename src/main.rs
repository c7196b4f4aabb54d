//! Practice Backend
//!
//! - Axum HTTP API for timed practice sessions, analytics and the question bank
//! - In-memory store by default, SQLite when DATABASE_URL is set
//! - Optional static SPA fallback (STATIC_DIR)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   DATABASE_URL         : e.g. "sqlite://practice.db" (unset = in-memory)
//!   QUESTIONS_API_URL    : question generator base URL (default "http://127.0.0.1:8000")
//!   STATIC_DIR           : frontend build directory to serve for unmatched paths
//!   SAMPLER_SEED         : u64 seed for reproducible question sampling
//!   PRACTICE_CONFIG_PATH : path to TOML config (question counts + optional question bank)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use practice_backend::config::AppConfig;
use practice_backend::routes::build_router;
use practice_backend::state::AppState;
use practice_backend::telemetry;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = AppConfig::from_env();
  let port = config.port;
  let state = Arc::new(AppState::from_config(config).await?);

  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "practice_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "practice_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "practice_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
