//! Router assembly: API endpoints, optional static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - JSON API under `/api/v1/...`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
/// - SPA from `STATIC_DIR` with index fallback, when configured
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/api/v1/health", get(http::http_health))
        // Practice sessions
        .route("/api/v1/practice/start", post(http::http_post_start))
        .route("/api/v1/practice/session", get(http::http_get_session))
        .route("/api/v1/practice/answer", post(http::http_post_answer))
        .route("/api/v1/practice/finish", post(http::http_post_finish))
        // Analytics
        .route("/api/v1/analytics", get(http::http_get_analytics))
        .route("/api/v1/analytics/compare", get(http::http_get_compare))
        // Question bank
        .route("/api/v1/questions", get(http::http_get_questions))
        .route("/api/v1/questions/generate", post(http::http_post_generate))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    match static_dir {
        Some(dir) => {
            info!(target: "practice_backend", %dir, "Serving static frontend");
            let index = format!("{}/index.html", dir.trim_end_matches('/'));
            let static_service = ServeDir::new(&dir)
                .append_index_html_on_directories(true)
                .not_found_service(ServeFile::new(index));
            router.fallback_service(static_service)
        }
        None => router,
    }
}
