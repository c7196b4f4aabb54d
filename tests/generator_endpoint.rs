use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use practice_backend::config::AppConfig;
use practice_backend::routes::build_router;
use practice_backend::state::AppState;
use practice_backend::store::{MemoryStore, QuizStore};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

async fn serve_upstream(upstream: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    addr
}

async fn app_against(addr: SocketAddr) -> (Router, Arc<AppState>) {
    let store: Arc<dyn QuizStore> = Arc::new(MemoryStore::new());
    let config = AppConfig {
        questions_api_url: format!("http://{addr}"),
        sampler_seed: Some(3),
        ..AppConfig::default()
    };
    let state = Arc::new(AppState::with_store(store, config).unwrap());
    (build_router(state.clone()), state)
}

async fn generate(app: &Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/questions/generate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn fake_generator(Json(req): Json<Value>) -> Json<Value> {
    assert_eq!(req["category"], "applied_math");
    assert_eq!(req["num_questions"], 3);
    Json(json!({
        "category": "applied_math",
        "questions": [
            { "question": "2 + 2 = ?", "options": ["3", "4", "5", "6"], "answer": "4" },
            { "question": "10 / 4 = ?", "options": ["2", "2.5", "3", "4"], "answer": " 2.5 " },
            { "question": "Broken", "options": ["1", "2", "3"], "answer": "1" }
        ]
    }))
}

#[tokio::test]
async fn generated_questions_are_stored_and_served() {
    let addr = serve_upstream(Router::new().route("/generate", post(fake_generator))).await;
    let (app, state) = app_against(addr).await;

    let (status, body) = generate(&app, json!({ "category": "applied_math", "count": 3 })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["ok"], true);
    assert_eq!(body["category"], "applied_math");
    assert_eq!(body["requested"], 3);
    assert_eq!(body["created"], 2);
    assert_eq!(body["skipped"], 1);

    assert_eq!(state.store.count_questions().await.unwrap(), 2);
    let stored = state
        .store
        .questions_by_topics(&[practice_backend::domain::Topic::AppliedMath], None)
        .await
        .unwrap();
    let mut letters: Vec<&str> = stored.iter().map(|q| q.correct_answer.as_str()).collect();
    letters.sort_unstable();
    assert_eq!(letters, vec!["B", "B"]);
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let failing = Router::new().route(
        "/generate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model offline") }),
    );
    let addr = serve_upstream(failing).await;
    let (app, state) = app_against(addr).await;

    let (status, body) = generate(&app, json!({ "category": "statistics", "count": 5 })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("statistics"));
    assert_eq!(state.store.count_questions().await.unwrap(), 0);
}
