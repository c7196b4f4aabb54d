use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use practice_backend::config::AppConfig;
use practice_backend::domain::{Answer, Difficulty, PracticeSession, SessionStatus, Topic, User};
use practice_backend::practice;
use practice_backend::protocol::{AnswerIn, FinishIn, StartIn};
use practice_backend::seeds::seed_questions;
use practice_backend::state::AppState;
use practice_backend::store::{QuizStore, SqliteStore, StorageError};

async fn store(name: &str) -> SqliteStore {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let store = SqliteStore::connect(&url).await.expect("connect");
    store.migrate().await.expect("migrate");
    store.insert_questions(&seed_questions()).await.expect("seed");
    store
}

fn session(id: &str, user: &str, minutes_ago: i64) -> PracticeSession {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    PracticeSession {
        id: id.into(),
        user_id: user.into(),
        topics: vec![Topic::Statistics, Topic::DataAnalysis],
        time_limit: 8,
        question_count: 2,
        status: SessionStatus::Created,
        score: 0,
        accuracy: 0.0,
        duration: 0,
        created_at: base - Duration::minutes(minutes_ago),
        finished_at: None,
    }
}

fn answer(id: &str, session_id: &str, question_id: &str, chosen: &str, correct: bool) -> Answer {
    Answer {
        id: id.into(),
        session_id: session_id.into(),
        question_id: question_id.into(),
        chosen_answer: chosen.into(),
        is_correct: correct,
        time_taken_ms: 2500,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 1, 0).unwrap(),
    }
}

#[tokio::test]
async fn migrate_is_idempotent_and_seeding_skips_duplicates() {
    let store = store("memdb_idempotent").await;
    store.migrate().await.expect("second migrate");
    assert_eq!(store.count_questions().await.unwrap(), 20);
    assert_eq!(store.insert_questions(&seed_questions()).await.unwrap(), 0);
}

#[tokio::test]
async fn question_queries_filter_and_keep_order() {
    let store = store("memdb_questions").await;

    let stats = store
        .questions_by_topics(&[Topic::Statistics, Topic::DataAnalysis], None)
        .await
        .unwrap();
    assert_eq!(stats.len(), 8);

    let easy = store.questions_by_topics(&[Topic::Statistics], Some(Difficulty::Easy)).await.unwrap();
    let ids: Vec<&str> = easy.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["st-1", "st-3"]);

    let q = store.get_question("am-2").await.unwrap();
    assert_eq!(q.options.len(), 4);
    assert_eq!(q.correct_answer, "B");
    assert!(matches!(store.get_question("nope").await, Err(StorageError::NotFound)));

    let wanted = vec!["vr-3".to_string(), "gk-1".to_string(), "missing".to_string()];
    let picked = store.get_questions(&wanted).await.unwrap();
    let ids: Vec<&str> = picked.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["vr-3", "gk-1"]);
}

#[tokio::test]
async fn session_lifecycle_is_guarded() {
    let store = store("memdb_lifecycle").await;
    let ids = vec!["st-1".to_string(), "da-2".to_string()];
    store.create_session(&session("s1", "u1", 0), &ids).await.unwrap();
    assert_eq!(store.session_question_ids("s1").await.unwrap(), ids);

    store.insert_answer(&answer("a1", "s1", "st-1", "C", true)).await.unwrap();
    assert_eq!(store.get_session("s1").await.unwrap().status, SessionStatus::InProgress);

    let dup = store.insert_answer(&answer("a2", "s1", "st-1", "A", false)).await;
    assert!(matches!(dup, Err(StorageError::Conflict(_))));

    store.insert_answer(&answer("a3", "s1", "da-2", "", false)).await.unwrap();
    let answers = store.session_answers("s1").await.unwrap();
    let topics: Vec<Topic> = answers.iter().map(|a| a.topic).collect();
    assert_eq!(topics, vec![Topic::Statistics, Topic::DataAnalysis]);
    assert_eq!(answers[1].answer.chosen_answer, "");

    let finished = Utc.with_ymd_and_hms(2025, 3, 1, 12, 5, 0).unwrap();
    let summary = store.finalize_session("s1", 16, finished).await.unwrap();
    assert_eq!((summary.correct, summary.total, summary.score), (1, 2, 50));
    let s = store.get_session("s1").await.unwrap();
    assert_eq!(s.status, SessionStatus::Finalized);
    assert_eq!((s.score, s.accuracy, s.duration), (50, 0.5, 16));
    assert_eq!(s.finished_at, Some(finished));

    let again = store.finalize_session("s1", 1, finished).await;
    assert!(matches!(again, Err(StorageError::Conflict(_))));
    let late = store.insert_answer(&answer("a4", "s1", "st-1", "C", true)).await;
    assert!(matches!(late, Err(StorageError::Conflict(_))));

    let unknown = store.finalize_session("nope", 0, finished).await;
    assert!(matches!(unknown, Err(StorageError::NotFound)));
}

#[tokio::test]
async fn user_history_is_scoped_and_newest_first() {
    let store = store("memdb_history").await;
    store.create_session(&session("old", "u1", 60), &["st-1".to_string()]).await.unwrap();
    store.create_session(&session("new", "u1", 5), &["st-2".to_string()]).await.unwrap();
    store.create_session(&session("other", "u2", 1), &["st-3".to_string()]).await.unwrap();
    store.insert_answer(&answer("a1", "old", "st-1", "C", true)).await.unwrap();
    store.insert_answer(&answer("a2", "other", "st-3", "B", true)).await.unwrap();

    let sessions = store.user_sessions("u1").await.unwrap();
    let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
    assert_eq!(sessions[0].topics, vec![Topic::Statistics, Topic::DataAnalysis]);

    let answers = store.user_answers("u1").await.unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].answer.id, "a1");
}

#[tokio::test]
async fn users_upsert_and_lookup_by_email() {
    let store = store("memdb_users").await;
    store
        .upsert_user(&User { id: "u1".into(), email: Some("ada@example.com".into()), name: None })
        .await
        .unwrap();
    store
        .upsert_user(&User { id: "u1".into(), email: None, name: Some("Ada".into()) })
        .await
        .unwrap();

    let found = store.find_user_by_email("ada@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, "u1");
    assert_eq!(found.name.as_deref(), Some("Ada"));
    assert!(store.find_user_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn email_follows_its_latest_owner() {
    let store = store("memdb_email_owner").await;
    let shared = |id: &str| User { id: id.into(), email: Some("shared@example.com".into()), name: None };
    store.upsert_user(&shared("u1")).await.expect("first owner");
    store.upsert_user(&shared("u2")).await.expect("second owner takes the email");

    let found = store.find_user_by_email("shared@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, "u2");

    store.upsert_user(&shared("u1")).await.expect("first owner reclaims it");
    let found = store.find_user_by_email("shared@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, "u1");
}

#[tokio::test]
async fn practice_flow_runs_on_sqlite() {
    let store: Arc<dyn QuizStore> = Arc::new(store("memdb_flow").await);
    let config = AppConfig { sampler_seed: Some(5), ..AppConfig::default() };
    let state = AppState::with_store(store, config).unwrap();
    let key: std::collections::HashMap<String, String> =
        seed_questions().into_iter().map(|q| (q.id, q.correct_answer)).collect();

    let started = practice::start(
        &state,
        "u1",
        StartIn { topics: vec![Topic::AppliedMath], time_limit: Some(10), question_count: Some(3) },
    )
    .await
    .unwrap();
    assert_eq!(started.questions.len(), 3);

    let first = &started.questions[0].id;
    let res = practice::advance(
        &state,
        "u1",
        AnswerIn {
            session_id: Some(started.session_id.clone()),
            question_id: Some(first.clone()),
            selected_answer: Some(key[first].clone()),
            time_taken: Some(4000),
        },
    )
    .await
    .unwrap();
    assert!(res.is_correct);

    let result = practice::finish(
        &state,
        "u1",
        FinishIn { session_id: Some(started.session_id.clone()), duration: Some(12) },
    )
    .await
    .unwrap();
    assert_eq!((result.score, result.correct_answers, result.total_questions), (100, 1, 1));

    let fetched = practice::fetch(&state, "u1", &started.session_id).await.unwrap();
    assert_eq!(fetched.questions, started.questions);
    assert!(fetched.session.is_finalized());
}
