//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; rejections and failures surface as `AppError`.

use std::sync::Arc;

use axum::{
  extract::{
    rejection::{JsonRejection, QueryRejection},
    Query, State,
  },
  response::IntoResponse,
  Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use crate::analytics::{self, Comparison};
use crate::auth::AuthUser;
use crate::domain::{Difficulty, Topic};
use crate::error::AppError;
use crate::practice;
use crate::protocol::*;
use crate::state::AppState;
use crate::util::split_csv;

/// Questions returned by `GET /questions` when `count` is absent.
pub const DEFAULT_RANDOM_COUNT: u32 = 10;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip_all, fields(user_id = %user.id))]
pub async fn http_post_start(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  body: Result<Json<StartIn>, JsonRejection>,
) -> Result<Json<StartOut>, AppError> {
  let Json(body) = body?;
  let out = practice::start(&state, &user.id, body).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip_all, fields(user_id = %user.id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  query: Result<Query<SessionQuery>, QueryRejection>,
) -> Result<Json<SessionOut>, AppError> {
  let Query(q) = query?;
  let session_id = q
    .session_id
    .filter(|s| !s.trim().is_empty())
    .ok_or_else(|| AppError::Validation("Session ID is required".into()))?;
  let out = practice::fetch(&state, &user.id, session_id.trim()).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip_all, fields(user_id = %user.id))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  body: Result<Json<AnswerIn>, JsonRejection>,
) -> Result<Json<AnswerOut>, AppError> {
  let Json(body) = body?;
  let out = practice::advance(&state, &user.id, body).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip_all, fields(user_id = %user.id))]
pub async fn http_post_finish(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  body: Result<Json<FinishIn>, JsonRejection>,
) -> Result<Json<FinishOut>, AppError> {
  let Json(body) = body?;
  let results = practice::finish(&state, &user.id, body).await?;
  Ok(Json(FinishOut { results }))
}

#[instrument(level = "info", skip_all, fields(user_id = %user.id))]
pub async fn http_get_analytics(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
) -> Result<Json<AnalyticsOut>, AppError> {
  let data = analytics::user_analytics(state.store.as_ref(), &user.id, Utc::now()).await?;
  Ok(Json(AnalyticsOut { analytics: data }))
}

#[instrument(level = "info", skip_all, fields(user_id = %user.id))]
pub async fn http_get_compare(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  query: Result<Query<CompareQuery>, QueryRejection>,
) -> Result<Json<Comparison>, AppError> {
  let Query(q) = query?;
  let email = q
    .email
    .map(|e| e.trim().to_lowercase())
    .filter(|e| !e.is_empty())
    .ok_or_else(|| AppError::Validation("Email is required".into()))?;
  let other = state
    .store
    .find_user_by_email(&email)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;
  info!(target: "analytics", user_id = %user.id, other_id = %other.id, "Comparing analytics");
  let cmp = analytics::compare(state.store.as_ref(), &user.id, &other.id, Utc::now()).await?;
  Ok(Json(cmp))
}

#[instrument(level = "info", skip_all, fields(user_id = %user.id))]
pub async fn http_get_questions(
  State(state): State<Arc<AppState>>,
  user: AuthUser,
  query: Result<Query<QuestionsQuery>, QueryRejection>,
) -> Result<Json<QuestionsOut>, AppError> {
  let Query(q) = query?;
  let raw = q.topics.unwrap_or_default();
  let topics = split_csv(&raw)
    .into_iter()
    .map(|t| t.parse::<Topic>().map_err(|_| AppError::Validation(format!("Invalid topic: {t}"))))
    .collect::<Result<Vec<_>, _>>()?;
  let difficulty = match q.difficulty.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
    Some(d) => Some(
      d.parse::<Difficulty>()
        .map_err(|_| AppError::Validation(format!("Invalid difficulty: {d}")))?,
    ),
    None => None,
  };
  let max = state.config.max_question_count;
  let count = q.count.unwrap_or(DEFAULT_RANDOM_COUNT.min(max));
  if count == 0 || count > max {
    return Err(AppError::Validation(format!("count must be between 1 and {max}")));
  }

  let questions = practice::random_questions(&state, &topics, count as usize, difficulty).await?;
  Ok(Json(QuestionsOut { questions: questions.iter().map(to_out).collect() }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  body: Result<Json<GenerateIn>, JsonRejection>,
) -> Result<Json<GenerateOut>, AppError> {
  let Json(body) = body?;
  let out = practice::generate(&state, body).await?;
  Ok(Json(out))
}
