//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - the session lifecycle (start, fetch, advance one answer, finish)
//!   - random question sets for arbitrary topics
//!   - pulling new questions from the generator service
//!
//! Lifecycle policy: a finalized session accepts no further answers and cannot
//! be finalized again; each sampled question takes at most one answer.

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Answer, Difficulty, PracticeSession, Question, SessionStatus, Topic};
use crate::error::AppError;
use crate::generator::{self, Category};
use crate::protocol::{
  to_out, AnswerIn, AnswerOut, FinishIn, GenerateIn, GenerateOut, SessionConfigOut, SessionOut,
  SessionResult, StartIn, StartOut,
};
use crate::state::AppState;
use crate::store::{StorageError, SESSION_FINALIZED};
use crate::topics;

pub const DEFAULT_GENERATE_COUNT: i64 = 25;
pub const MAX_GENERATE_COUNT: i64 = 100;

/// Expand `topics`, load the matching pool and draw `count` questions.
#[instrument(level = "info", skip_all, fields(?requested, count = count, ?difficulty))]
pub async fn random_questions(
  state: &AppState,
  requested: &[Topic],
  count: usize,
  difficulty: Option<Difficulty>,
) -> Result<Vec<Question>, AppError> {
  if requested.is_empty() {
    return Err(AppError::Validation("At least one topic is required".into()));
  }
  let expanded = topics::expand(requested);
  let pool = state.store.questions_by_topics(&expanded, difficulty).await?;
  if pool.is_empty() {
    return Err(AppError::NotFound("No questions found for the specified criteria".into()));
  }
  let pool_size = pool.len();
  let chosen = state.sample(pool, count);
  info!(target: "questions", ?expanded, pool_size, drawn = chosen.len(), "Sampled questions");
  Ok(chosen)
}

#[instrument(level = "info", skip_all, fields(%user_id))]
pub async fn start(state: &AppState, user_id: &str, input: StartIn) -> Result<StartOut, AppError> {
  if input.topics.is_empty() {
    return Err(AppError::Validation("At least one topic is required".into()));
  }
  let time_limit = match input.time_limit {
    Some(t) if t >= 1 => t,
    _ => return Err(AppError::Validation("Valid time limit is required".into())),
  };
  let max = state.config.max_question_count;
  let question_count = input.question_count.unwrap_or(state.config.default_question_count);
  if question_count == 0 || question_count > max {
    return Err(AppError::Validation(format!("questionCount must be between 1 and {max}")));
  }

  // Sample before writing so an empty pool leaves no orphan session behind.
  let questions = random_questions(state, &input.topics, question_count as usize, None).await?;
  let question_ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();

  let session = PracticeSession {
    id: Uuid::new_v4().to_string(),
    user_id: user_id.to_string(),
    topics: topics::expand(&input.topics),
    time_limit,
    question_count: question_ids.len() as u32,
    status: SessionStatus::Created,
    score: 0,
    accuracy: 0.0,
    duration: 0,
    created_at: Utc::now(),
    finished_at: None,
  };
  state.store.create_session(&session, &question_ids).await?;
  info!(target: "practice", session_id = %session.id, %user_id, time_limit, questions = question_ids.len(), "Session started");

  Ok(StartOut {
    session_id: session.id,
    questions: questions.iter().map(to_out).collect(),
    config: SessionConfigOut { topics: input.topics, time_limit, question_count },
  })
}

/// Load a session and check it belongs to `user_id`.
async fn owned_session(state: &AppState, user_id: &str, session_id: &str) -> Result<PracticeSession, AppError> {
  let session = state.store.get_session(session_id).await.map_err(|e| match e {
    StorageError::NotFound => AppError::NotFound("Session not found".into()),
    other => other.into(),
  })?;
  if session.user_id != user_id {
    warn!(target: "practice", %session_id, %user_id, owner = %session.user_id, "Cross-user session access");
    return Err(AppError::Forbidden);
  }
  Ok(session)
}

fn required(v: Option<String>) -> Option<String> {
  v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[instrument(level = "info", skip_all, fields(%user_id, %session_id))]
pub async fn fetch(state: &AppState, user_id: &str, session_id: &str) -> Result<SessionOut, AppError> {
  let session = owned_session(state, user_id, session_id).await?;
  let ids = state.store.session_question_ids(&session.id).await?;
  let questions = state.store.get_questions(&ids).await?;
  Ok(SessionOut {
    time_limit: session.time_limit,
    questions: questions.iter().map(to_out).collect(),
    session,
  })
}

#[instrument(level = "info", skip_all, fields(%user_id))]
pub async fn advance(state: &AppState, user_id: &str, input: AnswerIn) -> Result<AnswerOut, AppError> {
  let missing = || AppError::Validation("Missing required fields".into());
  let session_id = required(input.session_id).ok_or_else(missing)?;
  let question_id = required(input.question_id).ok_or_else(missing)?;
  // Kept verbatim. Empty string is a valid choice: it records a timeout.
  let chosen = input.selected_answer.ok_or_else(missing)?;
  let time_taken_ms = input.time_taken.ok_or_else(missing)?;

  let session = owned_session(state, user_id, &session_id).await?;
  if session.is_finalized() {
    return Err(AppError::Conflict(SESSION_FINALIZED.into()));
  }
  let sampled = state.store.session_question_ids(&session.id).await?;
  if !sampled.contains(&question_id) {
    return Err(AppError::Validation("Question is not part of this session".into()));
  }
  let question = state.store.get_question(&question_id).await.map_err(|e| match e {
    StorageError::NotFound => AppError::NotFound("Question not found".into()),
    other => other.into(),
  })?;

  let answer = Answer {
    id: Uuid::new_v4().to_string(),
    session_id: session.id.clone(),
    question_id: question.id.clone(),
    is_correct: question.is_correct(&chosen),
    chosen_answer: chosen,
    time_taken_ms,
    created_at: Utc::now(),
  };
  state.store.insert_answer(&answer).await?;
  info!(
    target: "practice",
    session_id = %session.id,
    question_id = %question.id,
    correct = answer.is_correct,
    timeout = answer.chosen_answer.is_empty(),
    time_taken_ms,
    "Answer recorded"
  );
  Ok(AnswerOut { is_correct: answer.is_correct, answer_id: answer.id })
}

#[instrument(level = "info", skip_all, fields(%user_id))]
pub async fn finish(state: &AppState, user_id: &str, input: FinishIn) -> Result<SessionResult, AppError> {
  let missing = || AppError::Validation("Missing required fields".into());
  let session_id = required(input.session_id).ok_or_else(missing)?;
  let duration = input.duration.ok_or_else(missing)?;

  let session = owned_session(state, user_id, &session_id).await?;
  if session.is_finalized() {
    return Err(AppError::Conflict(SESSION_FINALIZED.into()));
  }
  let summary = state.store.finalize_session(&session.id, duration, Utc::now()).await?;
  info!(
    target: "practice",
    session_id = %session.id,
    score = summary.score,
    correct = summary.correct,
    total = summary.total,
    duration,
    "Session finalized"
  );

  Ok(SessionResult {
    session_id: session.id,
    score: summary.score,
    accuracy: summary.accuracy,
    duration,
    total_questions: summary.total,
    correct_answers: summary.correct,
    topic_breakdown: summary.breakdown.into_iter().map(|(t, tally)| (t, tally.into())).collect(),
  })
}

/// Ask the generator for new questions and store the well-formed ones.
#[instrument(level = "info", skip_all, fields(category = ?input.category, count = ?input.count))]
pub async fn generate(state: &AppState, input: GenerateIn) -> Result<GenerateOut, AppError> {
  let category = input
    .category
    .as_deref()
    .and_then(Category::parse)
    .ok_or_else(|| AppError::Validation("Invalid or missing category".into()))?;
  let requested = input.count.unwrap_or(DEFAULT_GENERATE_COUNT).clamp(1, MAX_GENERATE_COUNT) as u32;

  let items = state.generator.generate(category, requested).await?;
  let questions = generator::to_questions(category.topic(), &items);
  let created = if questions.is_empty() {
    0
  } else {
    state.store.insert_questions(&questions).await? as u32
  };
  info!(target: "questions", category = category.as_str(), requested, received = items.len(), created, "Generated questions stored");

  Ok(GenerateOut {
    ok: true,
    category: category.as_str().to_string(),
    requested,
    created,
    skipped: requested.saturating_sub(created),
  })
}
