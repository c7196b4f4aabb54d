//! Row <-> domain conversions for the SQLite backend.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::{Answer, Difficulty, PracticeSession, Question, SessionStatus, Topic, TopicAnswer, User};
use crate::store::StorageError;

pub(super) fn ser<E: std::fmt::Display>(e: E) -> StorageError {
  StorageError::Serialization(e.to_string())
}

pub(super) fn conn(e: sqlx::Error) -> StorageError {
  StorageError::Connection(e.to_string())
}

pub(super) fn to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
  i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn from_i64<T: TryFrom<i64>>(field: &'static str, v: i64) -> Result<T, StorageError> {
  T::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn topics_json(topics: &[Topic]) -> Result<String, StorageError> {
  serde_json::to_string(topics).map_err(ser)
}

pub(super) fn options_json(options: &[String]) -> Result<String, StorageError> {
  serde_json::to_string(options).map_err(ser)
}

pub(super) fn map_question(row: &SqliteRow) -> Result<Question, StorageError> {
  let topic: String = row.try_get("topic").map_err(ser)?;
  let difficulty: String = row.try_get("difficulty").map_err(ser)?;
  let options: String = row.try_get("options").map_err(ser)?;
  Ok(Question {
    id: row.try_get("id").map_err(ser)?,
    topic: topic.parse().map_err(ser)?,
    text: row.try_get("text").map_err(ser)?,
    options: serde_json::from_str(&options).map_err(ser)?,
    correct_answer: row.try_get("correct_answer").map_err(ser)?,
    difficulty: difficulty.parse::<Difficulty>().map_err(ser)?,
  })
}

pub(super) fn map_session(row: &SqliteRow) -> Result<PracticeSession, StorageError> {
  let topics: String = row.try_get("topics").map_err(ser)?;
  let status: String = row.try_get("status").map_err(ser)?;
  Ok(PracticeSession {
    id: row.try_get("id").map_err(ser)?,
    user_id: row.try_get("user_id").map_err(ser)?,
    topics: serde_json::from_str(&topics).map_err(ser)?,
    time_limit: from_i64("time_limit", row.try_get::<i64, _>("time_limit").map_err(ser)?)?,
    question_count: from_i64("question_count", row.try_get::<i64, _>("question_count").map_err(ser)?)?,
    status: SessionStatus::parse(&status)
      .ok_or_else(|| StorageError::Serialization(format!("invalid status: {status}")))?,
    score: from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
    accuracy: row.try_get("accuracy").map_err(ser)?,
    duration: from_i64("duration", row.try_get::<i64, _>("duration").map_err(ser)?)?,
    created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(ser)?,
    finished_at: row.try_get::<Option<DateTime<Utc>>, _>("finished_at").map_err(ser)?,
  })
}

fn map_answer(row: &SqliteRow) -> Result<Answer, StorageError> {
  Ok(Answer {
    id: row.try_get("id").map_err(ser)?,
    session_id: row.try_get("session_id").map_err(ser)?,
    question_id: row.try_get("question_id").map_err(ser)?,
    chosen_answer: row.try_get("chosen_answer").map_err(ser)?,
    is_correct: row.try_get("is_correct").map_err(ser)?,
    time_taken_ms: from_i64("time_taken_ms", row.try_get::<i64, _>("time_taken_ms").map_err(ser)?)?,
    created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(ser)?,
  })
}

/// Expects the answer columns plus the joined question `topic`.
pub(super) fn map_topic_answer(row: &SqliteRow) -> Result<TopicAnswer, StorageError> {
  let topic: String = row.try_get("topic").map_err(ser)?;
  Ok(TopicAnswer { answer: map_answer(row)?, topic: topic.parse().map_err(ser)? })
}

pub(super) fn map_user(row: &SqliteRow) -> Result<User, StorageError> {
  Ok(User {
    id: row.try_get("id").map_err(ser)?,
    email: row.try_get("email").map_err(ser)?,
    name: row.try_get("name").map_err(ser)?,
  })
}
