//! Relational data store behind one async trait.
//!
//! Two backends: `MemoryStore` (default, process-local) and `SqliteStore`
//! (selected when `DATABASE_URL` is set). Lifecycle guards that must hold under
//! concurrent requests (one answer per question, no writes after finalization)
//! are enforced inside the backends, not by callers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::domain::{Answer, Difficulty, PracticeSession, Question, Topic, TopicAnswer, User};
use crate::scoring::Summary;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
  #[error("not found")]
  NotFound,

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("connection error: {0}")]
  Connection(String),

  #[error("serialization error: {0}")]
  Serialization(String),
}

pub const SESSION_FINALIZED: &str = "Session already finalized";
pub const ANSWER_EXISTS: &str = "Question already answered in this session";

#[async_trait]
pub trait QuizStore: Send + Sync {
  /// Store new questions; returns how many were written.
  async fn insert_questions(&self, questions: &[Question]) -> Result<usize, StorageError>;

  async fn count_questions(&self) -> Result<usize, StorageError>;

  /// Questions whose stored topic is one of `topics`, in insertion order.
  async fn questions_by_topics(
    &self,
    topics: &[Topic],
    difficulty: Option<Difficulty>,
  ) -> Result<Vec<Question>, StorageError>;

  /// # Errors
  ///
  /// `StorageError::NotFound` if the id is unknown.
  async fn get_question(&self, id: &str) -> Result<Question, StorageError>;

  /// Questions for `ids` in the given order; unknown ids are skipped.
  async fn get_questions(&self, ids: &[String]) -> Result<Vec<Question>, StorageError>;

  async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

  /// Persist a new session together with its sampled question ids (in order).
  async fn create_session(
    &self,
    session: &PracticeSession,
    question_ids: &[String],
  ) -> Result<(), StorageError>;

  async fn get_session(&self, id: &str) -> Result<PracticeSession, StorageError>;

  async fn session_question_ids(&self, session_id: &str) -> Result<Vec<String>, StorageError>;

  /// Record an answer and move the session to `in_progress`.
  ///
  /// # Errors
  ///
  /// `Conflict` if the session is finalized or the question already has an
  /// answer in this session; `NotFound` if the session is unknown.
  async fn insert_answer(&self, answer: &Answer) -> Result<(), StorageError>;

  /// Answers of one session, oldest first, with their question topics.
  async fn session_answers(&self, session_id: &str) -> Result<Vec<TopicAnswer>, StorageError>;

  /// Close the session and score it from the answers stored at that moment.
  /// Closing and reading happen atomically, so an answer either lands before
  /// and is scored, or after and is rejected.
  ///
  /// # Errors
  ///
  /// `Conflict` if the session is already finalized; `NotFound` if unknown.
  async fn finalize_session(
    &self,
    id: &str,
    duration: u64,
    finished_at: DateTime<Utc>,
  ) -> Result<Summary, StorageError>;

  /// All sessions of a user, newest first.
  async fn user_sessions(&self, user_id: &str) -> Result<Vec<PracticeSession>, StorageError>;

  /// Every answer across every session of a user, with their question topics.
  async fn user_answers(&self, user_id: &str) -> Result<Vec<TopicAnswer>, StorageError>;
}

/// Open the configured backend: SQLite when a URL is given, memory otherwise.
pub async fn open(database_url: Option<&str>) -> Result<Arc<dyn QuizStore>, StorageError> {
  match database_url {
    Some(url) => {
      let store = SqliteStore::connect(url).await?;
      store.migrate().await?;
      info!(target: "practice_backend", %url, "Using SQLite store");
      Ok(Arc::new(store))
    }
    None => {
      info!(target: "practice_backend", "DATABASE_URL not set; using in-memory store");
      Ok(Arc::new(MemoryStore::new()))
    }
  }
}
