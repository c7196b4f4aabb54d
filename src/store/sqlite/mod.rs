//! SQLite backend (`sqlx`). Selected when `DATABASE_URL` is set.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, QueryBuilder, Sqlite, SqlitePool};

use super::{QuizStore, StorageError, ANSWER_EXISTS, SESSION_FINALIZED};
use crate::domain::{Answer, Difficulty, PracticeSession, Question, Topic, TopicAnswer, User};
use crate::scoring::{self, Summary};

mod mapping;
mod migrate;

use mapping::{
  conn, map_question, map_session, map_topic_answer, map_user, options_json, to_i64, topics_json,
};

const QUESTION_COLUMNS: &str = "id, topic, text, options, correct_answer, difficulty";
const SESSION_COLUMNS: &str = "id, user_id, topics, time_limit, question_count, status, score, accuracy, duration, created_at, finished_at";
const TOPIC_ANSWER_COLUMNS: &str = "a.id, a.session_id, a.question_id, a.chosen_answer, a.is_correct, a.time_taken_ms, a.created_at, q.topic";

#[derive(Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

fn unique_as_conflict(e: sqlx::Error, message: &str) -> StorageError {
  match &e {
    sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict(message.to_string()),
    _ => conn(e),
  }
}

impl SqliteStore {
  /// Connect using the given URL, e.g. `sqlite://practice.db?mode=rwc`.
  ///
  /// # Errors
  ///
  /// `StorageError::Connection` if the pool cannot be established.
  pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
    let pool = SqlitePoolOptions::new()
      .max_connections(5)
      .acquire_timeout(Duration::from_secs(5))
      .after_connect(|conn, _meta| {
        Box::pin(async move {
          sqlx::query("PRAGMA foreign_keys = ON;").execute(&mut *conn).await?;
          sqlx::query("PRAGMA journal_mode = WAL;").execute(&mut *conn).await?;
          sqlx::query("PRAGMA busy_timeout = 5000;").execute(&mut *conn).await?;
          Ok(())
        })
      })
      .connect(database_url)
      .await
      .map_err(conn)?;
    Ok(Self { pool })
  }

  /// Create tables if they do not exist.
  pub async fn migrate(&self) -> Result<(), StorageError> {
    migrate::run_migrations(&self.pool).await.map_err(conn)
  }

  async fn session_exists(&self, id: &str) -> Result<bool, StorageError> {
    let row = sqlx::query("SELECT 1 FROM practice_sessions WHERE id = ?1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(conn)?;
    Ok(row.is_some())
  }

  /// Zero rows touched by a guarded update means either unknown or finalized.
  async fn missing_or_finalized(&self, id: &str) -> StorageError {
    match self.session_exists(id).await {
      Ok(true) => StorageError::Conflict(SESSION_FINALIZED.into()),
      Ok(false) => StorageError::NotFound,
      Err(e) => e,
    }
  }
}

#[async_trait]
impl QuizStore for SqliteStore {
  async fn insert_questions(&self, questions: &[Question]) -> Result<usize, StorageError> {
    let mut tx = self.pool.begin().await.map_err(conn)?;
    let mut written = 0usize;
    for q in questions {
      let res = sqlx::query(
        r"
          INSERT OR IGNORE INTO questions (id, topic, text, options, correct_answer, difficulty)
          VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
      )
      .bind(&q.id)
      .bind(q.topic.as_str())
      .bind(&q.text)
      .bind(options_json(&q.options)?)
      .bind(&q.correct_answer)
      .bind(q.difficulty.as_str())
      .execute(&mut *tx)
      .await
      .map_err(conn)?;
      written += res.rows_affected() as usize;
    }
    tx.commit().await.map_err(conn)?;
    Ok(written)
  }

  async fn count_questions(&self) -> Result<usize, StorageError> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
      .fetch_one(&self.pool)
      .await
      .map_err(conn)?;
    Ok(n.max(0) as usize)
  }

  async fn questions_by_topics(
    &self,
    topics: &[Topic],
    difficulty: Option<Difficulty>,
  ) -> Result<Vec<Question>, StorageError> {
    if topics.is_empty() {
      return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> =
      QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE topic IN ("));
    {
      let mut sep = qb.separated(", ");
      for t in topics {
        sep.push_bind(t.as_str());
      }
    }
    qb.push(")");
    if let Some(d) = difficulty {
      qb.push(" AND difficulty = ").push_bind(d.as_str());
    }
    qb.push(" ORDER BY rowid");

    let rows = qb.build().fetch_all(&self.pool).await.map_err(conn)?;
    rows.iter().map(map_question).collect()
  }

  async fn get_question(&self, id: &str) -> Result<Question, StorageError> {
    let row = sqlx::query(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(conn)?
      .ok_or(StorageError::NotFound)?;
    map_question(&row)
  }

  async fn get_questions(&self, ids: &[String]) -> Result<Vec<Question>, StorageError> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let mut qb: QueryBuilder<Sqlite> =
      QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id IN ("));
    {
      let mut sep = qb.separated(", ");
      for id in ids {
        sep.push_bind(id.clone());
      }
    }
    qb.push(")");
    let rows = qb.build().fetch_all(&self.pool).await.map_err(conn)?;
    let found = rows.iter().map(map_question).collect::<Result<Vec<_>, _>>()?;
    Ok(
      ids
        .iter()
        .filter_map(|id| found.iter().find(|q| &q.id == id).cloned())
        .collect(),
    )
  }

  async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
    let mut tx = self.pool.begin().await.map_err(conn)?;
    // An email belongs to the last user who presented it.
    if let Some(email) = user.email.as_deref() {
      sqlx::query("UPDATE users SET email = NULL WHERE email = ?1 AND id != ?2")
        .bind(email)
        .bind(&user.id)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
    }
    sqlx::query(
      r"
        INSERT INTO users (id, email, name) VALUES (?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET
          email = COALESCE(excluded.email, users.email),
          name = COALESCE(excluded.name, users.name)
      ",
    )
    .bind(&user.id)
    .bind(user.email.as_deref())
    .bind(user.name.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(conn)?;
    tx.commit().await.map_err(conn)?;
    Ok(())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
    let row = sqlx::query("SELECT id, email, name FROM users WHERE email = ?1")
      .bind(email)
      .fetch_optional(&self.pool)
      .await
      .map_err(conn)?;
    row.as_ref().map(map_user).transpose()
  }

  async fn create_session(
    &self,
    session: &PracticeSession,
    question_ids: &[String],
  ) -> Result<(), StorageError> {
    let mut tx = self.pool.begin().await.map_err(conn)?;
    sqlx::query(
      r"
        INSERT INTO practice_sessions (
          id, user_id, topics, time_limit, question_count, status,
          score, accuracy, duration, created_at, finished_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
      ",
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(topics_json(&session.topics)?)
    .bind(i64::from(session.time_limit))
    .bind(i64::from(session.question_count))
    .bind(session.status.as_str())
    .bind(i64::from(session.score))
    .bind(session.accuracy)
    .bind(to_i64("duration", session.duration)?)
    .bind(session.created_at)
    .bind(session.finished_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| unique_as_conflict(e, "Session already exists"))?;

    for (position, qid) in question_ids.iter().enumerate() {
      sqlx::query("INSERT INTO session_questions (session_id, position, question_id) VALUES (?1, ?2, ?3)")
        .bind(&session.id)
        .bind(position as i64)
        .bind(qid)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
    }
    tx.commit().await.map_err(conn)?;
    Ok(())
  }

  async fn get_session(&self, id: &str) -> Result<PracticeSession, StorageError> {
    let row = sqlx::query(&format!("SELECT {SESSION_COLUMNS} FROM practice_sessions WHERE id = ?1"))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(conn)?
      .ok_or(StorageError::NotFound)?;
    map_session(&row)
  }

  async fn session_question_ids(&self, session_id: &str) -> Result<Vec<String>, StorageError> {
    if !self.session_exists(session_id).await? {
      return Err(StorageError::NotFound);
    }
    sqlx::query_scalar("SELECT question_id FROM session_questions WHERE session_id = ?1 ORDER BY position")
      .bind(session_id)
      .fetch_all(&self.pool)
      .await
      .map_err(conn)
  }

  async fn insert_answer(&self, answer: &Answer) -> Result<(), StorageError> {
    let mut tx = self.pool.begin().await.map_err(conn)?;
    let touched = sqlx::query(
      "UPDATE practice_sessions SET status = 'in_progress' WHERE id = ?1 AND status != 'finalized'",
    )
    .bind(&answer.session_id)
    .execute(&mut *tx)
    .await
    .map_err(conn)?
    .rows_affected();
    if touched == 0 {
      drop(tx);
      return Err(self.missing_or_finalized(&answer.session_id).await);
    }

    sqlx::query(
      r"
        INSERT INTO answers (id, session_id, question_id, chosen_answer, is_correct, time_taken_ms, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
      ",
    )
    .bind(&answer.id)
    .bind(&answer.session_id)
    .bind(&answer.question_id)
    .bind(&answer.chosen_answer)
    .bind(answer.is_correct)
    .bind(to_i64("time_taken_ms", answer.time_taken_ms)?)
    .bind(answer.created_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| unique_as_conflict(e, ANSWER_EXISTS))?;

    tx.commit().await.map_err(conn)?;
    Ok(())
  }

  async fn session_answers(&self, session_id: &str) -> Result<Vec<TopicAnswer>, StorageError> {
    let rows = sqlx::query(&format!(
      r"
        SELECT {TOPIC_ANSWER_COLUMNS}
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE a.session_id = ?1
        ORDER BY a.rowid
      "
    ))
    .bind(session_id)
    .fetch_all(&self.pool)
    .await
    .map_err(conn)?;
    rows.iter().map(map_topic_answer).collect()
  }

  async fn finalize_session(
    &self,
    id: &str,
    duration: u64,
    finished_at: DateTime<Utc>,
  ) -> Result<Summary, StorageError> {
    let mut tx = self.pool.begin().await.map_err(conn)?;
    // Closing first takes the write lock, so no answer can slip in between.
    let touched = sqlx::query(
      r"
        UPDATE practice_sessions
        SET duration = ?2, finished_at = ?3, status = 'finalized'
        WHERE id = ?1 AND status != 'finalized'
      ",
    )
    .bind(id)
    .bind(to_i64("duration", duration)?)
    .bind(finished_at)
    .execute(&mut *tx)
    .await
    .map_err(conn)?
    .rows_affected();
    if touched == 0 {
      drop(tx);
      return Err(self.missing_or_finalized(id).await);
    }

    let rows = sqlx::query(&format!(
      r"
        SELECT {TOPIC_ANSWER_COLUMNS}
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE a.session_id = ?1
        ORDER BY a.rowid
      "
    ))
    .bind(id)
    .fetch_all(&mut *tx)
    .await
    .map_err(conn)?;
    let answers = rows.iter().map(map_topic_answer).collect::<Result<Vec<_>, _>>()?;
    let summary = scoring::summarize(&answers);

    sqlx::query("UPDATE practice_sessions SET score = ?2, accuracy = ?3 WHERE id = ?1")
      .bind(id)
      .bind(i64::from(summary.score))
      .bind(summary.accuracy)
      .execute(&mut *tx)
      .await
      .map_err(conn)?;
    tx.commit().await.map_err(conn)?;
    Ok(summary)
  }

  async fn user_sessions(&self, user_id: &str) -> Result<Vec<PracticeSession>, StorageError> {
    let rows = sqlx::query(&format!(
      "SELECT {SESSION_COLUMNS} FROM practice_sessions WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(conn)?;
    rows.iter().map(map_session).collect()
  }

  async fn user_answers(&self, user_id: &str) -> Result<Vec<TopicAnswer>, StorageError> {
    let rows = sqlx::query(&format!(
      r"
        SELECT {TOPIC_ANSWER_COLUMNS}
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        JOIN practice_sessions s ON s.id = a.session_id
        WHERE s.user_id = ?1
        ORDER BY s.created_at, a.rowid
      "
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(conn)?;
    rows.iter().map(map_topic_answer).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SqliteStore>();
  }
}
