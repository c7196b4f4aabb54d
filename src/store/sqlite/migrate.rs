use chrono::Utc;
use sqlx::SqlitePool;

/// Creates the schema if it is not there yet. Single consolidated version.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
  async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
      .bind(version)
      .fetch_optional(pool)
      .await?;
    Ok(row.is_some())
  }

  sqlx::query(
    r"
      CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL
      );
    ",
  )
  .execute(pool)
  .await?;

  if is_applied(pool, 1).await? {
    return Ok(());
  }

  let mut tx = pool.begin().await?;

  sqlx::query(
    r"
      CREATE TABLE IF NOT EXISTS questions (
        id TEXT PRIMARY KEY,
        topic TEXT NOT NULL,
        text TEXT NOT NULL,
        options TEXT NOT NULL,
        correct_answer TEXT NOT NULL CHECK (correct_answer IN ('A', 'B', 'C', 'D')),
        difficulty TEXT NOT NULL
      );
    ",
  )
  .execute(&mut *tx)
  .await?;

  sqlx::query("CREATE INDEX IF NOT EXISTS idx_questions_topic ON questions (topic);")
    .execute(&mut *tx)
    .await?;

  sqlx::query(
    r"
      CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT UNIQUE,
        name TEXT
      );
    ",
  )
  .execute(&mut *tx)
  .await?;

  sqlx::query(
    r"
      CREATE TABLE IF NOT EXISTS practice_sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        topics TEXT NOT NULL,
        time_limit INTEGER NOT NULL CHECK (time_limit >= 1),
        question_count INTEGER NOT NULL CHECK (question_count >= 0),
        status TEXT NOT NULL,
        score INTEGER NOT NULL DEFAULT 0 CHECK (score BETWEEN 0 AND 100),
        accuracy REAL NOT NULL DEFAULT 0,
        duration INTEGER NOT NULL DEFAULT 0 CHECK (duration >= 0),
        created_at TEXT NOT NULL,
        finished_at TEXT
      );
    ",
  )
  .execute(&mut *tx)
  .await?;

  sqlx::query(
    "CREATE INDEX IF NOT EXISTS idx_sessions_user_created ON practice_sessions (user_id, created_at);",
  )
  .execute(&mut *tx)
  .await?;

  sqlx::query(
    r"
      CREATE TABLE IF NOT EXISTS session_questions (
        session_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        question_id TEXT NOT NULL,
        PRIMARY KEY (session_id, position),
        FOREIGN KEY (session_id) REFERENCES practice_sessions(id) ON DELETE CASCADE,
        FOREIGN KEY (question_id) REFERENCES questions(id)
      );
    ",
  )
  .execute(&mut *tx)
  .await?;

  sqlx::query(
    r"
      CREATE TABLE IF NOT EXISTS answers (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        question_id TEXT NOT NULL,
        chosen_answer TEXT NOT NULL,
        is_correct INTEGER NOT NULL,
        time_taken_ms INTEGER NOT NULL CHECK (time_taken_ms >= 0),
        created_at TEXT NOT NULL,
        UNIQUE (session_id, question_id),
        FOREIGN KEY (session_id) REFERENCES practice_sessions(id) ON DELETE CASCADE,
        FOREIGN KEY (question_id) REFERENCES questions(id)
      );
    ",
  )
  .execute(&mut *tx)
  .await?;

  sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
    .bind(1_i64)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

  tx.commit().await?;
  Ok(())
}
