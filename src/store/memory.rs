//! Process-local store. All tables sit behind one `RwLock` so multi-table
//! updates (answer + session status) are atomic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{QuizStore, StorageError, ANSWER_EXISTS, SESSION_FINALIZED};
use crate::domain::{
  Answer, Difficulty, PracticeSession, Question, SessionStatus, Topic, TopicAnswer, User,
};
use crate::scoring::{self, Summary};

#[derive(Default)]
struct Tables {
  questions: HashMap<String, Question>,
  question_order: Vec<String>,
  users: HashMap<String, User>,
  sessions: HashMap<String, PracticeSession>,
  session_order: Vec<String>,
  session_questions: HashMap<String, Vec<String>>,
  answers: HashMap<String, Vec<Answer>>,
}

impl Tables {
  fn with_topics(&self, answers: &[Answer]) -> Vec<TopicAnswer> {
    answers
      .iter()
      .filter_map(|a| {
        self.questions.get(&a.question_id).map(|q| TopicAnswer { answer: a.clone(), topic: q.topic })
      })
      .collect()
  }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl QuizStore for MemoryStore {
  async fn insert_questions(&self, questions: &[Question]) -> Result<usize, StorageError> {
    let mut t = self.tables.write().await;
    let mut written = 0;
    for q in questions {
      if t.questions.contains_key(&q.id) {
        continue;
      }
      t.question_order.push(q.id.clone());
      t.questions.insert(q.id.clone(), q.clone());
      written += 1;
    }
    Ok(written)
  }

  async fn count_questions(&self) -> Result<usize, StorageError> {
    Ok(self.tables.read().await.questions.len())
  }

  async fn questions_by_topics(
    &self,
    topics: &[Topic],
    difficulty: Option<Difficulty>,
  ) -> Result<Vec<Question>, StorageError> {
    let t = self.tables.read().await;
    Ok(
      t.question_order
        .iter()
        .filter_map(|id| t.questions.get(id))
        .filter(|q| topics.contains(&q.topic))
        .filter(|q| difficulty.map_or(true, |d| q.difficulty == d))
        .cloned()
        .collect(),
    )
  }

  async fn get_question(&self, id: &str) -> Result<Question, StorageError> {
    self.tables.read().await.questions.get(id).cloned().ok_or(StorageError::NotFound)
  }

  async fn get_questions(&self, ids: &[String]) -> Result<Vec<Question>, StorageError> {
    let t = self.tables.read().await;
    Ok(ids.iter().filter_map(|id| t.questions.get(id).cloned()).collect())
  }

  async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
    let mut t = self.tables.write().await;
    // An email belongs to the last user who presented it.
    if let Some(email) = user.email.as_deref() {
      for other in t.users.values_mut() {
        if other.id != user.id && other.email.as_deref() == Some(email) {
          other.email = None;
        }
      }
    }
    let entry = t.users.entry(user.id.clone()).or_insert_with(|| user.clone());
    if user.email.is_some() {
      entry.email = user.email.clone();
    }
    if user.name.is_some() {
      entry.name = user.name.clone();
    }
    Ok(())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
    let t = self.tables.read().await;
    Ok(t.users.values().find(|u| u.email.as_deref() == Some(email)).cloned())
  }

  async fn create_session(
    &self,
    session: &PracticeSession,
    question_ids: &[String],
  ) -> Result<(), StorageError> {
    let mut t = self.tables.write().await;
    if t.sessions.contains_key(&session.id) {
      return Err(StorageError::Conflict(format!("session {} exists", session.id)));
    }
    t.session_order.push(session.id.clone());
    t.sessions.insert(session.id.clone(), session.clone());
    t.session_questions.insert(session.id.clone(), question_ids.to_vec());
    Ok(())
  }

  async fn get_session(&self, id: &str) -> Result<PracticeSession, StorageError> {
    self.tables.read().await.sessions.get(id).cloned().ok_or(StorageError::NotFound)
  }

  async fn session_question_ids(&self, session_id: &str) -> Result<Vec<String>, StorageError> {
    let t = self.tables.read().await;
    t.session_questions.get(session_id).cloned().ok_or(StorageError::NotFound)
  }

  async fn insert_answer(&self, answer: &Answer) -> Result<(), StorageError> {
    let mut guard = self.tables.write().await;
    let t = &mut *guard;
    let session = t.sessions.get_mut(&answer.session_id).ok_or(StorageError::NotFound)?;
    if session.is_finalized() {
      return Err(StorageError::Conflict(SESSION_FINALIZED.into()));
    }
    let answers = t.answers.entry(answer.session_id.clone()).or_default();
    if answers.iter().any(|a| a.question_id == answer.question_id) {
      return Err(StorageError::Conflict(ANSWER_EXISTS.into()));
    }
    answers.push(answer.clone());
    session.status = SessionStatus::InProgress;
    Ok(())
  }

  async fn session_answers(&self, session_id: &str) -> Result<Vec<TopicAnswer>, StorageError> {
    let t = self.tables.read().await;
    Ok(t.answers.get(session_id).map(|a| t.with_topics(a)).unwrap_or_default())
  }

  async fn finalize_session(
    &self,
    id: &str,
    duration: u64,
    finished_at: DateTime<Utc>,
  ) -> Result<Summary, StorageError> {
    let mut guard = self.tables.write().await;
    let t = &mut *guard;
    let answers = t.answers.get(id).map(|a| t.with_topics(a)).unwrap_or_default();
    let session = t.sessions.get_mut(id).ok_or(StorageError::NotFound)?;
    if session.is_finalized() {
      return Err(StorageError::Conflict(SESSION_FINALIZED.into()));
    }
    let summary = scoring::summarize(&answers);
    session.score = summary.score;
    session.accuracy = summary.accuracy;
    session.duration = duration;
    session.finished_at = Some(finished_at);
    session.status = SessionStatus::Finalized;
    Ok(summary)
  }

  async fn user_sessions(&self, user_id: &str) -> Result<Vec<PracticeSession>, StorageError> {
    let t = self.tables.read().await;
    // Reverse insertion order first so the stable sort breaks timestamp ties newest-first.
    let mut out: Vec<PracticeSession> = t
      .session_order
      .iter()
      .rev()
      .filter_map(|id| t.sessions.get(id))
      .filter(|s| s.user_id == user_id)
      .cloned()
      .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(out)
  }

  async fn user_answers(&self, user_id: &str) -> Result<Vec<TopicAnswer>, StorageError> {
    let t = self.tables.read().await;
    let owned: HashSet<&String> = t
      .sessions
      .values()
      .filter(|s| s.user_id == user_id)
      .map(|s| &s.id)
      .collect();
    let mut out = Vec::new();
    for id in &t.session_order {
      if !owned.contains(id) {
        continue;
      }
      if let Some(answers) = t.answers.get(id) {
        out.extend(t.with_topics(answers));
      }
    }
    Ok(out)
  }
}
