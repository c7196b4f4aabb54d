//! Public HTTP request/response structs (serde ready, camelCase on the wire).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsData;
use crate::domain::{PracticeSession, Question, Topic};
use crate::scoring::Tally;

/// Question as sent to clients: never carries the correct answer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
  pub id: String,
  pub topic: Topic,
  pub text: String,
  pub options: Vec<String>,
}

/// Convert a stored `Question` to the public DTO.
pub fn to_out(q: &Question) -> QuestionOut {
  QuestionOut {
    id: q.id.clone(),
    topic: q.topic,
    text: q.text.clone(),
    options: q.options.clone(),
  }
}

//
// Practice session
//

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartIn {
  #[serde(default)] pub topics: Vec<Topic>,
  #[serde(default)] pub time_limit: Option<u32>,
  #[serde(default)] pub question_count: Option<u32>,
}

/// Config echoed back after defaults are applied.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigOut {
  pub topics: Vec<Topic>,
  pub time_limit: u32,
  pub question_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartOut {
  pub session_id: String,
  pub questions: Vec<QuestionOut>,
  pub config: SessionConfigOut,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
  #[serde(default)] pub session_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
  pub session: PracticeSession,
  pub questions: Vec<QuestionOut>,
  pub time_limit: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
  #[serde(default)] pub session_id: Option<String>,
  #[serde(default)] pub question_id: Option<String>,
  /// `""` records a timeout.
  #[serde(default)] pub selected_answer: Option<String>,
  /// Milliseconds.
  #[serde(default)] pub time_taken: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
  pub is_correct: bool,
  pub answer_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinishIn {
  #[serde(default)] pub session_id: Option<String>,
  /// Seconds.
  #[serde(default)] pub duration: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
  pub session_id: String,
  pub score: u32,
  pub accuracy: f64,
  pub duration: u64,
  pub total_questions: u32,
  pub correct_answers: u32,
  pub topic_breakdown: BTreeMap<Topic, TallyOut>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TallyOut {
  pub correct: u32,
  pub total: u32,
}

impl From<Tally> for TallyOut {
  fn from(t: Tally) -> Self {
    TallyOut { correct: t.correct, total: t.total }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FinishOut {
  pub results: SessionResult,
}

//
// Analytics
//

/// `GET /analytics` body; the dashboard reads `analytics`.
#[derive(Clone, Debug, Serialize)]
pub struct AnalyticsOut {
  pub analytics: AnalyticsData,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
  #[serde(default)] pub email: Option<String>,
}

//
// Question bank
//

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
  #[serde(default)] pub topics: Option<String>,
  #[serde(default)] pub count: Option<u32>,
  #[serde(default)] pub difficulty: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuestionsOut {
  pub questions: Vec<QuestionOut>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerateIn {
  #[serde(default)] pub category: Option<String>,
  #[serde(default)] pub count: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerateOut {
  pub ok: bool,
  pub category: String,
  pub requested: u32,
  pub created: u32,
  pub skipped: u32,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
