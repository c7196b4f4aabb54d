//! Domain models used by the backend: topics, difficulties, questions, sessions and answers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Option letters, in option order. A question always has exactly one option per letter.
pub const ANSWER_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

/// Fixed content categories. `DataAnalysis` is a legacy category folded into
/// `Statistics` (see `crate::topics`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
  Statistics,
  DataAnalysis,
  GeneralKnowledge,
  VerbalReasoning,
  AppliedMath,
}

impl Topic {
  pub const ALL: [Topic; 5] = [
    Topic::Statistics,
    Topic::DataAnalysis,
    Topic::GeneralKnowledge,
    Topic::VerbalReasoning,
    Topic::AppliedMath,
  ];

  /// Wire/storage name, e.g. `VERBAL_REASONING`.
  pub fn as_str(self) -> &'static str {
    match self {
      Topic::Statistics => "STATISTICS",
      Topic::DataAnalysis => "DATA_ANALYSIS",
      Topic::GeneralKnowledge => "GENERAL_KNOWLEDGE",
      Topic::VerbalReasoning => "VERBAL_REASONING",
      Topic::AppliedMath => "APPLIED_MATH",
    }
  }

  /// Human readable label. Both halves of the statistics pair share one label.
  pub fn display_name(self) -> &'static str {
    match self {
      Topic::Statistics | Topic::DataAnalysis => "Statistics & Data Analysis",
      Topic::GeneralKnowledge => "General Knowledge",
      Topic::VerbalReasoning => "Verbal Reasoning",
      Topic::AppliedMath => "Applied Math",
    }
  }
}

impl fmt::Display for Topic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Topic {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_ascii_uppercase();
    Topic::ALL
      .into_iter()
      .find(|t| t.as_str() == wanted)
      .ok_or_else(|| format!("unknown topic '{}'", s.trim()))
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "EASY",
      Difficulty::Medium => "MEDIUM",
      Difficulty::Hard => "HARD",
    }
  }
}

impl FromStr for Difficulty {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "EASY" => Ok(Difficulty::Easy),
      "MEDIUM" => Ok(Difficulty::Medium),
      "HARD" => Ok(Difficulty::Hard),
      other => Err(format!("unknown difficulty '{}'", other)),
    }
  }
}

/// A stored multiple-choice question. Immutable once stored.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: String,
  pub topic: Topic,
  pub text: String,
  pub options: Vec<String>,
  /// Letter `A`..`D`.
  pub correct_answer: String,
  pub difficulty: Difficulty,
}

impl Question {
  /// Correctness is plain string equality against the stored letter; an empty
  /// choice (timeout) never matches.
  pub fn is_correct(&self, chosen: &str) -> bool {
    chosen == self.correct_answer
  }
}

/// Lifecycle of a practice session: `Created -> InProgress -> Finalized`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  Created,
  InProgress,
  Finalized,
}

impl SessionStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      SessionStatus::Created => "created",
      SessionStatus::InProgress => "in_progress",
      SessionStatus::Finalized => "finalized",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "created" => Some(SessionStatus::Created),
      "in_progress" => Some(SessionStatus::InProgress),
      "finalized" => Some(SessionStatus::Finalized),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
  pub id: String,
  pub user_id: String,
  /// Topics after alias expansion.
  pub topics: Vec<Topic>,
  /// Seconds per question.
  pub time_limit: u32,
  pub question_count: u32,
  pub status: SessionStatus,
  pub score: u32,
  pub accuracy: f64,
  /// Whole session, seconds.
  pub duration: u64,
  pub created_at: DateTime<Utc>,
  #[serde(default)] pub finished_at: Option<DateTime<Utc>>,
}

impl PracticeSession {
  pub fn is_finalized(&self) -> bool {
    self.status == SessionStatus::Finalized
  }
}

/// One recorded response (or timeout) to one question in a session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
  pub id: String,
  pub session_id: String,
  pub question_id: String,
  /// Empty string means the countdown ran out.
  pub chosen_answer: String,
  pub is_correct: bool,
  pub time_taken_ms: u64,
  pub created_at: DateTime<Utc>,
}

/// An answer joined with the topic of the question it answers.
#[derive(Clone, Debug, PartialEq)]
pub struct TopicAnswer {
  pub answer: Answer,
  pub topic: Topic,
}

/// Identity as registered by the upstream identity provider.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
  pub id: String,
  #[serde(default)] pub email: Option<String>,
  #[serde(default)] pub name: Option<String>,
}
