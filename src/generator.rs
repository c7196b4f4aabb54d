//! Minimal client for the external question-generation service.
//!
//! One call: `POST {base_url}/generate` with `{category, num_questions}`; the
//! reply lists questions with free-text options and the answer text. We keep
//! only well-formed items and turn the answer text into an option letter.
//!
//! NOTE: Upstream bodies are only logged truncated.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::{Difficulty, Question, Topic, ANSWER_LETTERS};
use crate::util::trunc_for_log;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
  #[error("question generator unreachable: {0}")]
  Http(#[from] reqwest::Error),
  #[error("Upstream generation failed for {category} (HTTP {status})")]
  Status { category: &'static str, status: reqwest::StatusCode },
}

/// Categories understood by the generator service.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  AppliedMath,
  Statistics,
  VerbalReasoning,
  GeneralKnowledge,
}

impl Category {
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "applied_math" => Some(Category::AppliedMath),
      "statistics" => Some(Category::Statistics),
      "verbal_reasoning" => Some(Category::VerbalReasoning),
      "general_knowledge" => Some(Category::GeneralKnowledge),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Category::AppliedMath => "applied_math",
      Category::Statistics => "statistics",
      Category::VerbalReasoning => "verbal_reasoning",
      Category::GeneralKnowledge => "general_knowledge",
    }
  }

  /// Stored topic for generated questions.
  pub fn topic(self) -> Topic {
    match self {
      Category::AppliedMath => Topic::AppliedMath,
      Category::Statistics => Topic::Statistics,
      Category::VerbalReasoning => Topic::VerbalReasoning,
      Category::GeneralKnowledge => Topic::GeneralKnowledge,
    }
  }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  category: &'a str,
  num_questions: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
  #[serde(default)] pub category: String,
  #[serde(default)] pub questions: Vec<GeneratedItem>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeneratedItem {
  #[serde(default)] pub question: String,
  #[serde(default)] pub options: Vec<String>,
  #[serde(default)] pub answer: String,
}

#[derive(Clone)]
pub struct QuestionGenerator {
  pub client: reqwest::Client,
  pub base_url: String,
}

impl QuestionGenerator {
  /// # Errors
  ///
  /// Fails only if the HTTP client cannot be built.
  pub fn new(base_url: impl Into<String>) -> Result<Self, GeneratorError> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(60)).build()?;
    let base_url = base_url.into().trim_end_matches('/').to_string();
    Ok(Self { client, base_url })
  }

  #[instrument(level = "info", skip_all, fields(category = category.as_str(), count = count))]
  pub async fn generate(&self, category: Category, count: u32) -> Result<Vec<GeneratedItem>, GeneratorError> {
    let url = format!("{}/generate", self.base_url);
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "practice-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&GenerateRequest { category: category.as_str(), num_questions: count })
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      error!(target: "questions", category = category.as_str(), %status, body = %trunc_for_log(&body, 300), "Question generation failed");
      return Err(GeneratorError::Status { category: category.as_str(), status });
    }

    let body: GenerateResponse = res.json().await?;
    info!(target: "questions", category = category.as_str(), returned = body.questions.len(), "Generator replied");
    Ok(body.questions)
  }
}

/// Keep items with text, exactly four options and an answer matching one of
/// them (after trimming). Generated questions are stored as `MEDIUM`.
pub fn to_questions(topic: Topic, items: &[GeneratedItem]) -> Vec<Question> {
  items
    .iter()
    .filter_map(|item| {
      let text = item.question.trim();
      if text.is_empty() || item.options.len() != ANSWER_LETTERS.len() {
        return None;
      }
      let answer = item.answer.trim();
      let idx = item.options.iter().position(|o| o.trim() == answer)?;
      Some(Question {
        id: Uuid::new_v4().to_string(),
        topic,
        text: text.to_string(),
        options: item.options.iter().map(|o| o.trim().to_string()).collect(),
        correct_answer: ANSWER_LETTERS[idx].to_string(),
        difficulty: Difficulty::Medium,
      })
    })
    .collect()
}
