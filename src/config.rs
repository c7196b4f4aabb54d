//! Runtime configuration: environment variables plus an optional TOML file.
//!
//! Env:
//!   PORT                  : u16 (default 3000)
//!   DATABASE_URL          : SQLite URL; in-memory store when unset
//!   QUESTIONS_API_URL     : generator base URL (default "http://127.0.0.1:8000")
//!   STATIC_DIR            : optional frontend build served as fallback
//!   SAMPLER_SEED          : u64, pins question sampling
//!   PRACTICE_CONFIG_PATH  : path to TOML (session limits + extra question bank)
//!
//! See `FileConfig` for the TOML schema.

use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{Difficulty, Question, Topic, ANSWER_LETTERS};

pub const DEFAULT_QUESTION_COUNT: u32 = 30;
pub const MAX_QUESTION_COUNT: u32 = 100;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)] pub default_question_count: Option<u32>,
  #[serde(default)] pub max_question_count: Option<u32>,
  #[serde(default)] pub sampler_seed: Option<u64>,
  #[serde(default)] pub questions: Vec<QuestionCfg>,
}

/// Question entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default)] pub id: Option<String>,
  pub topic: Topic,
  pub text: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  #[serde(default)] pub difficulty: Difficulty,
}

impl QuestionCfg {
  fn into_question(self) -> Result<Question, String> {
    if self.text.trim().is_empty() {
      return Err("empty text".into());
    }
    if self.options.len() != ANSWER_LETTERS.len() {
      return Err(format!("expected 4 options, got {}", self.options.len()));
    }
    let letter = self.correct_answer.trim().to_ascii_uppercase();
    if !ANSWER_LETTERS.contains(&letter.as_str()) {
      return Err(format!("correct_answer must be A-D, got '{}'", self.correct_answer));
    }
    Ok(Question {
      id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
      topic: self.topic,
      text: self.text.trim().to_string(),
      options: self.options,
      correct_answer: letter,
      difficulty: self.difficulty,
    })
  }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub database_url: Option<String>,
  pub questions_api_url: String,
  pub static_dir: Option<String>,
  pub sampler_seed: Option<u64>,
  pub default_question_count: u32,
  pub max_question_count: u32,
  /// Extra questions from the TOML bank, already validated.
  pub bank: Vec<Question>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: 3000,
      database_url: None,
      questions_api_url: "http://127.0.0.1:8000".into(),
      static_dir: None,
      sampler_seed: None,
      default_question_count: DEFAULT_QUESTION_COUNT,
      max_question_count: MAX_QUESTION_COUNT,
      bank: Vec::new(),
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Self {
    let mut cfg = AppConfig::default();

    if let Some(file) = load_file_config_from_env() {
      cfg.apply_file(file);
    }

    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
      cfg.port = port;
    }
    cfg.database_url = non_empty_env("DATABASE_URL");
    if let Some(url) = non_empty_env("QUESTIONS_API_URL") {
      cfg.questions_api_url = url;
    }
    cfg.static_dir = non_empty_env("STATIC_DIR");
    if let Some(raw) = non_empty_env("SAMPLER_SEED") {
      match raw.parse::<u64>() {
        Ok(seed) => cfg.sampler_seed = Some(seed),
        Err(e) => warn!(target: "practice_backend", %raw, error = %e, "Ignoring invalid SAMPLER_SEED"),
      }
    }
    cfg
  }

  /// Merge a parsed TOML file. Invalid bank entries are logged and skipped.
  pub fn apply_file(&mut self, file: FileConfig) {
    if let Some(n) = file.max_question_count.filter(|n| *n >= 1) {
      self.max_question_count = n;
    }
    if let Some(n) = file.default_question_count.filter(|n| *n >= 1) {
      self.default_question_count = n.min(self.max_question_count);
    }
    if file.sampler_seed.is_some() {
      self.sampler_seed = file.sampler_seed;
    }
    for (i, qc) in file.questions.into_iter().enumerate() {
      match qc.into_question() {
        Ok(q) => self.bank.push(q),
        Err(reason) => error!(target: "questions", index = i, %reason, "Skipping bank question"),
      }
    }
  }
}

fn non_empty_env(key: &str) -> Option<String> {
  std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Attempt to load `FileConfig` from PRACTICE_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("PRACTICE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<FileConfig>(&s) {
      Ok(cfg) => {
        info!(target: "practice_backend", %path, bank = cfg.questions.len(), "Loaded practice config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "practice_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "practice_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
