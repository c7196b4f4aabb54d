//! Application state: store handle, sampler RNG, generator client and config.
//!
//! This module owns:
//!   - the `QuizStore` backend chosen at startup
//!   - the seedable RNG behind question sampling
//!   - the question generator client
//!   - the resolved `AppConfig`

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::domain::{Question, Topic};
use crate::error::StartupError;
use crate::generator::QuestionGenerator;
use crate::sampling;
use crate::seeds::seed_questions;
use crate::store::{self, QuizStore, StorageError};

pub struct AppState {
  pub store: Arc<dyn QuizStore>,
  pub rng: Mutex<StdRng>,
  pub generator: QuestionGenerator,
  pub config: AppConfig,
}

impl AppState {
  /// Open the configured store, seed it if empty, and build the generator client.
  #[instrument(level = "info", skip_all)]
  pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
    let store = store::open(config.database_url.as_deref()).await?;
    let state = Self::with_store(store, config)?;
    state.ensure_seeded().await?;
    Ok(state)
  }

  /// Wrap an existing store (used by tests and embedders). Does not seed.
  pub fn with_store(store: Arc<dyn QuizStore>, config: AppConfig) -> Result<Self, StartupError> {
    let rng = match config.sampler_seed {
      Some(seed) => {
        info!(target: "practice_backend", seed, "Sampler seeded from config");
        StdRng::seed_from_u64(seed)
      }
      None => StdRng::from_entropy(),
    };
    let generator = QuestionGenerator::new(config.questions_api_url.clone())?;
    info!(target: "practice_backend", base_url = %generator.base_url, "Question generator configured");
    Ok(Self { store, rng: Mutex::new(rng), generator, config })
  }

  /// Insert the built-in bank when the store has no questions, then the TOML bank.
  #[instrument(level = "info", skip(self))]
  pub async fn ensure_seeded(&self) -> Result<(), StorageError> {
    if self.store.count_questions().await? == 0 {
      let written = self.store.insert_questions(&seed_questions()).await?;
      info!(target: "questions", written, "Seeded built-in question bank");
    }
    if !self.config.bank.is_empty() {
      let written = self.store.insert_questions(&self.config.bank).await?;
      info!(target: "questions", written, configured = self.config.bank.len(), "Loaded config question bank");
    }

    // Inventory summary by topic.
    let all = self.store.questions_by_topics(&Topic::ALL, None).await?;
    let mut by_topic: BTreeMap<Topic, usize> = BTreeMap::new();
    for q in &all {
      *by_topic.entry(q.topic).or_default() += 1;
    }
    for (topic, count) in by_topic {
      info!(target: "questions", %topic, count, "Startup question inventory");
    }
    Ok(())
  }

  /// Sample from `pool` with the shared RNG. The lock is held only for the draw.
  pub fn sample(&self, pool: Vec<Question>, count: usize) -> Vec<Question> {
    let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    sampling::sample(pool, count, &mut *rng)
  }
}
