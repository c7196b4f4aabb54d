//! Question sampling: uniform draw without replacement, then a Fisher–Yates shuffle.
//!
//! The random source is always passed in so tests can pin it with a seed.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::Question;

/// Draw `min(count, pool.len())` distinct questions.
///
/// Each step picks a uniform offset into the questions not chosen yet, so no
/// id can repeat and no draw is wasted.
pub fn sample<R: Rng>(pool: Vec<Question>, count: usize, rng: &mut R) -> Vec<Question> {
  let target = count.min(pool.len());
  let mut remaining = pool;
  let mut chosen = Vec::with_capacity(target);
  while chosen.len() < target {
    let offset = rng.gen_range(0..remaining.len());
    chosen.push(remaining.swap_remove(offset));
  }
  chosen.shuffle(rng);
  chosen
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Topic;
  use crate::seeds::seed_questions;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use std::collections::HashSet;

  fn ids(qs: &[Question]) -> Vec<String> {
    qs.iter().map(|q| q.id.clone()).collect()
  }

  #[test]
  fn count_above_pool_returns_whole_pool_without_duplicates() {
    let pool: Vec<Question> = seed_questions().into_iter().filter(|q| q.topic == Topic::AppliedMath).collect();
    let mut rng = StdRng::seed_from_u64(7);
    let got = sample(pool.clone(), 50, &mut rng);
    assert_eq!(got.len(), pool.len());
    let unique: HashSet<String> = ids(&got).into_iter().collect();
    assert_eq!(unique.len(), pool.len());
  }

  #[test]
  fn respects_requested_count() {
    let mut rng = StdRng::seed_from_u64(1);
    let got = sample(seed_questions(), 5, &mut rng);
    assert_eq!(got.len(), 5);
    let unique: HashSet<String> = ids(&got).into_iter().collect();
    assert_eq!(unique.len(), 5);
  }

  #[test]
  fn same_seed_same_draw() {
    let a = sample(seed_questions(), 6, &mut StdRng::seed_from_u64(42));
    let b = sample(seed_questions(), 6, &mut StdRng::seed_from_u64(42));
    assert_eq!(ids(&a), ids(&b));
  }

  #[test]
  fn empty_pool_or_zero_count_yields_nothing() {
    let mut rng = StdRng::seed_from_u64(3);
    assert!(sample(Vec::new(), 4, &mut rng).is_empty());
    assert!(sample(seed_questions(), 0, &mut rng).is_empty());
  }

  #[test]
  fn every_question_can_be_drawn() {
    let pool = seed_questions();
    let mut seen = HashSet::new();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
      for q in sample(pool.clone(), 1, &mut rng) {
        seen.insert(q.id);
      }
    }
    assert_eq!(seen.len(), pool.len());
  }
}
