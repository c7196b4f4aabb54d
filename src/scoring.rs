//! Scoring and per-topic aggregation over stored answers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{Topic, TopicAnswer};
use crate::topics;

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct Tally {
  pub correct: u32,
  pub total: u32,
}

impl Tally {
  pub fn record(&mut self, correct: bool) {
    self.total += 1;
    if correct {
      self.correct += 1;
    }
  }
}

/// `round(100 * correct / total)` with halves rounded up; 0 for an empty session.
pub fn score(correct: u32, total: u32) -> u32 {
  if total == 0 {
    return 0;
  }
  let (c, t) = (u64::from(correct), u64::from(total));
  ((200 * c + t) / (2 * t)) as u32
}

pub fn accuracy(correct: u32, total: u32) -> f64 {
  if total == 0 {
    0.0
  } else {
    f64::from(correct) / f64::from(total)
  }
}

/// Result figures for one session's answers.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
  pub total: u32,
  pub correct: u32,
  pub score: u32,
  pub accuracy: f64,
  /// Keyed by display topic: legacy aliases are collapsed.
  pub breakdown: BTreeMap<Topic, Tally>,
}

pub fn summarize(answers: &[TopicAnswer]) -> Summary {
  let mut overall = Tally::default();
  let mut breakdown: BTreeMap<Topic, Tally> = BTreeMap::new();
  for a in answers {
    overall.record(a.answer.is_correct);
    breakdown.entry(topics::canonical(a.topic)).or_default().record(a.answer.is_correct);
  }
  Summary {
    total: overall.total,
    correct: overall.correct,
    score: score(overall.correct, overall.total),
    accuracy: accuracy(overall.correct, overall.total),
    breakdown,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Answer;
  use chrono::Utc;

  fn ta(question_id: &str, topic: Topic, correct: bool) -> TopicAnswer {
    TopicAnswer {
      answer: Answer {
        id: format!("a-{question_id}"),
        session_id: "s".into(),
        question_id: question_id.into(),
        chosen_answer: if correct { "A".into() } else { String::new() },
        is_correct: correct,
        time_taken_ms: 500,
        created_at: Utc::now(),
      },
      topic,
    }
  }

  #[test]
  fn score_rounds_to_nearest_percent() {
    assert_eq!(score(1, 3), 33);
    assert_eq!(score(2, 3), 67);
    assert_eq!(score(1, 8), 13); // 12.5 rounds up
    assert_eq!(score(4, 4), 100);
    assert_eq!(score(0, 0), 0);
  }

  #[test]
  fn score_matches_accuracy_for_all_small_sessions() {
    for total in 1..=40u32 {
      for correct in 0..=total {
        let expected = (100.0 * f64::from(correct) / f64::from(total)).round() as u32;
        assert_eq!(score(correct, total), expected, "{correct}/{total}");
        assert!(correct <= total);
      }
    }
  }

  #[test]
  fn breakdown_merges_legacy_topic() {
    let answers = vec![
      ta("st-1", Topic::Statistics, true),
      ta("da-1", Topic::DataAnalysis, false),
      ta("da-2", Topic::DataAnalysis, true),
      ta("am-1", Topic::AppliedMath, true),
    ];
    let s = summarize(&answers);
    assert_eq!(s.total, 4);
    assert_eq!(s.correct, 3);
    assert_eq!(s.score, 75);
    assert!((s.accuracy - 0.75).abs() < f64::EPSILON);
    assert_eq!(s.breakdown.get(&Topic::Statistics), Some(&Tally { correct: 2, total: 3 }));
    assert_eq!(s.breakdown.get(&Topic::AppliedMath), Some(&Tally { correct: 1, total: 1 }));
    assert!(!s.breakdown.contains_key(&Topic::DataAnalysis));
  }

  #[test]
  fn empty_session_summarizes_to_zero() {
    let s = summarize(&[]);
    assert_eq!((s.total, s.correct, s.score), (0, 0, 0));
    assert_eq!(s.accuracy, 0.0);
    assert!(s.breakdown.is_empty());
  }
}
